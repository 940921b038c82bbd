//! Subscription expiry helpers.

use chrono::{DateTime, Utc};

pub const DEFAULT_WARNING_DAYS: i64 = 5;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Human-readable time left until `expires_at`, in the largest whole unit.
pub fn time_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = expires_at - now;
    if left <= chrono::Duration::zero() {
        return "Expired".to_string();
    }
    let days = left.num_days();
    let hours = left.num_hours() % 24;
    let minutes = left.num_minutes() % 60;

    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "Less than 1 minute".to_string()
    }
}

/// `true` when the subscription ends within `warning_days` whole days and
/// has not already ended.
pub fn is_expiring_soon(expires_at: DateTime<Utc>, now: DateTime<Utc>, warning_days: i64) -> bool {
    let diff = expires_at - now;
    // floor, so a subscription a few hours past expiry is not "0 days left"
    let days = diff.num_milliseconds().div_euclid(86_400_000);
    (0..=warning_days).contains(&days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn remaining_units() {
        let n = now();
        assert_eq!(time_remaining(n - Duration::seconds(1), n), "Expired");
        assert_eq!(time_remaining(n, n), "Expired");
        assert_eq!(time_remaining(n + Duration::days(3) + Duration::hours(4), n), "3 days");
        assert_eq!(time_remaining(n + Duration::days(1), n), "1 day");
        assert_eq!(time_remaining(n + Duration::hours(5), n), "5 hours");
        assert_eq!(time_remaining(n + Duration::minutes(1), n), "1 minute");
        assert_eq!(time_remaining(n + Duration::seconds(30), n), "Less than 1 minute");
    }

    #[test]
    fn expiring_soon_window() {
        let n = now();
        assert!(is_expiring_soon(n + Duration::days(2), n, DEFAULT_WARNING_DAYS));
        assert!(is_expiring_soon(n + Duration::hours(3), n, DEFAULT_WARNING_DAYS));
        assert!(is_expiring_soon(n + Duration::days(5) + Duration::hours(1), n, DEFAULT_WARNING_DAYS));
        assert!(!is_expiring_soon(n + Duration::days(6), n, DEFAULT_WARNING_DAYS));
        assert!(!is_expiring_soon(n - Duration::hours(3), n, DEFAULT_WARNING_DAYS));
    }
}
