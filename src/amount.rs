//! WAX amount parsing and display.

use crate::error::AppError;

/// WAX token precision.
pub const TOKEN_PRECISION: usize = 8;
pub const TOKEN_SYMBOL: &str = "WAX";
const MAX_AMOUNT: f64 = 1_000_000.0;

/// Parse a user-entered WAX amount.
///
/// Accepts plain decimal notation only: positive, at most one million, and
/// no more than [`TOKEN_PRECISION`] fractional digits.
pub fn parse_wax_amount(input: &str) -> Result<f64, AppError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::format("amount is required"));
    }

    let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(AppError::format(format!("invalid amount format '{input}'")));
    }
    if frac.len() > TOKEN_PRECISION {
        return Err(AppError::format(format!(
            "too many decimal places (max {TOKEN_PRECISION})"
        )));
    }

    let value: f64 = input
        .parse()
        .map_err(|_| AppError::format(format!("invalid amount format '{input}'")))?;
    if value <= 0.0 {
        return Err(AppError::format("amount must be greater than 0"));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::format("amount is too large"));
    }
    Ok(value)
}

/// `40.5` → `"40.5000 WAX"`.
pub fn format_wax(amount: f64) -> String {
    format!("{amount:.4} {TOKEN_SYMBOL}")
}
