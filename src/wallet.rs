//! WAX account name and duration validation.
//!
//! Applied before any memo is encoded and after any memo is decoded, so a
//! memo carrying a malformed account never leaves or enters the crate.

use std::collections::HashSet;

use crate::error::AppError;

pub const MIN_WALLET_LENGTH: usize = 3;
pub const MAX_WALLET_LENGTH: usize = 12;
pub const MAX_WALLETS_PER_TRANSACTION: usize = 10;
pub const MIN_DURATION: u32 = 1;
pub const MAX_DURATION: u32 = 12;

/// `true` for characters allowed in a WAX account name: `a-z`, `1-5`, `.`.
fn is_account_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '1'..='5' | '.')
}

/// Check a single account name.
pub fn validate_wallet_name(wallet: &str) -> Result<(), AppError> {
    if wallet.is_empty() {
        return Err(AppError::format("wallet name is required"));
    }
    let len = wallet.chars().count();
    if !(MIN_WALLET_LENGTH..=MAX_WALLET_LENGTH).contains(&len) {
        return Err(AppError::format(format!(
            "wallet name '{wallet}' must be {MIN_WALLET_LENGTH}-{MAX_WALLET_LENGTH} characters"
        )));
    }
    if !wallet.chars().all(is_account_char) {
        return Err(AppError::format(format!(
            "wallet name '{wallet}' may only contain a-z, 1-5 and '.'"
        )));
    }
    Ok(())
}

pub fn is_valid_wallet_name(wallet: &str) -> bool {
    validate_wallet_name(wallet).is_ok()
}

/// Check a wallet list: non-empty, at most `max` entries, every name valid,
/// no duplicates.
pub fn validate_wallet_list<S: AsRef<str>>(wallets: &[S], max: usize) -> Result<(), AppError> {
    if wallets.is_empty() {
        return Err(AppError::format("at least one wallet is required"));
    }
    if wallets.len() > max {
        return Err(AppError::format(format!("maximum {max} wallets allowed")));
    }

    let invalid: Vec<&str> = wallets
        .iter()
        .map(AsRef::as_ref)
        .filter(|w| !is_valid_wallet_name(w))
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::format(format!(
            "invalid wallet names: {}",
            invalid.join(", ")
        )));
    }

    let mut seen = HashSet::with_capacity(wallets.len());
    let duplicates: Vec<&str> = wallets
        .iter()
        .map(AsRef::as_ref)
        .filter(|w| !seen.insert(*w))
        .collect();
    if !duplicates.is_empty() {
        return Err(AppError::format(format!(
            "duplicate wallets detected: {}",
            duplicates.join(", ")
        )));
    }

    Ok(())
}

/// Check a month count. `allow_immediate` admits `0`, which only upgrades use.
pub fn validate_duration(duration: u32, allow_immediate: bool) -> Result<(), AppError> {
    if allow_immediate && duration == 0 {
        return Ok(());
    }
    if !(MIN_DURATION..=MAX_DURATION).contains(&duration) {
        return Err(AppError::format(format!(
            "duration {duration} out of range ({MIN_DURATION}-{MAX_DURATION} months)"
        )));
    }
    Ok(())
}
