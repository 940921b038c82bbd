//! Payment records and amount reconciliation.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::amount::TOKEN_PRECISION;
use crate::error::AppError;
use crate::memo::{Intent, MemoCodec};
use crate::pricing::{PriceCalculator, round_to};

/// Default absolute tolerance, in WAX, between observed and expected amounts.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// An on-chain transfer as submitted to the subscription backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub transaction_hash: String,
    pub from_wallet: String,
    pub to_wallet: String,
    pub amount: f64,
    pub memo: String,
    #[serde(default)]
    pub block_number: u64,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

impl PaymentRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        transaction_hash: impl Into<String>,
        from_wallet: impl Into<String>,
        to_wallet: impl Into<String>,
        amount: f64,
        memo: impl Into<String>,
        block_number: Option<u64>,
    ) -> Self {
        Self {
            transaction_hash: transaction_hash.into(),
            from_wallet: from_wallet.into(),
            to_wallet: to_wallet.into(),
            amount,
            memo: memo.into(),
            block_number: block_number.unwrap_or(0),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Reject records missing any required field.
    pub fn validate(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("transactionHash", self.transaction_hash.is_empty()),
            ("fromWallet", self.from_wallet.is_empty()),
            ("toWallet", self.to_wallet.is_empty()),
            ("memo", self.memo.is_empty()),
            ("amount", !(self.amount > 0.0)),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::format(format!(
                "missing required payment data: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountCheck {
    pub expected_amount: f64,
    pub actual_amount: f64,
    pub difference: f64,
}

/// Compare an observed amount against the expected one.
///
/// Passes when `|expected - actual| <= tolerance`; otherwise returns
/// [`AppError::AmountMismatch`] carrying both values and the delta.
/// Non-finite inputs and a negative tolerance are [`AppError::InvalidFormat`].
pub fn validate_payment_amount(
    expected: f64,
    actual: f64,
    tolerance: f64,
) -> Result<AmountCheck, AppError> {
    for (name, value) in [("expected amount", expected), ("actual amount", actual), ("tolerance", tolerance)] {
        if !value.is_finite() {
            return Err(AppError::format(format!("{name} must be a finite number, got {value}")));
        }
    }
    if tolerance < 0.0 {
        return Err(AppError::format(format!("tolerance must be >= 0, got {tolerance}")));
    }

    let difference = round_to((expected - actual).abs(), TOKEN_PRECISION as i32);
    if !(difference <= tolerance) {
        warn!(expected, actual, difference, tolerance, "payment amount mismatch");
        return Err(AppError::AmountMismatch { expected, actual, difference });
    }
    Ok(AmountCheck { expected_amount: expected, actual_amount: actual, difference })
}

/// A memo that decoded, priced, and reconciled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPayment {
    pub intent: Intent,
    #[serde(flatten)]
    pub check: AmountCheck,
}

/// Decode `memo`, price it, and reconcile against `amount`.
pub fn validate_payment(
    codec: &MemoCodec,
    calculator: &PriceCalculator,
    memo: &str,
    amount: f64,
    tolerance: f64,
) -> Result<ValidatedPayment, AppError> {
    let intent = codec.decode(memo)?;
    let expected = calculator.expected_amount(&intent)?;
    let check = validate_payment_amount(expected, amount, tolerance)?;
    debug!(memo, expected, amount, "payment reconciled");
    Ok(ValidatedPayment { intent, check })
}
