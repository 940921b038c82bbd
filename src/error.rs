//! Application-wide error types.
//!
//! Every fallible operation in the crate returns [`AppError`]. The three
//! domain failure kinds (format, amount, network) are reported through
//! [`AppError::kind`] so callers can branch without matching every variant.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A memo, wallet name, amount string, or payment record failed validation.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Observed payment differs from the memo-derived amount beyond tolerance.
    #[error(
        "payment amount mismatch: expected {expected} WAX, received {actual} WAX (difference {difference})"
    )]
    AmountMismatch {
        expected: f64,
        actual: f64,
        difference: f64,
    },

    #[error("network error: {0}")]
    Network(String),

    /// Payment confirmation was not observed within the attempt budget.
    #[error("payment confirmation timeout after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("operation cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidFormat,
    AmountMismatch,
    /// Transport failures, HTTP errors, poll timeouts and cancellations.
    NetworkFailure,
    Setup,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            AppError::AmountMismatch { .. } => ErrorKind::AmountMismatch,
            AppError::Network(_) | AppError::Timeout { .. } | AppError::Cancelled => {
                ErrorKind::NetworkFailure
            }
            AppError::Config(_) | AppError::Logger(_) | AppError::Io(_) => ErrorKind::Setup,
        }
    }

    /// Shorthand used throughout the codec and validators.
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        AppError::InvalidFormat(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn invalid_format_display() {
        let e = AppError::InvalidFormat("bad memo".into());
        assert!(e.to_string().contains("bad memo"));
        assert_eq!(e.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn amount_mismatch_reports_both_values() {
        let e = AppError::AmountMismatch { expected: 40.5, actual: 40.3, difference: 0.2 };
        let msg = e.to_string();
        assert!(msg.contains("40.5"));
        assert!(msg.contains("40.3"));
        assert!(msg.contains("0.2"));
        assert_eq!(e.kind(), ErrorKind::AmountMismatch);
    }

    #[test]
    fn timeout_is_a_network_failure() {
        let e = AppError::Timeout { attempts: 20 };
        assert!(e.to_string().contains("20 attempts"));
        assert_eq!(e.kind(), ErrorKind::NetworkFailure);
        assert_eq!(AppError::Cancelled.kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        assert_eq!(e.kind(), ErrorKind::Setup);
        let _: &dyn Error = &e;
    }
}
