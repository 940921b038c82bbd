//! FlyRancher subscription payments.
//!
//! Encodes and decodes subscription payment memos, prices them against the
//! tier catalog, reconciles observed transfers, and talks to the subscription
//! status backend.

pub mod amount;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod expiry;
pub mod logger;
pub mod memo;
pub mod network;
pub mod payment;
pub mod pricing;
pub mod wallet;

pub use error::{AppError, ErrorKind};
pub use memo::{Intent, IntentKind, MemoCodec};
