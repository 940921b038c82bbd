//! Tests for the shipped config/default.toml

use std::fs;
use std::path::Path;

use flyrancher_sub::config::{self, Endpoints, Overrides, ProrationMode};
use flyrancher_sub::memo::TierCodePolicy;
use flyrancher_sub::network::Network;

const PATH: &str = "config/default.toml";

#[test]
fn test_default_config_file_exists() {
    assert!(fs::metadata(PATH).is_ok(), "config/default.toml missing");
}

#[test]
fn test_default_config_parses() {
    let cfg = config::load_from(Path::new(PATH), &Overrides::default()).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.network, Network::Mainnet);
    assert_eq!(cfg.api.base_url, "https://flyrancher-sub.onrender.com");
    assert_eq!(cfg.api.endpoints, Endpoints::default());
    assert_eq!(cfg.payment.upgrade_proration, ProrationMode::HalfMonth);
    assert_eq!(cfg.codec().tier_policy(), TierCodePolicy::Strict);
}

#[test]
fn test_default_config_matches_builtins() {
    let file = config::load_from(Path::new(PATH), &Overrides::default()).unwrap();
    let builtin = config::from_toml_str("", &Overrides::default()).unwrap();
    assert_eq!(file.api.timeout_seconds, builtin.api.timeout_seconds);
    assert_eq!(file.payment.amount_tolerance, builtin.payment.amount_tolerance);
    assert_eq!(file.payment.wallet_rate, builtin.payment.wallet_rate);
    assert_eq!(
        file.payment.max_wallets_per_transaction,
        builtin.payment.max_wallets_per_transaction
    );
    assert_eq!(file.polling.max_attempts, builtin.polling.max_attempts);
    assert_eq!(file.polling.interval_ms, builtin.polling.interval_ms);
}

#[test]
fn test_default_config_prices_upgrade_at_half_month() {
    let cfg = config::load_from(Path::new(PATH), &Overrides::default()).unwrap();
    let intent = cfg.codec().decode("U-0-P").unwrap();
    let amount = cfg.calculator(None).unwrap().expected_amount(&intent).unwrap();
    assert_eq!(amount, 12.5);
}
