//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `FLYRANCHER_LOG_LEVEL`, `FLYRANCHER_API_BASE_URL` and
//! `FLYRANCHER_NETWORK` overrides. Every key has a built-in default, so an
//! empty file (or no file at the default location) yields a working config.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

use crate::catalog::{Catalog, DEFAULT_WALLET_RATE};
use crate::error::AppError;
use crate::logger;
use crate::memo::{MemoCodec, TierCodePolicy};
use crate::network::Network;
use crate::payment::DEFAULT_TOLERANCE;
use crate::pricing::{PriceCalculator, Proration};
use crate::wallet::MAX_WALLETS_PER_TRANSACTION;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Backend endpoint paths, appended to [`ApiConfig::base_url`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub status: String,
    pub subscribe: String,
    pub payments: String,
    pub metrics: String,
    pub health: String,
    pub transaction: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            status: "/subscription/status".into(),
            subscribe: "/subscription/process".into(),
            payments: "/subscription/payments".into(),
            metrics: "/subscription/metrics".into(),
            health: "/subscription/system/status".into(),
            transaction: "/subscription/transaction".into(),
        }
    }
}

/// Subscription backend connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme and host, no trailing slash.
    pub base_url: String,
    pub endpoints: Endpoints,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// How immediate upgrades are charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProrationMode {
    HalfMonth,
    Daily,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub amount_tolerance: f64,
    pub wallet_rate: f64,
    pub max_wallets_per_transaction: usize,
    pub upgrade_proration: ProrationMode,
    pub days_in_month: u32,
    /// Resolve unknown tier letters to basic instead of rejecting the memo.
    pub lenient_tier_codes: bool,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

/// Fully-resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Append logs here instead of stderr (already expanded, no `~`).
    pub log_file: Option<PathBuf>,
    pub network: Network,
    pub api: ApiConfig,
    pub payment: PaymentConfig,
    pub polling: PollingConfig,
}

impl Config {
    /// Memo codec honouring `[payment]` settings.
    pub fn codec(&self) -> MemoCodec {
        let policy = if self.payment.lenient_tier_codes {
            TierCodePolicy::FallbackToBasic
        } else {
            TierCodePolicy::Strict
        };
        MemoCodec::new(policy, self.payment.max_wallets_per_transaction)
    }

    /// Tier catalog at the configured per-wallet rate.
    pub fn catalog(&self) -> Catalog {
        Catalog::with_wallet_rate(self.payment.wallet_rate)
    }

    /// Price calculator honouring `[payment]` settings.
    ///
    /// `remaining_days` is required when `upgrade_proration = "daily"`.
    pub fn calculator(&self, remaining_days: Option<u32>) -> Result<PriceCalculator, AppError> {
        let proration = match (self.payment.upgrade_proration, remaining_days) {
            (ProrationMode::HalfMonth, _) => Proration::HalfMonth,
            (ProrationMode::Daily, Some(remaining_days)) => Proration::Daily {
                remaining_days,
                days_in_month: self.payment.days_in_month,
            },
            (ProrationMode::Daily, None) => {
                return Err(AppError::Config(
                    "daily upgrade proration needs the remaining days of the current period".into(),
                ));
            }
        };
        Ok(PriceCalculator::new(self.catalog(), proration))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            network: Network::default(),
            api: ApiConfig {
                base_url: default_base_url(),
                endpoints: Endpoints::default(),
                timeout_seconds: default_timeout_seconds(),
            },
            payment: PaymentConfig {
                amount_tolerance: default_tolerance(),
                wallet_rate: default_wallet_rate(),
                max_wallets_per_transaction: default_max_wallets(),
                upgrade_proration: default_proration(),
                days_in_month: default_days_in_month(),
                lenient_tier_codes: false,
            },
            polling: PollingConfig {
                max_attempts: default_max_attempts(),
                interval_ms: default_interval_ms(),
            },
        }
    }
}

/// Values that take precedence over the TOML file.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub log_level: Option<&'a str>,
    pub base_url: Option<&'a str>,
    pub network: Option<&'a str>,
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    client: RawClient,
    #[serde(default)]
    api: RawApi,
    #[serde(default)]
    payment: RawPayment,
    #[serde(default)]
    polling: RawPolling,
}

#[derive(Deserialize)]
struct RawClient {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
    #[serde(default = "default_network")]
    network: String,
}

impl Default for RawClient {
    fn default() -> Self {
        Self { log_level: default_log_level(), log_file: None, network: default_network() }
    }
}

#[derive(Deserialize)]
struct RawApi {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default)]
    endpoints: Endpoints,
}

impl Default for RawApi {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawPayment {
    #[serde(default = "default_tolerance")]
    amount_tolerance: f64,
    #[serde(default = "default_wallet_rate")]
    wallet_rate: f64,
    #[serde(default = "default_max_wallets")]
    max_wallets_per_transaction: usize,
    #[serde(default = "default_proration")]
    upgrade_proration: ProrationMode,
    #[serde(default = "default_days_in_month")]
    days_in_month: u32,
    #[serde(default)]
    lenient_tier_codes: bool,
}

impl Default for RawPayment {
    fn default() -> Self {
        Self {
            amount_tolerance: default_tolerance(),
            wallet_rate: default_wallet_rate(),
            max_wallets_per_transaction: default_max_wallets(),
            upgrade_proration: default_proration(),
            days_in_month: default_days_in_month(),
            lenient_tier_codes: false,
        }
    }
}

#[derive(Deserialize)]
struct RawPolling {
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    #[serde(default = "default_interval_ms")]
    interval_ms: u64,
}

impl Default for RawPolling {
    fn default() -> Self {
        Self { max_attempts: default_max_attempts(), interval_ms: default_interval_ms() }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_network() -> String { "mainnet".to_string() }
fn default_base_url() -> String { "https://flyrancher-sub.onrender.com".to_string() }
fn default_timeout_seconds() -> u64 { 30 }
fn default_tolerance() -> f64 { DEFAULT_TOLERANCE }
fn default_wallet_rate() -> f64 { DEFAULT_WALLET_RATE }
fn default_max_wallets() -> usize { MAX_WALLETS_PER_TRANSACTION }
fn default_proration() -> ProrationMode { ProrationMode::HalfMonth }
fn default_days_in_month() -> u32 { 30 }
fn default_max_attempts() -> u32 { 20 }
fn default_interval_ms() -> u64 { 5000 }

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `path` (or [`DEFAULT_CONFIG_PATH`]), then apply env-var
/// overrides. An explicit `path` must exist; a missing default file falls
/// back to built-in defaults.
pub fn load(path: Option<&Path>) -> Result<Config, AppError> {
    let log_level = env::var("FLYRANCHER_LOG_LEVEL").ok();
    let base_url = env::var("FLYRANCHER_API_BASE_URL").ok();
    let network = env::var("FLYRANCHER_NETWORK").ok();
    let overrides = Overrides {
        log_level: log_level.as_deref(),
        base_url: base_url.as_deref(),
        network: network.as_deref(),
    };

    match path {
        Some(p) => load_from(p, &overrides),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_from(default, &overrides)
            } else {
                debug!(path = DEFAULT_CONFIG_PATH, "no config file, using built-in defaults");
                from_toml_str("", &overrides)
            }
        }
    }
}

/// Load from an explicit path with the given overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: &Overrides<'_>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    from_toml_str(&raw, overrides).map_err(|e| match e {
        AppError::Config(msg) => AppError::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Resolve a TOML document into a [`Config`].
pub fn from_toml_str(toml_src: &str, overrides: &Overrides<'_>) -> Result<Config, AppError> {
    let parsed: RawConfig = toml::from_str(toml_src)
        .map_err(|e| AppError::Config(format!("parse error: {e}")))?;

    let log_level = overrides.log_level.unwrap_or(&parsed.client.log_level).to_string();
    let network: Network = overrides.network.unwrap_or(&parsed.client.network).parse()?;
    let base_url = overrides
        .base_url
        .unwrap_or(&parsed.api.base_url)
        .trim_end_matches('/')
        .to_string();

    let config = Config {
        log_level,
        log_file: parsed.client.log_file.as_deref().map(expand_home),
        network,
        api: ApiConfig {
            base_url,
            endpoints: parsed.api.endpoints,
            timeout_seconds: parsed.api.timeout_seconds,
        },
        payment: PaymentConfig {
            amount_tolerance: parsed.payment.amount_tolerance,
            wallet_rate: parsed.payment.wallet_rate,
            max_wallets_per_transaction: parsed.payment.max_wallets_per_transaction,
            upgrade_proration: parsed.payment.upgrade_proration,
            days_in_month: parsed.payment.days_in_month,
            lenient_tier_codes: parsed.payment.lenient_tier_codes,
        },
        polling: PollingConfig {
            max_attempts: parsed.polling.max_attempts,
            interval_ms: parsed.polling.interval_ms,
        },
    };
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), AppError> {
    logger::parse_level(&config.log_level)
        .map_err(|e| AppError::Config(format!("client.log_level: {e}")))?;
    let api = &config.api;
    if !(api.base_url.starts_with("http://") || api.base_url.starts_with("https://")) {
        return Err(AppError::Config(format!(
            "api.base_url must be an http(s) URL, got '{}'",
            api.base_url
        )));
    }
    if api.timeout_seconds == 0 {
        return Err(AppError::Config("api.timeout_seconds must be > 0".into()));
    }
    let p = &config.payment;
    if !(p.amount_tolerance >= 0.0) {
        return Err(AppError::Config("payment.amount_tolerance must be >= 0".into()));
    }
    if !(p.wallet_rate > 0.0) {
        return Err(AppError::Config("payment.wallet_rate must be > 0".into()));
    }
    if p.max_wallets_per_transaction == 0 {
        return Err(AppError::Config("payment.max_wallets_per_transaction must be > 0".into()));
    }
    if p.days_in_month == 0 {
        return Err(AppError::Config("payment.days_in_month must be > 0".into()));
    }
    if config.polling.max_attempts == 0 {
        return Err(AppError::Config("polling.max_attempts must be > 0".into()));
    }
    Ok(())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
