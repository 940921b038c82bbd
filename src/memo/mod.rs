//! Payment memo codec.
//!
//! A subscription payment is a plain WAX transfer whose memo field encodes
//! what is being bought. [`MemoCodec::encode`] produces the canonical memo for
//! an [`Intent`]; [`MemoCodec::decode`] inverts it exactly and rejects
//! anything else with [`AppError::InvalidFormat`]. Both directions run the
//! same validation, so `decode(encode(x)) == x` for every intent that encodes.
//!
//! The grammar itself lives in [`grammar`].

mod grammar;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Tier;
use crate::error::AppError;
use crate::wallet::{self, MAX_WALLETS_PER_TRANSACTION};

use grammar::{CodeField, RawMemo};

// ── Intent ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    NewSubscription,
    AddWallet,
    WalletRenewal,
    SubscriptionAddon,
    WalletAddon,
    SubscriptionRenewal,
    Upgrade,
}

impl IntentKind {
    pub const ALL: [IntentKind; 7] = [
        IntentKind::NewSubscription,
        IntentKind::AddWallet,
        IntentKind::WalletRenewal,
        IntentKind::SubscriptionAddon,
        IntentKind::WalletAddon,
        IntentKind::SubscriptionRenewal,
        IntentKind::Upgrade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::NewSubscription => "new_subscription",
            IntentKind::AddWallet => "add_wallet",
            IntentKind::WalletRenewal => "wallet_renewal",
            IntentKind::SubscriptionAddon => "subscription_addon",
            IntentKind::WalletAddon => "wallet_addon",
            IntentKind::SubscriptionRenewal => "subscription_renewal",
            IntentKind::Upgrade => "upgrade",
        }
    }

    /// Memo tag, e.g. `"N"` or `"FW"`.
    pub fn tag(self) -> &'static str {
        grammar::shape_for(self).tag
    }
}

impl std::str::FromStr for IntentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.tag() == s)
            .ok_or_else(|| AppError::format(format!("unknown memo type '{s}'")))
    }
}

/// A decoded subscription intent.
///
/// Serializes as `{"type": "<kind>", ...fields}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    NewSubscription { duration: u32, tier: Tier, wallets: Vec<String> },
    AddWallet { duration: u32, wallets: Vec<String> },
    WalletRenewal { duration: u32, wallets: Vec<String> },
    SubscriptionAddon { duration: u32, addon: String },
    WalletAddon { duration: u32, addon: String, wallets: Vec<String> },
    SubscriptionRenewal { duration: u32, tier: Tier },
    /// `duration == 0` requests an immediate, prorated upgrade.
    Upgrade { duration: u32, tier: Tier },
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::NewSubscription { .. } => IntentKind::NewSubscription,
            Intent::AddWallet { .. } => IntentKind::AddWallet,
            Intent::WalletRenewal { .. } => IntentKind::WalletRenewal,
            Intent::SubscriptionAddon { .. } => IntentKind::SubscriptionAddon,
            Intent::WalletAddon { .. } => IntentKind::WalletAddon,
            Intent::SubscriptionRenewal { .. } => IntentKind::SubscriptionRenewal,
            Intent::Upgrade { .. } => IntentKind::Upgrade,
        }
    }

    pub fn duration(&self) -> u32 {
        match self {
            Intent::NewSubscription { duration, .. }
            | Intent::AddWallet { duration, .. }
            | Intent::WalletRenewal { duration, .. }
            | Intent::SubscriptionAddon { duration, .. }
            | Intent::WalletAddon { duration, .. }
            | Intent::SubscriptionRenewal { duration, .. }
            | Intent::Upgrade { duration, .. } => *duration,
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        match self {
            Intent::NewSubscription { tier, .. }
            | Intent::SubscriptionRenewal { tier, .. }
            | Intent::Upgrade { tier, .. } => Some(*tier),
            _ => None,
        }
    }

    pub fn addon(&self) -> Option<&str> {
        match self {
            Intent::SubscriptionAddon { addon, .. } | Intent::WalletAddon { addon, .. } => {
                Some(addon.as_str())
            }
            _ => None,
        }
    }

    /// Wallets named by the memo; empty for subscription-level intents.
    pub fn wallets(&self) -> &[String] {
        match self {
            Intent::NewSubscription { wallets, .. }
            | Intent::AddWallet { wallets, .. }
            | Intent::WalletRenewal { wallets, .. }
            | Intent::WalletAddon { wallets, .. } => wallets,
            _ => &[],
        }
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, Intent::Upgrade { duration: 0, .. })
    }
}

// ── Codec ─────────────────────────────────────────────────────────────────────

/// How the decoder treats a tier letter other than `B`, `S`, `P`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TierCodePolicy {
    /// Reject with [`AppError::InvalidFormat`].
    #[default]
    Strict,
    /// Legacy behaviour: resolve unknown letters to [`Tier::Basic`].
    FallbackToBasic,
}

#[derive(Debug, Clone)]
pub struct MemoCodec {
    tier_policy: TierCodePolicy,
    max_wallets: usize,
}

impl Default for MemoCodec {
    fn default() -> Self {
        Self {
            tier_policy: TierCodePolicy::Strict,
            max_wallets: MAX_WALLETS_PER_TRANSACTION,
        }
    }
}

impl MemoCodec {
    pub fn new(tier_policy: TierCodePolicy, max_wallets: usize) -> Self {
        Self { tier_policy, max_wallets }
    }

    pub fn tier_policy(&self) -> TierCodePolicy {
        self.tier_policy
    }

    /// Parse `memo` into an [`Intent`].
    pub fn decode(&self, memo: &str) -> Result<Intent, AppError> {
        let raw = grammar::scan(memo)?;
        let intent = self.build(raw)?;
        self.check(&intent)?;
        debug!(memo, kind = intent.kind().as_str(), "memo decoded");
        Ok(intent)
    }

    /// Render the canonical memo for `intent`.
    pub fn encode(&self, intent: &Intent) -> Result<String, AppError> {
        self.check(intent)?;
        let d = intent.duration();
        let memo = match intent {
            Intent::NewSubscription { tier, wallets, .. } => {
                format!("N-{d}-{}:{}", tier.code(), wallets.join(","))
            }
            Intent::AddWallet { wallets, .. } => format!("A-{d}-X:{}", wallets.join(",")),
            Intent::WalletRenewal { wallets, .. } => format!("W-{d}-X:{}", wallets.join(",")),
            Intent::SubscriptionAddon { addon, .. } => format!("FS-{d}-{addon}:"),
            Intent::WalletAddon { addon, wallets, .. } => {
                format!("FW-{d}-{addon}:{}", wallets.join(","))
            }
            Intent::SubscriptionRenewal { tier, .. } => format!("R-{d}-{}:", tier.code()),
            Intent::Upgrade { tier, .. } => format!("U-{d}-{}:", tier.code()),
        };
        Ok(memo)
    }

    /// Format-only check, for callers that do not need the decoded value.
    pub fn validate(&self, memo: &str) -> Result<(), AppError> {
        self.decode(memo).map(|_| ())
    }

    fn resolve_tier(&self, code: &str) -> Result<Tier, AppError> {
        let letter = code.chars().next().unwrap_or_default();
        match (Tier::from_code(letter), self.tier_policy) {
            (Some(tier), _) => Ok(tier),
            (None, TierCodePolicy::FallbackToBasic) => {
                warn!(code, "unknown tier code, falling back to basic");
                Ok(Tier::Basic)
            }
            (None, TierCodePolicy::Strict) => {
                Err(AppError::format(format!("unknown tier code '{code}'")))
            }
        }
    }

    fn build(&self, raw: RawMemo<'_>) -> Result<Intent, AppError> {
        let RawMemo { shape, duration, code, wallets } = raw;
        let tier = match shape.code {
            CodeField::Tier => Some(self.resolve_tier(code)?),
            _ => None,
        };
        let addon = code.to_string();

        let intent = match (shape.kind, tier) {
            (IntentKind::NewSubscription, Some(tier)) => {
                Intent::NewSubscription { duration, tier, wallets }
            }
            (IntentKind::AddWallet, _) => Intent::AddWallet { duration, wallets },
            (IntentKind::WalletRenewal, _) => Intent::WalletRenewal { duration, wallets },
            (IntentKind::SubscriptionAddon, _) => Intent::SubscriptionAddon { duration, addon },
            (IntentKind::WalletAddon, _) => Intent::WalletAddon { duration, addon, wallets },
            (IntentKind::SubscriptionRenewal, Some(tier)) => {
                Intent::SubscriptionRenewal { duration, tier }
            }
            (IntentKind::Upgrade, Some(tier)) => Intent::Upgrade { duration, tier },
            (kind, None) => {
                return Err(AppError::format(format!(
                    "missing tier for {} memo",
                    kind.as_str()
                )));
            }
        };
        Ok(intent)
    }

    /// Field rules shared by both directions.
    fn check(&self, intent: &Intent) -> Result<(), AppError> {
        wallet::validate_duration(intent.duration(), intent.kind() == IntentKind::Upgrade)?;
        if let Some(addon) = intent.addon() {
            if !grammar::is_addon_code(addon) {
                return Err(AppError::format(format!(
                    "addon code '{addon}' must be uppercase letters"
                )));
            }
        }
        match intent {
            Intent::SubscriptionAddon { .. }
            | Intent::SubscriptionRenewal { .. }
            | Intent::Upgrade { .. } => Ok(()),
            _ => wallet::validate_wallet_list(intent.wallets(), self.max_wallets),
        }
    }
}

/// Decode with the default (strict) codec.
pub fn decode(memo: &str) -> Result<Intent, AppError> {
    MemoCodec::default().decode(memo)
}

/// Encode with the default codec.
pub fn encode(intent: &Intent) -> Result<String, AppError> {
    MemoCodec::default().encode(intent)
}
