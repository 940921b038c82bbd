//! Subscription catalog: tiers, duration discounts and addons.
//!
//! Prices are in WAX per month. The catalog is immutable after construction
//! and cheap to share by reference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default per-wallet monthly rate for add-wallet and wallet-renewal memos.
pub const DEFAULT_WALLET_RATE: f64 = 2.0;

// ── Tier ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Standard,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Basic, Tier::Standard, Tier::Premium];

    pub fn id(self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        }
    }

    /// One-letter code used in payment memos.
    pub fn code(self) -> char {
        match self {
            Tier::Basic => 'B',
            Tier::Standard => 'S',
            Tier::Premium => 'P',
        }
    }

    pub fn from_code(code: char) -> Option<Tier> {
        match code {
            'B' => Some(Tier::Basic),
            'S' => Some(Tier::Standard),
            'P' => Some(Tier::Premium),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::format(format!("unknown tier '{s}'")))
    }
}

/// Plan details for one [`Tier`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierInfo {
    pub id: Tier,
    pub name: &'static str,
    pub price: f64,
    pub wallet_limit: usize,
    pub features: &'static [&'static str],
    pub workers: &'static [&'static str],
    pub description: &'static str,
}

static TIERS: [TierInfo; 3] = [
    TierInfo {
        id: Tier::Basic,
        name: "Basic",
        price: 8.0,
        wallet_limit: 2,
        features: &["Auto-Claim NFTs", "Basic Dashboard", "Email Support"],
        workers: &[],
        description: "Perfect for beginners with a few NFTs",
    },
    TierInfo {
        id: Tier::Standard,
        name: "Standard",
        price: 15.0,
        wallet_limit: 5,
        features: &[
            "Auto-Claim NFTs",
            "Energy Management",
            "Bronze Workers",
            "Silver Workers",
            "Advanced Dashboard",
            "Priority Support",
        ],
        workers: &["bronze", "silver"],
        description: "Ideal for serious farmers with multiple wallets",
    },
    TierInfo {
        id: Tier::Premium,
        name: "Premium",
        price: 25.0,
        wallet_limit: 10,
        features: &[
            "Auto-Claim NFTs",
            "Tool Repair Automation",
            "Energy Management",
            "All Worker Types",
            "Advanced Analytics",
            "Custom Strategies",
            "Priority Support",
            "Discord Access",
        ],
        workers: &["bronze", "silver", "gold", "platinum"],
        description: "Ultimate automation for professional farmers",
    },
];

// ── Duration options ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationOption {
    pub months: u32,
    pub label: &'static str,
    /// Whole-percent discount applied to the base price.
    pub discount: u32,
    pub popular: bool,
}

static DURATION_OPTIONS: [DurationOption; 3] = [
    DurationOption { months: 1, label: "1 Month", discount: 0, popular: false },
    DurationOption { months: 2, label: "2 Months", discount: 5, popular: false },
    DurationOption { months: 3, label: "3 Months", discount: 10, popular: true },
];

// ── Addons ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddonInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: f64,
}

static ADDONS: [AddonInfo; 3] = [
    AddonInfo {
        code: "REPAIR",
        name: "Tool Repair Service",
        description: "Automatic tool repair when durability drops below threshold",
        price: 2.0,
    },
    AddonInfo {
        code: "ENERGY",
        name: "Energy Management",
        description: "Smart energy refill automation",
        price: 1.5,
    },
    AddonInfo {
        code: "ANALYTICS",
        name: "Advanced Analytics",
        description: "Detailed performance reports and insights",
        price: 3.0,
    },
];

// ── Catalog ───────────────────────────────────────────────────────────────────

/// Price list used by [`crate::pricing::PriceCalculator`].
#[derive(Debug, Clone)]
pub struct Catalog {
    wallet_rate: f64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self { wallet_rate: DEFAULT_WALLET_RATE }
    }
}

impl Catalog {
    pub fn with_wallet_rate(wallet_rate: f64) -> Self {
        Self { wallet_rate }
    }

    pub fn tiers(&self) -> &'static [TierInfo] {
        &TIERS
    }

    pub fn tier(&self, tier: Tier) -> &'static TierInfo {
        match tier {
            Tier::Basic => &TIERS[0],
            Tier::Standard => &TIERS[1],
            Tier::Premium => &TIERS[2],
        }
    }

    pub fn duration_options(&self) -> &'static [DurationOption] {
        &DURATION_OPTIONS
    }

    /// Discount percent for `months`; durations outside the table get none.
    pub fn duration_discount(&self, months: u32) -> Option<u32> {
        DURATION_OPTIONS.iter().find(|d| d.months == months).map(|d| d.discount)
    }

    pub fn addons(&self) -> &'static [AddonInfo] {
        &ADDONS
    }

    pub fn addon(&self, code: &str) -> Option<&'static AddonInfo> {
        ADDONS.iter().find(|a| a.code == code)
    }

    pub fn wallet_rate(&self) -> f64 {
        self.wallet_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_codes_map_both_ways() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_code(tier.code()), Some(tier));
        }
        assert_eq!(Tier::from_code('Z'), None);
        assert_eq!(Tier::from_code('b'), None);
    }

    #[test]
    fn tier_parses_case_insensitive() {
        assert_eq!("Premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn tier_lookup_matches_id() {
        let catalog = Catalog::default();
        for tier in Tier::ALL {
            assert_eq!(catalog.tier(tier).id, tier);
        }
        assert_eq!(catalog.tier(Tier::Standard).price, 15.0);
        assert_eq!(catalog.tier(Tier::Premium).wallet_limit, 10);
    }

    #[test]
    fn duration_discount_table() {
        let catalog = Catalog::default();
        assert_eq!(catalog.duration_discount(1), Some(0));
        assert_eq!(catalog.duration_discount(2), Some(5));
        assert_eq!(catalog.duration_discount(3), Some(10));
        assert_eq!(catalog.duration_discount(6), None);
    }

    #[test]
    fn addon_lookup_is_exact() {
        let catalog = Catalog::default();
        assert_eq!(catalog.addon("ENERGY").map(|a| a.price), Some(1.5));
        assert!(catalog.addon("energy").is_none());
        assert!(catalog.addon("TURBO").is_none());
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Standard).unwrap(), "\"standard\"");
    }
}
