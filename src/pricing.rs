//! Price calculation for memos, catalog quotes, and tier recommendations.
//!
//! Amounts are WAX as `f64`, rounded half-away-from-zero to 4 decimals, the
//! precision the payment UI quotes in.

use serde::Serialize;

use crate::catalog::{Catalog, Tier, TierInfo};
use crate::error::AppError;
use crate::memo::Intent;

/// Duration used for the savings figure on recommendations.
const RECOMMENDATION_MONTHS: u32 = 3;

/// Round `value` to `places` decimal digits.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// How an immediate upgrade (`U-0-*`) is charged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Proration {
    /// Flat 50% of the target tier's monthly price.
    #[default]
    HalfMonth,
    /// `price × remaining_days / days_in_month`.
    Daily { remaining_days: u32, days_in_month: u32 },
}

impl Proration {
    fn charge(self, monthly_price: f64) -> Result<f64, AppError> {
        match self {
            Proration::HalfMonth => Ok(monthly_price * 0.5),
            Proration::Daily { days_in_month: 0, .. } => {
                Err(AppError::format("days_in_month must be > 0"))
            }
            Proration::Daily { remaining_days, days_in_month } => {
                let days = remaining_days.min(days_in_month);
                Ok(monthly_price * f64::from(days) / f64::from(days_in_month))
            }
        }
    }
}

/// A tier that fits the requested wallet count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(flatten)]
    pub tier: &'static TierInfo,
    pub recommended: bool,
    /// Discount earned by paying three months up front.
    pub savings: f64,
    pub cost_per_wallet: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PriceCalculator {
    catalog: Catalog,
    proration: Proration,
}

impl PriceCalculator {
    pub fn new(catalog: Catalog, proration: Proration) -> Self {
        Self { catalog, proration }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Amount a memo should be paid with.
    pub fn expected_amount(&self, intent: &Intent) -> Result<f64, AppError> {
        let months = f64::from(intent.duration());
        let wallet_count = intent.wallets().len() as f64;

        let amount = match intent {
            Intent::NewSubscription { tier, duration, .. } => {
                self.discounted_base(*tier, *duration)
            }
            Intent::AddWallet { .. } | Intent::WalletRenewal { .. } => {
                self.catalog.wallet_rate() * wallet_count * months
            }
            Intent::SubscriptionAddon { addon, .. } => self.addon_price(addon)? * months,
            Intent::WalletAddon { addon, .. } => {
                self.addon_price(addon)? * wallet_count * months
            }
            Intent::Upgrade { tier, duration: 0 } => {
                self.proration.charge(self.catalog.tier(*tier).price)?
            }
            Intent::SubscriptionRenewal { tier, .. } | Intent::Upgrade { tier, .. } => {
                self.catalog.tier(*tier).price * months
            }
        };
        Ok(round_to(amount, 4))
    }

    /// Catalog quote: discounted tier price plus each addon for the duration.
    pub fn quote<S: AsRef<str>>(
        &self,
        tier: Tier,
        duration: u32,
        addons: &[S],
    ) -> Result<f64, AppError> {
        let months = f64::from(duration);
        let addon_total = addons
            .iter()
            .map(|code| self.addon_price(code.as_ref()).map(|p| p * months))
            .sum::<Result<f64, AppError>>()?;
        Ok(round_to(self.discounted_base(tier, duration) + addon_total, 4))
    }

    /// Discount earned for `duration`, rounded to cents.
    pub fn savings(&self, tier: Tier, duration: u32) -> f64 {
        let Some(percent) = self.catalog.duration_discount(duration) else {
            return 0.0;
        };
        let monthly_total = self.catalog.tier(tier).price * f64::from(duration);
        round_to(monthly_total * f64::from(percent) / 100.0, 2)
    }

    /// Tiers whose wallet limit covers `current + growth`, cheapest first.
    pub fn recommend(&self, current_wallets: usize, projected_growth: usize) -> Vec<Recommendation> {
        let needed = current_wallets + projected_growth;
        let mut out: Vec<Recommendation> = self
            .catalog
            .tiers()
            .iter()
            .filter(|t| t.wallet_limit >= needed)
            .map(|t| Recommendation {
                tier: t,
                recommended: t.id == Tier::Standard,
                savings: self.savings(t.id, RECOMMENDATION_MONTHS),
                cost_per_wallet: round_to(t.price / t.wallet_limit as f64, 2),
            })
            .collect();
        out.sort_by(|a, b| a.tier.price.total_cmp(&b.tier.price));
        out
    }

    fn discounted_base(&self, tier: Tier, duration: u32) -> f64 {
        let base = self.catalog.tier(tier).price * f64::from(duration);
        let percent = self.catalog.duration_discount(duration).unwrap_or(0);
        base - base * f64::from(percent) / 100.0
    }

    fn addon_price(&self, code: &str) -> Result<f64, AppError> {
        self.catalog
            .addon(code)
            .map(|a| a.price)
            .ok_or_else(|| AppError::format(format!("unknown addon code '{code}'")))
    }
}
