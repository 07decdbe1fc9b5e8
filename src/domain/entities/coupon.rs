use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::{BillingCycle, PlanCode};

/// Where a coupon was resolved from. Sources are checked in declaration
/// order; the first matching code wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponSource {
    /// Configured via environment, no usage tracking.
    Static,
    /// Database-backed, exclusive to a single Discord user.
    Gift,
    /// Database-backed, open to everyone, optional usage cap.
    General,
}

impl CouponSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponSource::Static => "static",
            CouponSource::Gift => "gift",
            CouponSource::General => "general",
        }
    }
}

impl std::fmt::Display for CouponSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three discount shapes a coupon can carry. All amounts are integer
/// cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage off the base total, clamped to 0..=100.
    Percent(i64),
    /// Flat amount subtracted from the base total.
    Fixed(i64),
    /// The final total becomes this value, unless the base is already
    /// lower. Never raises the price.
    TargetTotal(i64),
}

impl DiscountKind {
    pub fn from_parts(kind: &str, value_cents: i64) -> Result<Self, String> {
        match kind {
            "percent" => Ok(DiscountKind::Percent(value_cents)),
            "fixed" => Ok(DiscountKind::Fixed(value_cents)),
            "target_total" => Ok(DiscountKind::TargetTotal(value_cents)),
            _ => Err(format!("Unknown discount kind: {}", kind)),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            DiscountKind::Percent(_) => "percent",
            DiscountKind::Fixed(_) => "fixed",
            DiscountKind::TargetTotal(_) => "target_total",
        }
    }
}

/// A fully resolved coupon, independent of which source produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRule {
    pub code: String,
    pub source: CouponSource,
    pub discount: DiscountKind,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// When set, the coupon only applies to this plan.
    pub plan: Option<PlanCode>,
    /// When set, the coupon only applies to this billing cycle.
    pub billing: Option<BillingCycle>,
    /// Minimum pre-discount order value for the coupon to apply.
    pub min_order_cents: Option<i64>,
    /// Remaining uses, if the source tracks usage. None means unlimited.
    pub remaining_uses: Option<i64>,
    /// Set on gift coupons; the only Discord user allowed to redeem it.
    pub owner_discord_id: Option<String>,
}
