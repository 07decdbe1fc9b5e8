use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    app_error::AppResult,
    domain::entities::{
        coupon::{CouponRule, CouponSource},
        plan::{BillingCycle, PlanCode},
    },
};

// ============================================================================
// Repo Trait
// ============================================================================

/// Database-backed coupon lookups and the atomic claim RPCs. Codes are
/// passed pre-lowercased; the store compares case-insensitively.
#[async_trait]
pub trait CouponRepoTrait: Send + Sync {
    async fn find_general(&self, code: &str) -> AppResult<Option<CouponRule>>;

    async fn find_gift(&self, code: &str) -> AppResult<Option<CouponRule>>;

    /// Atomically consumes one use of a general coupon. Returns false when
    /// the usage cap is already exhausted. Cap enforcement lives in the
    /// `claim_coupon` SQL function.
    async fn claim_general(&self, code: &str) -> AppResult<bool>;

    /// Atomically consumes one use of a gift coupon for its owner.
    async fn claim_gift(&self, code: &str, discord_id: &str) -> AppResult<bool>;
}

// ============================================================================
// Evaluation Types
// ============================================================================

/// Order context a coupon is evaluated against.
#[derive(Debug, Clone)]
pub struct CouponContext {
    pub plan: PlanCode,
    pub billing: BillingCycle,
    /// Pre-discount order value in cents.
    pub base_cents: i64,
    /// Present when the request carries a valid session; required for
    /// gift coupons.
    pub discord_id: Option<String>,
}

/// Outcome of evaluating a coupon code against an order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CouponOutcome {
    /// Empty code; pricing proceeds without a discount.
    NotApplied,
    /// The code matched nothing, or matched a coupon whose conditions the
    /// order does not meet. Not an error: surfaced as `{ok:false, message}`.
    Rejected { message: String },
    Applied { rule: CouponRule },
}

impl CouponOutcome {
    pub fn rule(&self) -> Option<&CouponRule> {
        match self {
            CouponOutcome::Applied { rule } => Some(rule),
            _ => None,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        CouponOutcome::Rejected {
            message: message.into(),
        }
    }
}

// ============================================================================
// Use Cases
// ============================================================================

pub struct CouponUseCases {
    /// Env-configured coupons, checked before any database source.
    static_coupons: Vec<CouponRule>,
    repo: Arc<dyn CouponRepoTrait>,
}

impl CouponUseCases {
    pub fn new(static_coupons: Vec<CouponRule>, repo: Arc<dyn CouponRepoTrait>) -> Self {
        Self {
            static_coupons,
            repo,
        }
    }

    /// Resolves a code through the sources in priority order (static,
    /// gift, general) and validates the first match against the order.
    /// First match wins: a later source is never consulted once a code
    /// matched, even if the match is then rejected.
    pub async fn evaluate(&self, code: &str, ctx: &CouponContext) -> AppResult<CouponOutcome> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(CouponOutcome::NotApplied);
        }
        let lower = code.to_lowercase();

        let rule = match self.resolve(&lower).await? {
            Some(rule) => rule,
            None => return Ok(CouponOutcome::rejected("Coupon not found")),
        };

        Ok(match check_rule(&rule, ctx, Utc::now()) {
            Ok(()) => CouponOutcome::Applied { rule },
            Err(message) => CouponOutcome::rejected(message),
        })
    }

    async fn resolve(&self, lower: &str) -> AppResult<Option<CouponRule>> {
        if let Some(rule) = self
            .static_coupons
            .iter()
            .find(|c| c.code.to_lowercase() == lower)
        {
            return Ok(Some(rule.clone()));
        }
        if let Some(rule) = self.repo.find_gift(lower).await? {
            return Ok(Some(rule));
        }
        self.repo.find_general(lower).await
    }

    /// Consumes one use of the coupon after a payment was created.
    /// Best-effort by design: there is no transaction spanning the claim
    /// and the gateway create, so failures are logged and swallowed.
    pub async fn claim(&self, rule: &CouponRule, discord_id: Option<&str>) {
        let result = match rule.source {
            CouponSource::Static => return,
            CouponSource::Gift => match discord_id {
                Some(id) => self.repo.claim_gift(&rule.code, id).await,
                None => {
                    tracing::warn!(code = %rule.code, "Gift coupon claim without a session");
                    return;
                }
            },
            CouponSource::General => self.repo.claim_general(&rule.code).await,
        };

        match result {
            Ok(true) => {
                tracing::debug!(code = %rule.code, source = %rule.source, "Coupon use claimed")
            }
            Ok(false) => {
                tracing::warn!(code = %rule.code, source = %rule.source, "Coupon claim found no remaining uses")
            }
            Err(err) => {
                tracing::warn!(code = %rule.code, error = ?err, "Coupon claim failed")
            }
        }
    }
}

/// Validates one resolved rule against the order context.
fn check_rule(rule: &CouponRule, ctx: &CouponContext, now: DateTime<Utc>) -> Result<(), String> {
    if let Some(starts_at) = rule.starts_at
        && now < starts_at
    {
        return Err("Coupon is not active yet".into());
    }
    if let Some(ends_at) = rule.ends_at
        && now > ends_at
    {
        return Err("Coupon has expired".into());
    }
    if let Some(plan) = rule.plan
        && plan != ctx.plan
    {
        return Err(format!(
            "Coupon only applies to the {} plan",
            plan.display_name()
        ));
    }
    if let Some(billing) = rule.billing
        && billing != ctx.billing
    {
        return Err(format!("Coupon only applies to {} billing", billing));
    }
    if let Some(min) = rule.min_order_cents
        && ctx.base_cents < min
    {
        return Err("Order value is below the coupon minimum".into());
    }
    if let Some(remaining) = rule.remaining_uses
        && remaining <= 0
    {
        return Err("Coupon has no uses left".into());
    }
    if let Some(owner) = &rule.owner_discord_id
        && ctx.discord_id.as_deref() != Some(owner.as_str())
    {
        return Err("Coupon belongs to another account".into());
    }
    Ok(())
}
