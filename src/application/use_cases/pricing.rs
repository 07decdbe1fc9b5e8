use serde::Serialize;

use crate::domain::entities::{
    coupon::DiscountKind,
    payment::PaymentMethod,
    plan::{BillingCycle, PlanCode},
};

/// One priced order, all amounts in integer cents. Produced before any
/// per-method minimum floor is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub base_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub months: i64,
    pub unit_cents: i64,
}

/// Per-method minimum final amounts, loaded from config. The gateway's
/// risk engine rejects charges below these, so they are enforced locally
/// with a clearer error path.
#[derive(Debug, Clone, Copy)]
pub struct MinimumAmounts {
    pub pix_cents: i64,
    pub boleto_cents: i64,
    pub card_cents: i64,
}

impl MinimumAmounts {
    pub fn for_method(&self, method: PaymentMethod) -> i64 {
        match method {
            PaymentMethod::Pix => self.pix_cents,
            PaymentMethod::Boleto => self.boleto_cents,
            PaymentMethod::Card => self.card_cents,
        }
    }
}

impl Default for MinimumAmounts {
    fn default() -> Self {
        Self {
            pix_cents: 100,
            boleto_cents: 300,
            card_cents: 100,
        }
    }
}

/// Computes the quote for a (plan, billing) pair with an optional discount
/// already resolved by the coupon evaluator.
///
/// Guarantees: `0 <= discount_cents <= base_cents - 1` and
/// `total_cents >= 1` (the gateway rejects zero-value charges).
pub fn quote(plan: PlanCode, billing: BillingCycle, discount: Option<&DiscountKind>) -> Quote {
    let unit_cents = plan.unit_price_cents();
    let months = billing.months();
    let base_cents = unit_cents * months;

    let total_cents = match discount {
        None => base_cents,
        Some(kind) => discounted_total(base_cents, kind),
    };

    Quote {
        base_cents,
        discount_cents: base_cents - total_cents,
        total_cents,
        months,
        unit_cents,
    }
}

/// Applies one discount rule to a base amount. The result never exceeds
/// the base and never drops below one cent.
fn discounted_total(base_cents: i64, kind: &DiscountKind) -> i64 {
    let raw = match kind {
        DiscountKind::Percent(pct) => {
            let pct = (*pct).clamp(0, 100);
            // Round half away from zero to the nearest cent.
            base_cents - (base_cents * pct + 50) / 100
        }
        DiscountKind::Fixed(cents) => base_cents - (*cents).max(0),
        DiscountKind::TargetTotal(target) => base_cents.min(*target),
    };
    raw.clamp(1, base_cents)
}

/// Raises a post-discount total to the per-method minimum. Runs after and
/// independently of coupon evaluation. Returns the adjusted total and
/// whether the floor kicked in.
pub fn apply_method_floor(
    total_cents: i64,
    method: PaymentMethod,
    minimums: &MinimumAmounts,
) -> (i64, bool) {
    let floor = minimums.for_method(method);
    if total_cents < floor {
        (floor, true)
    } else {
        (total_cents, false)
    }
}
