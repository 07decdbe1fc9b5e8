use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{
    payment::PaymentMethod,
    plan::{BillingCycle, PlanCode},
};

/// Identifies one priced version of an order. The pair is encoded into the
/// gateway's `external_reference` so remote payments can be correlated back
/// without any local persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRef {
    pub order_id: String,
    /// Bumped by the client whenever the price changes after a payment
    /// intent may already exist (coupon added/removed, plan switched).
    pub revision: u32,
}

impl OrderRef {
    pub fn new(order_id: impl Into<String>, revision: u32) -> Self {
        Self {
            order_id: order_id.into(),
            revision,
        }
    }

    pub fn external_reference(&self) -> String {
        format!("order:{}:rev:{}", self.order_id, self.revision)
    }

    /// Parses `order:<id>:rev:<n>` back into an OrderRef. Returns None for
    /// references written by anything other than this service.
    pub fn parse_external_reference(reference: &str) -> Option<Self> {
        let rest = reference.strip_prefix("order:")?;
        let (order_id, rev) = rest.rsplit_once(":rev:")?;
        if order_id.is_empty() {
            return None;
        }
        let revision: u32 = rev.parse().ok()?;
        Some(Self {
            order_id: order_id.to_string(),
            revision,
        })
    }
}

/// Hash over every pricing-relevant field of an order. A cached or
/// gateway-found candidate payment is only reused when its stored
/// fingerprint matches the fingerprint of the price being requested now.
pub fn pricing_fingerprint(
    method: PaymentMethod,
    plan: PlanCode,
    billing: BillingCycle,
    total_cents: i64,
    coupon: Option<&str>,
    months: i64,
    unit_cents: i64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(plan.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(billing.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(total_cents.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(coupon.unwrap_or("").to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(months.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(unit_cents.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_reference_round_trip() {
        let order = OrderRef::new("a1b2c3", 2);
        assert_eq!(order.external_reference(), "order:a1b2c3:rev:2");
        assert_eq!(
            OrderRef::parse_external_reference("order:a1b2c3:rev:2"),
            Some(order)
        );
    }

    #[test]
    fn test_parse_rejects_foreign_references() {
        assert_eq!(OrderRef::parse_external_reference("invoice-123"), None);
        assert_eq!(OrderRef::parse_external_reference("order::rev:1"), None);
        assert_eq!(OrderRef::parse_external_reference("order:x:rev:abc"), None);
    }

    #[test]
    fn test_parse_order_id_may_contain_colons() {
        let parsed = OrderRef::parse_external_reference("order:a:b:rev:7").unwrap();
        assert_eq!(parsed.order_id, "a:b");
        assert_eq!(parsed.revision, 7);
    }

    #[test]
    fn test_fingerprint_is_stable_and_coupon_case_insensitive() {
        let a = pricing_fingerprint(
            PaymentMethod::Pix,
            PlanCode::Pro,
            BillingCycle::Monthly,
            1990,
            Some("PROMO10"),
            1,
            1990,
        );
        let b = pricing_fingerprint(
            PaymentMethod::Pix,
            PlanCode::Pro,
            BillingCycle::Monthly,
            1990,
            Some("promo10"),
            1,
            1990,
        );
        assert_eq!(a, b);

        let different_total = pricing_fingerprint(
            PaymentMethod::Pix,
            PlanCode::Pro,
            BillingCycle::Monthly,
            995,
            Some("promo10"),
            1,
            1990,
        );
        assert_ne!(a, different_total);
    }
}
