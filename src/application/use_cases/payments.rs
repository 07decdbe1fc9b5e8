use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{
            CreatePayment, GatewayPayment, PaymentGatewayPort, PaymentId, PaymentMetadata,
        },
        use_cases::{
            coupons::{CouponContext, CouponOutcome, CouponUseCases},
            pricing::{self, MinimumAmounts, Quote},
        },
    },
    domain::entities::{
        order::{OrderRef, pricing_fingerprint},
        payment::{PaymentMethod, PaymentStatus},
        plan::{BillingCycle, PlanCode},
    },
};

// ============================================================================
// Intent Store Trait
// ============================================================================

/// A recently created payment intent, kept long enough to absorb client
/// retries and double-clicks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredIntent {
    pub payment_id: String,
    pub fingerprint: String,
}

/// Short-TTL dedup store keyed by (order_id, revision, method).
///
/// The store is best-effort: it narrows the window in which a retried
/// request would hit the gateway search path, but exactly-once creation is
/// guaranteed by the gateway's idempotency key, not by this cache.
#[async_trait]
pub trait IntentStoreTrait: Send + Sync {
    async fn get(&self, order: &OrderRef, method: PaymentMethod) -> AppResult<Option<StoredIntent>>;

    async fn put(
        &self,
        order: &OrderRef,
        method: PaymentMethod,
        intent: &StoredIntent,
        ttl_secs: u64,
    ) -> AppResult<()>;
}

// ============================================================================
// Request / Result Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub order: OrderRef,
    pub plan: PlanCode,
    pub billing: BillingCycle,
    pub method: PaymentMethod,
    pub coupon: Option<String>,
    pub payer_email: String,
    pub payer_cpf: String,
    pub card_token: Option<String>,
    pub installments: i32,
    pub discord_id: Option<String>,
    /// A payment the client wants replaced by this one (e.g. after a
    /// coupon change bumped the revision).
    pub replace_payment_id: Option<String>,
    /// Cancellation only ever runs when the client asks for it.
    pub cancel_previous: bool,
}

/// What happened to the `replace_payment_id`, reported verbatim to the
/// client so a skipped cancellation is visible rather than silent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplaceOutcome {
    NotRequested,
    Cancelled,
    Skipped { reason: String },
}

#[derive(Debug)]
pub struct CreatedPayment {
    pub payment: GatewayPayment,
    pub quote: Quote,
    /// Final charged amount after the per-method floor.
    pub charged_cents: i64,
    pub floored: bool,
    pub coupon: CouponOutcome,
    pub deduped: bool,
    pub replaced: ReplaceOutcome,
}

#[derive(Debug)]
pub enum CreateResult {
    /// The supplied coupon matched but failed its conditions. Surfaced as
    /// `{ok:false, message}`, never as an HTTP error.
    CouponRejected { message: String },
    Created(Box<CreatedPayment>),
}

/// A quote plus its evaluated coupon, for the GET quote endpoint.
#[derive(Debug)]
pub struct PricedOrder {
    pub quote: Quote,
    pub coupon: CouponOutcome,
    /// Total after the per-method floor, when a method was given.
    pub charged_cents: i64,
    pub floored: bool,
}

// ============================================================================
// Idempotency
// ============================================================================

/// Derives the gateway idempotency key. Pure function of the order
/// attributes: two identical requests (client retry, double-click) always
/// carry the same key, so the gateway refuses to double-charge even when
/// every local cache has been wiped.
pub fn idempotency_key(
    external_reference: &str,
    method: PaymentMethod,
    fingerprint: &str,
    payer_cpf: &str,
    payer_email: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(external_reference.as_bytes());
    hasher.update(b"|");
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(fingerprint.as_bytes());
    hasher.update(b"|");
    hasher.update(payer_cpf.as_bytes());
    hasher.update(b"|");
    hasher.update(payer_email.to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

// ============================================================================
// Use Cases
// ============================================================================

pub struct PaymentUseCases {
    gateway: Arc<dyn PaymentGatewayPort>,
    intents: Arc<dyn IntentStoreTrait>,
    coupons: Arc<CouponUseCases>,
    minimums: MinimumAmounts,
    intent_ttl_secs: u64,
    search_limit: u32,
    notification_url: Option<String>,
}

impl PaymentUseCases {
    pub fn new(
        gateway: Arc<dyn PaymentGatewayPort>,
        intents: Arc<dyn IntentStoreTrait>,
        coupons: Arc<CouponUseCases>,
        minimums: MinimumAmounts,
        intent_ttl_secs: u64,
        search_limit: u32,
        notification_url: Option<String>,
    ) -> Self {
        Self {
            gateway,
            intents,
            coupons,
            minimums,
            intent_ttl_secs,
            search_limit,
            notification_url,
        }
    }

    /// Prices an order without touching the gateway. Coupon rejections are
    /// carried inside the result; the quote then falls back to no discount.
    pub async fn price(
        &self,
        plan: PlanCode,
        billing: BillingCycle,
        coupon: Option<&str>,
        method: Option<PaymentMethod>,
        discord_id: Option<String>,
    ) -> AppResult<PricedOrder> {
        let base = pricing::quote(plan, billing, None);
        let ctx = CouponContext {
            plan,
            billing,
            base_cents: base.base_cents,
            discord_id,
        };
        let outcome = self
            .coupons
            .evaluate(coupon.unwrap_or_default(), &ctx)
            .await?;

        let quote = pricing::quote(plan, billing, outcome.rule().map(|r| &r.discount));
        let (charged_cents, floored) = match method {
            Some(m) => pricing::apply_method_floor(quote.total_cents, m, &self.minimums),
            None => (quote.total_cents, false),
        };

        Ok(PricedOrder {
            quote,
            coupon: outcome,
            charged_cents,
            floored,
        })
    }

    /// Fetches the current state of a payment for status polling.
    pub async fn poll(&self, payment_id: &str) -> AppResult<GatewayPayment> {
        if payment_id.trim().is_empty() {
            return Err(AppError::InvalidInput("payment_id is required".into()));
        }
        self.gateway
            .get_payment(&PaymentId::new(payment_id))
            .await
    }

    /// The payment creation endpoint's whole reconciliation pass:
    /// cancellation guard, price + floor, local dedup, gateway-search
    /// dedup, and only then an idempotent create.
    pub async fn create(&self, request: CreateOrderRequest) -> AppResult<CreateResult> {
        let priced = self
            .price(
                request.plan,
                request.billing,
                request.coupon.as_deref(),
                Some(request.method),
                request.discord_id.clone(),
            )
            .await?;

        if let CouponOutcome::Rejected { message } = &priced.coupon {
            return Ok(CreateResult::CouponRejected {
                message: message.clone(),
            });
        }

        let replaced = self
            .cancel_superseded(
                request.replace_payment_id.as_deref(),
                &request.order.order_id,
                request.cancel_previous,
            )
            .await;

        let applied_code = priced.coupon.rule().map(|r| r.code.as_str());
        let fingerprint = pricing_fingerprint(
            request.method,
            request.plan,
            request.billing,
            priced.charged_cents,
            applied_code,
            priced.quote.months,
            priced.quote.unit_cents,
        );
        let external_reference = request.order.external_reference();

        if let Some(existing) = self
            .find_reusable(&request, &fingerprint, &external_reference)
            .await?
        {
            tracing::info!(
                payment_id = %existing.id,
                external_reference = %external_reference,
                "Reusing in-flight payment instead of creating a duplicate"
            );
            self.remember_intent(&request.order, request.method, &existing, &fingerprint)
                .await;
            return Ok(CreateResult::Created(Box::new(CreatedPayment {
                payment: existing,
                quote: priced.quote,
                charged_cents: priced.charged_cents,
                floored: priced.floored,
                coupon: priced.coupon,
                deduped: true,
                replaced,
            })));
        }

        let key = idempotency_key(
            &external_reference,
            request.method,
            &fingerprint,
            &request.payer_cpf,
            &request.payer_email,
        );

        let create = CreatePayment {
            amount_cents: priced.charged_cents,
            method: request.method,
            description: format!(
                "{} plan ({})",
                request.plan.display_name(),
                request.billing
            ),
            external_reference: external_reference.clone(),
            payer_email: request.payer_email.clone(),
            payer_cpf: request.payer_cpf.clone(),
            card_token: request.card_token.clone(),
            installments: request.installments.max(1),
            metadata: PaymentMetadata {
                order_id: Some(request.order.order_id.clone()),
                revision: Some(request.order.revision),
                plan: Some(request.plan.as_str().to_string()),
                billing: Some(request.billing.as_str().to_string()),
                base_cents: Some(priced.quote.base_cents),
                discount_cents: Some(priced.quote.discount_cents),
                total_cents: Some(priced.charged_cents),
                coupon: applied_code.map(str::to_string),
                fingerprint: Some(fingerprint.clone()),
                discord_id: request.discord_id.clone(),
            },
            notification_url: self.notification_url.clone(),
        };

        let payment = self.gateway.create_payment(&create, &key).await?;
        tracing::info!(
            payment_id = %payment.id,
            external_reference = %external_reference,
            amount_cents = priced.charged_cents,
            method = %request.method,
            "Payment created"
        );

        self.remember_intent(&request.order, request.method, &payment, &fingerprint)
            .await;

        if let Some(rule) = priced.coupon.rule() {
            self.coupons
                .claim(rule, request.discord_id.as_deref())
                .await;
        }

        Ok(CreateResult::Created(Box::new(CreatedPayment {
            payment,
            quote: priced.quote,
            charged_cents: priced.charged_cents,
            floored: priced.floored,
            coupon: priced.coupon,
            deduped: false,
            replaced,
        })))
    }

    /// Dedup ladder: local intent store first, then the gateway's own
    /// search by external_reference.
    async fn find_reusable(
        &self,
        request: &CreateOrderRequest,
        fingerprint: &str,
        external_reference: &str,
    ) -> AppResult<Option<GatewayPayment>> {
        // Store errors must never block a checkout; treat them as a miss.
        let cached = match self.intents.get(&request.order, request.method).await {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!(error = ?err, "Intent store read failed, skipping local dedup");
                None
            }
        };

        if let Some(intent) = cached
            && intent.fingerprint == fingerprint
        {
            match self
                .gateway
                .get_payment(&PaymentId::new(&intent.payment_id))
                .await
            {
                Ok(payment) if !payment.status.is_terminal() => return Ok(Some(payment)),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        payment_id = %intent.payment_id,
                        error = ?err,
                        "Cached intent no longer fetchable, falling back to search"
                    );
                }
            }
        }

        let candidates = self
            .gateway
            .search_by_external_reference(external_reference, self.search_limit)
            .await?;
        if candidates.len() as u32 >= self.search_limit {
            // One (order, revision) accumulating a full page of intents is
            // client misbehavior; older candidates are not paginated in.
            tracing::warn!(
                external_reference = %external_reference,
                limit = self.search_limit,
                "Gateway search returned a full page, older candidates ignored"
            );
        }

        Ok(candidates
            .into_iter()
            .find(|p| p.is_reusable_for(fingerprint, request.method)))
    }

    async fn remember_intent(
        &self,
        order: &OrderRef,
        method: PaymentMethod,
        payment: &GatewayPayment,
        fingerprint: &str,
    ) {
        let intent = StoredIntent {
            payment_id: payment.id.as_str().to_string(),
            fingerprint: fingerprint.to_string(),
        };
        if let Err(err) = self
            .intents
            .put(order, method, &intent, self.intent_ttl_secs)
            .await
        {
            tracing::warn!(error = ?err, "Intent store write failed");
        }
    }

    /// Cancellation guard. Never fails the create path: every refusal is
    /// reported as a skip with its reason.
    async fn cancel_superseded(
        &self,
        replace_payment_id: Option<&str>,
        order_id: &str,
        cancel_previous: bool,
    ) -> ReplaceOutcome {
        let Some(replace_id) = replace_payment_id.filter(|id| !id.trim().is_empty()) else {
            return ReplaceOutcome::NotRequested;
        };
        if !cancel_previous {
            return ReplaceOutcome::Skipped {
                reason: "cancel_previous not set; previous payment left untouched".into(),
            };
        }

        let id = PaymentId::new(replace_id);
        let current = match self.gateway.get_payment(&id).await {
            Ok(payment) => payment,
            Err(err) => {
                tracing::warn!(payment_id = %replace_id, error = ?err, "Could not fetch payment to cancel");
                return ReplaceOutcome::Skipped {
                    reason: "previous payment could not be fetched".into(),
                };
            }
        };

        let remote_order_id = current.metadata.order_id.clone().or_else(|| {
            current
                .external_reference
                .as_deref()
                .and_then(OrderRef::parse_external_reference)
                .map(|o| o.order_id)
        });
        if let Some(remote) = remote_order_id
            && remote != order_id
        {
            tracing::warn!(
                payment_id = %replace_id,
                remote_order = %remote,
                requested_order = %order_id,
                "Refusing to cancel a payment from a different order"
            );
            return ReplaceOutcome::Skipped {
                reason: "previous payment belongs to a different order".into(),
            };
        }

        if current.status == PaymentStatus::Approved {
            return ReplaceOutcome::Skipped {
                reason: "previous payment is already approved".into(),
            };
        }
        if !current.status.is_cancellable() {
            return ReplaceOutcome::Skipped {
                reason: format!("previous payment is {}, not cancellable", current.status),
            };
        }

        match self.gateway.cancel_payment(&id).await {
            Ok(_) => {
                tracing::info!(payment_id = %replace_id, "Superseded payment cancelled");
                ReplaceOutcome::Cancelled
            }
            Err(err) => {
                tracing::warn!(payment_id = %replace_id, error = ?err, "Cancel failed");
                ReplaceOutcome::Skipped {
                    reason: "gateway refused the cancellation".into(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        gateway_mock::MockGateway, repo_mocks::InMemoryCouponRepo,
        store_mocks::InMemoryIntentStore,
    };
    use crate::domain::entities::coupon::{CouponRule, CouponSource, DiscountKind};

    fn coupon_rule(code: &str, discount: DiscountKind) -> CouponRule {
        CouponRule {
            code: code.to_string(),
            source: CouponSource::Static,
            discount,
            starts_at: None,
            ends_at: None,
            plan: None,
            billing: None,
            min_order_cents: None,
            remaining_uses: None,
            owner_discord_id: None,
        }
    }

    struct Fixture {
        gateway: Arc<MockGateway>,
        use_cases: PaymentUseCases,
    }

    fn fixture_with(static_coupons: Vec<CouponRule>) -> Fixture {
        let gateway = Arc::new(MockGateway::default());
        let coupons = Arc::new(CouponUseCases::new(
            static_coupons,
            Arc::new(InMemoryCouponRepo::default()),
        ));
        let use_cases = PaymentUseCases::new(
            gateway.clone(),
            Arc::new(InMemoryIntentStore::default()),
            coupons,
            MinimumAmounts::default(),
            120,
            30,
            None,
        );
        Fixture { gateway, use_cases }
    }

    fn fixture() -> Fixture {
        fixture_with(vec![])
    }

    fn request(order_id: &str, revision: u32) -> CreateOrderRequest {
        CreateOrderRequest {
            order: OrderRef::new(order_id, revision),
            plan: PlanCode::Pro,
            billing: BillingCycle::Monthly,
            method: PaymentMethod::Pix,
            coupon: None,
            payer_email: "payer@example.com".into(),
            payer_cpf: "12345678909".into(),
            card_token: None,
            installments: 1,
            discord_id: Some("42".into()),
            replace_payment_id: None,
            cancel_previous: false,
        }
    }

    fn created(result: CreateResult) -> CreatedPayment {
        match result {
            CreateResult::Created(payment) => *payment,
            CreateResult::CouponRejected { message } => {
                panic!("unexpected coupon rejection: {message}")
            }
        }
    }

    #[test]
    fn test_idempotency_key_is_pure() {
        let a = idempotency_key("order:x:rev:1", PaymentMethod::Pix, "fp", "123", "a@b.c");
        let b = idempotency_key("order:x:rev:1", PaymentMethod::Pix, "fp", "123", "A@B.C");
        assert_eq!(a, b, "email casing must not change the key");

        let c = idempotency_key("order:x:rev:2", PaymentMethod::Pix, "fp", "123", "a@b.c");
        assert_ne!(a, c, "a new revision must produce a new key");

        let d = idempotency_key("order:x:rev:1", PaymentMethod::Boleto, "fp", "123", "a@b.c");
        assert_ne!(a, d, "a different method must produce a new key");
    }

    #[tokio::test]
    async fn test_create_charges_quote_total() {
        let f = fixture();
        let result = created(f.use_cases.create(request("o1", 1)).await.unwrap());
        assert!(!result.deduped);
        assert_eq!(result.charged_cents, 1990);
        assert_eq!(result.payment.amount_cents, 1990);
        assert_eq!(f.gateway.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_repeated_create_within_ttl_dedupes() {
        let f = fixture();
        let first = created(f.use_cases.create(request("o1", 1)).await.unwrap());
        let second = created(f.use_cases.create(request("o1", 1)).await.unwrap());

        assert!(second.deduped);
        assert_eq!(second.payment.id, first.payment.id);
        assert_eq!(
            f.gateway.create_calls(),
            1,
            "second call must not create a duplicate charge"
        );
    }

    #[tokio::test]
    async fn test_price_change_defeats_local_dedup() {
        let f = fixture_with(vec![coupon_rule("half", DiscountKind::Percent(50))]);
        let first = created(f.use_cases.create(request("o1", 1)).await.unwrap());

        let mut repriced = request("o1", 2);
        repriced.coupon = Some("half".into());
        let second = created(f.use_cases.create(repriced).await.unwrap());

        assert!(!second.deduped);
        assert_ne!(second.payment.id, first.payment.id);
        assert_eq!(second.charged_cents, 995);
        assert_eq!(f.gateway.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_gateway_search_dedup_when_local_store_is_cold() {
        let f = fixture();
        let first = created(f.use_cases.create(request("o1", 1)).await.unwrap());

        // Simulate a fresh instance: same gateway state, empty local store.
        let coupons = Arc::new(CouponUseCases::new(
            vec![],
            Arc::new(InMemoryCouponRepo::default()),
        ));
        let cold = PaymentUseCases::new(
            f.gateway.clone(),
            Arc::new(InMemoryIntentStore::default()),
            coupons,
            MinimumAmounts::default(),
            120,
            30,
            None,
        );

        let second = created(cold.create(request("o1", 1)).await.unwrap());
        assert!(second.deduped);
        assert_eq!(second.payment.id, first.payment.id);
        assert_eq!(f.gateway.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_terminal_candidate_is_not_reused() {
        let f = fixture();
        let first = created(f.use_cases.create(request("o1", 1)).await.unwrap());
        f.gateway
            .set_status(first.payment.id.as_str(), PaymentStatus::Rejected);

        let second = created(f.use_cases.create(request("o1", 1)).await.unwrap());
        assert!(!second.deduped);
        assert_ne!(second.payment.id, first.payment.id);
        assert_eq!(f.gateway.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_pix_floor_applied_before_submission() {
        let f = fixture_with(vec![coupon_rule("cheap", DiscountKind::TargetTotal(1))]);
        let mut req = request("o1", 1);
        req.coupon = Some("cheap".into());

        let result = created(f.use_cases.create(req).await.unwrap());
        assert!(result.floored);
        assert_eq!(result.quote.total_cents, 1);
        assert_eq!(result.charged_cents, 100);
        assert_eq!(result.payment.amount_cents, 100);
    }

    #[tokio::test]
    async fn test_rejected_coupon_short_circuits_without_gateway_call() {
        let f = fixture();
        let mut req = request("o1", 1);
        req.coupon = Some("doesnotexist".into());

        match f.use_cases.create(req).await.unwrap() {
            CreateResult::CouponRejected { message } => {
                assert!(message.contains("not found"))
            }
            other => panic!("expected coupon rejection, got {:?}", other),
        }
        assert_eq!(f.gateway.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_skipped_without_flag() {
        let f = fixture();
        let first = created(f.use_cases.create(request("o1", 1)).await.unwrap());

        let mut req = request("o1", 2);
        req.replace_payment_id = Some(first.payment.id.as_str().to_string());
        req.cancel_previous = false;

        let second = created(f.use_cases.create(req).await.unwrap());
        assert!(matches!(second.replaced, ReplaceOutcome::Skipped { .. }));
        assert_eq!(f.gateway.cancel_calls(), 0);
        assert_eq!(
            f.gateway.status_of(first.payment.id.as_str()),
            Some(PaymentStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_cancel_with_flag_cancels_pending_payment() {
        let f = fixture();
        let first = created(f.use_cases.create(request("o1", 1)).await.unwrap());

        let mut req = request("o1", 2);
        req.replace_payment_id = Some(first.payment.id.as_str().to_string());
        req.cancel_previous = true;

        let second = created(f.use_cases.create(req).await.unwrap());
        assert_eq!(second.replaced, ReplaceOutcome::Cancelled);
        assert_eq!(f.gateway.cancel_calls(), 1);
        assert_eq!(
            f.gateway.status_of(first.payment.id.as_str()),
            Some(PaymentStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_approved_payment_is_never_cancelled() {
        let f = fixture();
        let first = created(f.use_cases.create(request("o1", 1)).await.unwrap());
        f.gateway
            .set_status(first.payment.id.as_str(), PaymentStatus::Approved);

        let mut req = request("o1", 2);
        req.replace_payment_id = Some(first.payment.id.as_str().to_string());
        req.cancel_previous = true;

        let second = created(f.use_cases.create(req).await.unwrap());
        match second.replaced {
            ReplaceOutcome::Skipped { reason } => assert!(reason.contains("approved")),
            other => panic!("expected skip, got {:?}", other),
        }
        assert_eq!(f.gateway.cancel_calls(), 0);
        assert_eq!(
            f.gateway.status_of(first.payment.id.as_str()),
            Some(PaymentStatus::Approved)
        );
    }

    #[tokio::test]
    async fn test_foreign_order_payment_is_never_cancelled() {
        let f = fixture();
        let foreign = created(f.use_cases.create(request("other-order", 1)).await.unwrap());

        let mut req = request("o1", 1);
        req.replace_payment_id = Some(foreign.payment.id.as_str().to_string());
        req.cancel_previous = true;

        let result = created(f.use_cases.create(req).await.unwrap());
        match result.replaced {
            ReplaceOutcome::Skipped { reason } => {
                assert!(reason.contains("different order"))
            }
            other => panic!("expected skip, got {:?}", other),
        }
        assert_eq!(f.gateway.cancel_calls(), 0);
    }

    #[tokio::test]
    async fn test_non_cancellable_status_is_skipped() {
        let f = fixture();
        let first = created(f.use_cases.create(request("o1", 1)).await.unwrap());
        f.gateway
            .set_status(first.payment.id.as_str(), PaymentStatus::Expired);

        let mut req = request("o1", 2);
        req.replace_payment_id = Some(first.payment.id.as_str().to_string());
        req.cancel_previous = true;

        let second = created(f.use_cases.create(req).await.unwrap());
        match second.replaced {
            ReplaceOutcome::Skipped { reason } => {
                assert!(reason.contains("not cancellable"))
            }
            other => panic!("expected skip, got {:?}", other),
        }
        assert_eq!(f.gateway.cancel_calls(), 0);
    }

    #[tokio::test]
    async fn test_poll_rejects_blank_id() {
        let f = fixture();
        assert!(matches!(
            f.use_cases.poll("  ").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_quote_carries_coupon_rejection_but_still_prices() {
        let f = fixture();
        let priced = f
            .use_cases
            .price(
                PlanCode::Pro,
                BillingCycle::Monthly,
                Some("missing"),
                Some(PaymentMethod::Pix),
                None,
            )
            .await
            .unwrap();
        assert!(matches!(priced.coupon, CouponOutcome::Rejected { .. }));
        assert_eq!(priced.quote.total_cents, 1990);
        assert_eq!(priced.charged_cents, 1990);
    }
}
