//! Payment routes: quote, create/reconcile, and status polling, all under
//! `/api/pagment` (path spelling is load-bearing for existing clients).

use validator::Validate;

use super::common::*;
use crate::{
    application::{
        ports::payment_gateway::{BoletoInfo, GatewayPayment, PixInfo},
        use_cases::{
            coupons::CouponOutcome,
            payments::{CreateOrderRequest, CreateResult, ReplaceOutcome},
            pricing::Quote,
        },
    },
    domain::entities::{
        coupon::CouponSource,
        order::OrderRef,
        payment::{PaymentMethod, PaymentStatus},
        plan::{BillingCycle, PlanCode},
    },
};

// ============================================================================
// Types
// ============================================================================

#[derive(Deserialize)]
pub struct PaymentQuery {
    payment_id: Option<String>,
    plan: Option<String>,
    billing: Option<String>,
    coupon: Option<String>,
    method: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct CreatePaymentPayload {
    plan: String,
    billing: String,
    method: String,
    #[serde(default)]
    coupon: Option<String>,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    revision: Option<u32>,
    #[validate(nested)]
    payer: PayerPayload,
    #[serde(default)]
    card_token: Option<String>,
    #[serde(default)]
    installments: Option<i32>,
    #[serde(default)]
    replace_payment_id: Option<String>,
    #[serde(default)]
    cancel_previous: bool,
}

#[derive(Deserialize, Validate)]
struct PayerPayload {
    #[validate(email(message = "payer.email must be a valid email"))]
    email: String,
    #[validate(length(min = 11, max = 14, message = "payer.cpf must be a CPF"))]
    cpf: String,
}

/// Client-safe view of a coupon evaluation. Gift-coupon ownership and
/// internal rule fields never leave the server.
#[derive(Serialize)]
pub(crate) struct CouponView {
    applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<CouponSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl From<&CouponOutcome> for CouponView {
    fn from(outcome: &CouponOutcome) -> Self {
        match outcome {
            CouponOutcome::NotApplied => CouponView {
                applied: false,
                code: None,
                source: None,
                message: None,
            },
            CouponOutcome::Rejected { message } => CouponView {
                applied: false,
                code: None,
                source: None,
                message: Some(message.clone()),
            },
            CouponOutcome::Applied { rule } => CouponView {
                applied: true,
                code: Some(rule.code.clone()),
                source: Some(rule.source),
                message: None,
            },
        }
    }
}

#[derive(Serialize)]
struct QuoteResponse {
    ok: bool,
    plan: PlanCode,
    billing: BillingCycle,
    pricing: Quote,
    /// Total after the per-method minimum, when a method was given.
    charged_cents: i64,
    floored: bool,
    coupon: CouponView,
    features: Vec<String>,
}

#[derive(Serialize)]
struct PollResponse {
    ok: bool,
    payment_id: String,
    status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_detail: Option<String>,
    /// Terminal flag: clients stop polling when true.
    done: bool,
}

#[derive(Serialize)]
struct CreateResponse {
    ok: bool,
    payment_id: String,
    status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_detail: Option<String>,
    done: bool,
    deduped: bool,
    replaced: ReplaceOutcome,
    amount_cents: i64,
    pricing: Quote,
    coupon: CouponView,
    order_id: String,
    revision: u32,
    external_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pix: Option<PixInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boleto: Option<BoletoInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_field<T>(value: &str, field: &'static str) -> AppResult<T>
where
    T: std::str::FromStr,
{
    value
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid {field}: {value}")))
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> AppResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{field} is required")))
}

/// CPF arrives formatted ("123.456.789-09") or bare; the gateway wants
/// bare digits.
fn normalize_cpf(cpf: &str) -> AppResult<String> {
    let digits: String = cpf.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 11 {
        return Err(AppError::Validation(
            "payer.cpf must contain exactly 11 digits".into(),
        ));
    }
    Ok(digits)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/pagment
/// Two modes: `?payment_id=` polls a payment's status; `?plan=&billing=`
/// quotes a price. Neither requires a session (a coupon may still resolve
/// per-user when one is present).
async fn payment_get(
    State(app_state): State<AppState>,
    Query(query): Query<PaymentQuery>,
    cookies: CookieJar,
) -> AppResult<Response> {
    if let Some(payment_id) = &query.payment_id {
        return poll_payment(&app_state, payment_id).await;
    }

    let plan: PlanCode = parse_field(required(&query.plan, "plan")?, "plan")?;
    let billing: BillingCycle = parse_field(required(&query.billing, "billing")?, "billing")?;
    let method: Option<PaymentMethod> = match query.method.as_deref().filter(|m| !m.is_empty()) {
        Some(raw) => Some(parse_field(raw, "method")?),
        None => None,
    };
    let discord_id = session_from_cookies(&app_state, &cookies).map(|s| s.discord_id);

    let priced = app_state
        .payments
        .price(plan, billing, query.coupon.as_deref(), method, discord_id)
        .await?;
    let features = app_state.plan_features.features_for(plan).await?;

    Ok(Json(QuoteResponse {
        ok: true,
        plan,
        billing,
        pricing: priced.quote,
        charged_cents: priced.charged_cents,
        floored: priced.floored,
        coupon: CouponView::from(&priced.coupon),
        features,
    })
    .into_response())
}

async fn poll_payment(app_state: &AppState, payment_id: &str) -> AppResult<Response> {
    // Non-production status overrides short-circuit the gateway entirely.
    if !app_state.config.is_production()
        && let Some(status) = app_state.dev.get_override(payment_id).await?
    {
        return Ok(Json(PollResponse {
            ok: true,
            payment_id: payment_id.to_string(),
            status,
            status_detail: Some("dev_override".into()),
            done: status.is_terminal(),
        })
        .into_response());
    }

    let payment = app_state.payments.poll(payment_id).await?;
    Ok(Json(PollResponse {
        ok: true,
        payment_id: payment.id.as_str().to_string(),
        status: payment.status,
        status_detail: payment.status_detail,
        done: payment.status.is_terminal(),
    })
    .into_response())
}

/// POST /api/pagment
/// Creates (or reconciles onto an existing) payment intent for an order.
/// Requires a session: payments are always tied to a Discord account.
async fn payment_post(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Json(payload): Json<CreatePaymentPayload>,
) -> AppResult<Response> {
    let session = require_session(&app_state, &cookies)?;

    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let plan: PlanCode = parse_field(&payload.plan, "plan")?;
    let billing: BillingCycle = parse_field(&payload.billing, "billing")?;
    let method: PaymentMethod = parse_field(&payload.method, "method")?;
    let payer_cpf = normalize_cpf(&payload.payer.cpf)?;

    if method == PaymentMethod::Card && payload.card_token.as_deref().unwrap_or("").is_empty() {
        return Err(AppError::InvalidInput(
            "card_token is required for card payments".into(),
        ));
    }

    let order = OrderRef::new(
        payload
            .order_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        payload.revision.unwrap_or(1),
    );

    let request = CreateOrderRequest {
        order: order.clone(),
        plan,
        billing,
        method,
        coupon: payload.coupon.clone(),
        payer_email: payload.payer.email.clone(),
        payer_cpf,
        card_token: payload.card_token.clone(),
        installments: payload.installments.unwrap_or(1),
        discord_id: Some(session.discord_id.clone()),
        replace_payment_id: payload.replace_payment_id.clone(),
        cancel_previous: payload.cancel_previous,
    };

    match app_state.payments.create(request).await? {
        CreateResult::CouponRejected { message } => Ok(Json(serde_json::json!({
            "ok": false,
            "code": "COUPON_REJECTED",
            "message": message,
        }))
        .into_response()),
        CreateResult::Created(created) => {
            let GatewayPayment {
                id,
                status,
                status_detail,
                pix,
                boleto,
                date_of_expiration,
                ..
            } = created.payment;

            let external_reference = order.external_reference();
            Ok(Json(CreateResponse {
                ok: true,
                payment_id: id.as_str().to_string(),
                status,
                status_detail,
                done: status.is_terminal(),
                deduped: created.deduped,
                replaced: created.replaced,
                amount_cents: created.charged_cents,
                pricing: created.quote,
                coupon: CouponView::from(&created.coupon),
                order_id: order.order_id,
                revision: order.revision,
                external_reference,
                pix,
                boleto,
                expires_at: date_of_expiration,
            })
            .into_response())
        }
    }
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(payment_get).post(payment_post))
}
