//! Coupon routes under `/api/pagment/cupom`: GET validates, POST
//! validates and claims a use.

use super::common::*;
use super::payment::CouponView;
use crate::{
    application::use_cases::{coupons::CouponOutcome, pricing},
    domain::entities::{
        coupon::CouponSource,
        plan::{BillingCycle, PlanCode},
    },
};

#[derive(Deserialize)]
pub struct CouponQuery {
    code: String,
    plan: String,
    billing: String,
}

#[derive(Serialize)]
struct CouponResponse {
    ok: bool,
    coupon: CouponView,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    base_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    claimed: bool,
}

fn parse_pair(plan: &str, billing: &str) -> AppResult<(PlanCode, BillingCycle)> {
    let plan = plan
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid plan: {plan}")))?;
    let billing = billing
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid billing: {billing}")))?;
    Ok((plan, billing))
}

async fn evaluate(
    app_state: &AppState,
    cookies: &CookieJar,
    code: &str,
    plan: PlanCode,
    billing: BillingCycle,
) -> AppResult<(CouponOutcome, pricing::Quote)> {
    let discord_id = session_from_cookies(app_state, cookies).map(|s| s.discord_id);
    let priced = app_state
        .payments
        .price(plan, billing, Some(code), None, discord_id)
        .await?;
    Ok((priced.coupon, priced.quote))
}

fn respond(outcome: &CouponOutcome, quote: &pricing::Quote, claimed: bool) -> Response {
    let ok = !matches!(outcome, CouponOutcome::Rejected { .. });
    let message = match outcome {
        CouponOutcome::Rejected { message } => Some(message.clone()),
        _ => None,
    };
    Json(CouponResponse {
        ok,
        coupon: CouponView::from(outcome),
        message,
        base_cents: quote.base_cents,
        discount_cents: quote.discount_cents,
        total_cents: quote.total_cents,
        claimed,
    })
    .into_response()
}

/// GET /api/pagment/cupom
/// Validates a code against a (plan, billing) pair without consuming a
/// use. No session required; gift coupons simply reject without one.
async fn coupon_get(
    State(app_state): State<AppState>,
    Query(query): Query<CouponQuery>,
    cookies: CookieJar,
) -> AppResult<Response> {
    let (plan, billing) = parse_pair(&query.plan, &query.billing)?;
    let (outcome, quote) = evaluate(&app_state, &cookies, &query.code, plan, billing).await?;
    Ok(respond(&outcome, &quote, false))
}

#[derive(Deserialize)]
pub struct ClaimPayload {
    code: String,
    plan: String,
    billing: String,
}

/// POST /api/pagment/cupom
/// Validates and claims a use. Session required so gift coupons and the
/// per-user counters resolve.
async fn coupon_post(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Json(payload): Json<ClaimPayload>,
) -> AppResult<Response> {
    let session = require_session(&app_state, &cookies)?;
    let (plan, billing) = parse_pair(&payload.plan, &payload.billing)?;
    let (outcome, quote) = evaluate(&app_state, &cookies, &payload.code, plan, billing).await?;

    let mut claimed = false;
    if let Some(rule) = outcome.rule() {
        app_state
            .coupons
            .claim(rule, Some(session.discord_id.as_str()))
            .await;
        // Static coupons carry no usage counter; nothing was consumed.
        claimed = rule.source != CouponSource::Static;
    }

    Ok(respond(&outcome, &quote, claimed))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/cupom", get(coupon_get).post(coupon_post))
}
