//! Non-production status override under `/api/pagment/dev`. Lets
//! permitted testers walk a payment through its lifecycle without real
//! gateway traffic. Hidden entirely in production.

use super::common::*;
use crate::domain::entities::payment::PaymentStatus;

#[derive(Deserialize)]
pub struct OverrideQuery {
    payment_id: String,
}

#[derive(Deserialize)]
pub struct OverridePayload {
    payment_id: String,
    status: String,
}

#[derive(Serialize)]
struct OverrideResponse {
    ok: bool,
    payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<PaymentStatus>,
}

fn guard_environment(app_state: &AppState) -> AppResult<()> {
    // The endpoint does not exist in production, not even as a 403.
    if app_state.config.is_production() {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// GET /api/pagment/dev
async fn override_get(
    State(app_state): State<AppState>,
    Query(query): Query<OverrideQuery>,
    cookies: CookieJar,
) -> AppResult<Response> {
    guard_environment(&app_state)?;
    require_session(&app_state, &cookies)?;

    let status = app_state.dev.get_override(&query.payment_id).await?;
    Ok(Json(OverrideResponse {
        ok: true,
        payment_id: query.payment_id,
        status,
    })
    .into_response())
}

/// POST /api/pagment/dev
async fn override_post(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Json(payload): Json<OverridePayload>,
) -> AppResult<Response> {
    guard_environment(&app_state)?;
    let session = require_session(&app_state, &cookies)?;

    let status: PaymentStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid status: {}", payload.status)))?;

    app_state
        .dev
        .set_override(&session.discord_id, &payload.payment_id, status)
        .await?;

    Ok(Json(OverrideResponse {
        ok: true,
        payment_id: payload.payment_id,
        status: Some(status),
    })
    .into_response())
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/dev", get(override_get).post(override_post))
}
