pub mod auth;
pub(crate) mod common;
pub mod coupon;
pub mod dev;
pub mod me;
pub mod payment;

use axum::{Json, Router, routing::get};

use crate::adapters::http::app_state::AppState;

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .nest(
            "/pagment",
            payment::router()
                .merge(coupon::router())
                .merge(dev::router()),
        )
        .nest("/auth", auth::router())
        .merge(me::router())
        .route("/healthz", get(healthz))
}
