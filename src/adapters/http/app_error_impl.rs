use crate::app_error::{AppError, ErrorCode, UpstreamKind};
use axum::Json;
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::Validation(msg) => error_resp(
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::ValidationFailed,
                Some(msg),
            ),
            AppError::Unauthorized => {
                error_resp(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, None)
            }
            AppError::Forbidden => error_resp(StatusCode::FORBIDDEN, ErrorCode::Forbidden, None),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::RateLimited => rate_limited_resp(),
            AppError::Upstream { kind, trace_id, .. } => upstream_resp(kind, trace_id),
            AppError::Database(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError, None)
            }
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, None)
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => {
            serde_json::json!({ "ok": false, "code": code.as_str(), "message": msg })
        }
        None => serde_json::json!({ "ok": false, "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}

fn rate_limited_resp() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("retry-after", axum::http::HeaderValue::from_static("60"));
    let body = serde_json::json!({
        "ok": false,
        "code": ErrorCode::RateLimited.as_str(),
        "message": "Too many requests. Please slow down.",
    });
    (StatusCode::TOO_MANY_REQUESTS, headers, Json(body)).into_response()
}

/// Gateway failures carry a trace id for support correlation and, where
/// the cause is known, a remediation hint. The raw gateway payload was
/// already logged under the same trace id and is never echoed here.
fn upstream_resp(kind: UpstreamKind, trace_id: Uuid) -> Response {
    let (status, code, message) = match kind {
        UpstreamKind::PixKeyMissing => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::PixKeyMissing,
            "Pix is unavailable: the merchant account has no Pix key registered. Choose another payment method.",
        ),
        UpstreamKind::PolicyRejected => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::PaymentPolicyRejected,
            "The gateway refused this charge. Very low amounts are rejected; check the per-method minimums and try again.",
        ),
        UpstreamKind::Unavailable => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::GatewayUnavailable,
            "The payment provider is unavailable. Try again in a moment.",
        ),
        UpstreamKind::Other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::GatewayError,
            "The payment provider rejected the request.",
        ),
    };

    let body = serde_json::json!({
        "ok": false,
        "code": code.as_str(),
        "message": message,
        "trace_id": trace_id,
    });
    (status, Json(body)).into_response()
}
