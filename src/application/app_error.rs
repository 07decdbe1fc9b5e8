use thiserror::Error;
use uuid::Uuid;

/// Classification of payment-gateway failures. The HTTP client maps raw
/// gateway responses into one of these; the response layer turns them into
/// status codes and remediation hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// The merchant account has no Pix key registered, so Pix charges
    /// cannot be rendered.
    PixKeyMissing,
    /// The gateway's risk/policy engine refused the charge (commonly
    /// amounts below the method minimum).
    PolicyRejected,
    /// 429/5xx after retries, timeouts, transport failures.
    Unavailable,
    /// Anything else the gateway refused.
    Other,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not logged in")]
    Unauthorized,

    #[error("Not allowed")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Payment gateway error [{trace_id}]")]
    Upstream {
        kind: UpstreamKind,
        trace_id: Uuid,
        /// Raw gateway detail. Logged server-side, never echoed to clients.
        detail: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an Upstream error with a fresh trace id, logging the raw
    /// detail under that id for support correlation.
    pub fn upstream(kind: UpstreamKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let trace_id = Uuid::new_v4();
        tracing::error!(%trace_id, ?kind, detail = %detail, "Payment gateway error");
        AppError::Upstream {
            kind,
            trace_id,
            detail,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::Database(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    InvalidInput,
    ValidationFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    PixKeyMissing,
    PaymentPolicyRejected,
    GatewayUnavailable,
    GatewayError,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::PixKeyMissing => "PIX_KEY_MISSING",
            ErrorCode::PaymentPolicyRejected => "PAYMENT_POLICY_REJECTED",
            ErrorCode::GatewayUnavailable => "GATEWAY_UNAVAILABLE",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
