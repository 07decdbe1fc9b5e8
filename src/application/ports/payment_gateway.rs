use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    app_error::AppResult,
    domain::entities::payment::{PaymentMethod, PaymentStatus},
};

// ============================================================================
// Port Types - Gateway-agnostic domain types
// ============================================================================

/// Unique identifier for a payment in the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata attached to every payment we create. Round-trips through the
/// gateway so deduplicated candidates can be checked against the currently
/// requested price without local persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentMetadata {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub revision: Option<u32>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub billing: Option<String>,
    #[serde(default)]
    pub base_cents: Option<i64>,
    #[serde(default)]
    pub discount_cents: Option<i64>,
    #[serde(default)]
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub coupon: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub discord_id: Option<String>,
}

/// Request to create one payment attempt at the gateway.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub description: String,
    pub external_reference: String,
    pub payer_email: String,
    pub payer_cpf: String,
    /// Tokenized card data; required for `card`, absent otherwise.
    pub card_token: Option<String>,
    pub installments: i32,
    pub metadata: PaymentMetadata,
    pub notification_url: Option<String>,
}

/// Pix-specific payload returned on creation: what the client renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PixInfo {
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
}

/// Boleto-specific payload returned on creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoletoInfo {
    pub barcode: Option<String>,
    pub ticket_url: Option<String>,
}

/// A payment as seen by the gateway, reduced to the fields the
/// reconciliation logic and the client need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: PaymentId,
    pub status: PaymentStatus,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    pub amount_cents: i64,
    /// The gateway's payment_method_id string (e.g. "pix", "bolbradesco").
    pub method_id: Option<String>,
    pub metadata: PaymentMetadata,
    pub pix: Option<PixInfo>,
    pub boleto: Option<BoletoInfo>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_of_expiration: Option<DateTime<Utc>>,
}

impl GatewayPayment {
    /// Whether this remote payment may stand in for a new create request
    /// with the given fingerprint and method.
    pub fn is_reusable_for(&self, fingerprint: &str, method: PaymentMethod) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if self.metadata.fingerprint.as_deref() != Some(fingerprint) {
            return false;
        }
        self.method_id.as_deref() == Some(method.gateway_method_id())
    }
}

// ============================================================================
// Payment Gateway Port
// ============================================================================

/// Payment gateway port - abstracts the remote payment API.
///
/// Implementations classify their own failures into `AppError::Upstream`
/// and handle timeout/retry internally; callers never see raw HTTP.
#[async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    /// Create a payment. `idempotency_key` is forwarded as the gateway's
    /// idempotency header; identical retried requests must yield the same
    /// remote payment.
    async fn create_payment(
        &self,
        request: &CreatePayment,
        idempotency_key: &str,
    ) -> AppResult<GatewayPayment>;

    /// Fetch the current state of a payment.
    async fn get_payment(&self, id: &PaymentId) -> AppResult<GatewayPayment>;

    /// Search payments by external_reference, most recent first, bounded
    /// by `limit`. Used by the dedup layer before creating anything new.
    async fn search_by_external_reference(
        &self,
        external_reference: &str,
        limit: u32,
    ) -> AppResult<Vec<GatewayPayment>>;

    /// Cancel a payment. Callers are expected to have run the cancellation
    /// guard first; the gateway still rejects non-cancellable states.
    async fn cancel_payment(&self, id: &PaymentId) -> AppResult<GatewayPayment>;
}
