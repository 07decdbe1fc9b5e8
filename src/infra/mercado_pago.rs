use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    app_error::{AppError, AppResult, UpstreamKind},
    application::ports::payment_gateway::{
        BoletoInfo, CreatePayment, GatewayPayment, PaymentGatewayPort, PaymentId, PaymentMetadata,
        PixInfo,
    },
    domain::entities::payment::{PaymentMethod, PaymentStatus},
    infra::http_client,
};

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 250;

/// Mercado Pago payments client. Creation is idempotent via the
/// X-Idempotency-Key header; 429/5xx responses and transport errors are
/// retried with exponential backoff, 4xx never.
#[derive(Clone)]
pub struct MercadoPagoClient {
    client: Client,
    base_url: String,
    access_token: SecretString,
}

impl MercadoPagoClient {
    pub fn new(base_url: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            client: http_client::build_client(),
            base_url: base_url.into(),
            access_token,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }

    /// Sends a request, retrying retryable failures with backoff. The
    /// builder is cloned per attempt; bodies are always cloneable here
    /// (JSON or empty).
    async fn send_with_retry(&self, builder: RequestBuilder) -> AppResult<reqwest::Response> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let request = builder
                .try_clone()
                .ok_or_else(|| AppError::Internal("Gateway request not cloneable".into()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let retryable = status == StatusCode::TOO_MANY_REQUESTS
                        || status.is_server_error();
                    if retryable && attempt < MAX_ATTEMPTS {
                        let delay = BACKOFF_BASE_MS * 2u64.pow(attempt - 1);
                        tracing::warn!(
                            status = %status,
                            attempt,
                            delay_ms = delay,
                            "Gateway returned a retryable status, backing off"
                        );
                        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                        continue;
                    }
                    if retryable {
                        return Err(AppError::upstream(
                            UpstreamKind::Unavailable,
                            format!("Gateway still {} after {} attempts", status, attempt),
                        ));
                    }
                    return Ok(response);
                }
                Err(err) => {
                    // Timeouts and connection resets are worth retrying;
                    // anything else (TLS, bad URL) is not transient.
                    let retryable = err.is_timeout() || err.is_connect() || err.is_request();
                    if retryable && attempt < MAX_ATTEMPTS {
                        let delay = BACKOFF_BASE_MS * 2u64.pow(attempt - 1);
                        tracing::warn!(error = %err, attempt, delay_ms = delay, "Gateway transport error, backing off");
                        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                        continue;
                    }
                    return Err(AppError::upstream(
                        UpstreamKind::Unavailable,
                        format!("Gateway request failed: {err}"),
                    ));
                }
            }
        }
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::upstream(
                UpstreamKind::Unavailable,
                format!("Failed to read gateway response: {e}"),
            )
        })?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse gateway response");
            AppError::upstream(
                UpstreamKind::Other,
                format!("Unparseable gateway response: {e}"),
            )
        })
    }
}

/// Maps a gateway error body onto the upstream taxonomy so the response
/// layer can attach the right remediation hint.
fn classify_error(status: StatusCode, body: &str) -> AppError {
    let parsed: Option<MpErrorResponse> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_default();
    let causes = parsed
        .as_ref()
        .map(|e| {
            e.cause
                .iter()
                .filter_map(|c| c.description.clone())
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default();
    let haystack = format!("{message} {causes}").to_lowercase();

    let kind = if haystack.contains("without key enabled")
        || (haystack.contains("key") && haystack.contains("qr"))
    {
        UpstreamKind::PixKeyMissing
    } else if haystack.contains("policy") || haystack.contains("risk") {
        UpstreamKind::PolicyRejected
    } else {
        UpstreamKind::Other
    };

    AppError::upstream(kind, format!("{status}: {body}"))
}

// ============================================================================
// Port Implementation
// ============================================================================

#[async_trait]
impl PaymentGatewayPort for MercadoPagoClient {
    async fn create_payment(
        &self,
        request: &CreatePayment,
        idempotency_key: &str,
    ) -> AppResult<GatewayPayment> {
        let body = MpCreatePayment::from_request(request);
        let builder = self
            .client
            .post(format!("{}/v1/payments", self.base_url))
            .header("Authorization", self.auth_header())
            .header("X-Idempotency-Key", idempotency_key)
            .json(&body);

        let response = self.send_with_retry(builder).await?;
        let payment: MpPayment = self.handle_response(response).await?;
        Ok(payment.into_gateway_payment())
    }

    async fn get_payment(&self, id: &PaymentId) -> AppResult<GatewayPayment> {
        let builder = self
            .client
            .get(format!("{}/v1/payments/{}", self.base_url, id))
            .header("Authorization", self.auth_header());

        let response = self.send_with_retry(builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        let payment: MpPayment = self.handle_response(response).await?;
        Ok(payment.into_gateway_payment())
    }

    async fn search_by_external_reference(
        &self,
        external_reference: &str,
        limit: u32,
    ) -> AppResult<Vec<GatewayPayment>> {
        let limit_param = limit.to_string();
        let builder = self
            .client
            .get(format!("{}/v1/payments/search", self.base_url))
            .header("Authorization", self.auth_header())
            .query(&[
                ("external_reference", external_reference),
                ("sort", "date_created"),
                ("criteria", "desc"),
                ("limit", limit_param.as_str()),
            ]);

        let response = self.send_with_retry(builder).await?;
        let list: MpSearchResponse = self.handle_response(response).await?;
        Ok(list
            .results
            .into_iter()
            .map(MpPayment::into_gateway_payment)
            .collect())
    }

    async fn cancel_payment(&self, id: &PaymentId) -> AppResult<GatewayPayment> {
        let builder = self
            .client
            .put(format!("{}/v1/payments/{}", self.base_url, id))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "status": "cancelled" }));

        let response = self.send_with_retry(builder).await?;
        let payment: MpPayment = self.handle_response(response).await?;
        Ok(payment.into_gateway_payment())
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MpCreatePayment {
    transaction_amount: f64,
    description: String,
    payment_method_id: String,
    external_reference: String,
    payer: MpPayer,
    metadata: PaymentMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    installments: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct MpPayer {
    email: String,
    identification: MpIdentification,
}

#[derive(Debug, Serialize)]
struct MpIdentification {
    #[serde(rename = "type")]
    id_type: &'static str,
    number: String,
}

impl MpCreatePayment {
    fn from_request(request: &CreatePayment) -> Self {
        Self {
            transaction_amount: cents_to_amount(request.amount_cents),
            description: request.description.clone(),
            payment_method_id: request.method.gateway_method_id().to_string(),
            external_reference: request.external_reference.clone(),
            payer: MpPayer {
                email: request.payer_email.clone(),
                identification: MpIdentification {
                    id_type: "CPF",
                    number: request.payer_cpf.clone(),
                },
            },
            metadata: request.metadata.clone(),
            token: request.card_token.clone(),
            installments: match request.method {
                PaymentMethod::Card => Some(request.installments.max(1)),
                _ => None,
            },
            notification_url: request.notification_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MpPayment {
    id: i64,
    status: String,
    #[serde(default)]
    status_detail: Option<String>,
    #[serde(default)]
    external_reference: Option<String>,
    #[serde(default)]
    transaction_amount: Option<f64>,
    #[serde(default)]
    payment_method_id: Option<String>,
    #[serde(default)]
    metadata: PaymentMetadata,
    #[serde(default)]
    point_of_interaction: Option<MpPointOfInteraction>,
    #[serde(default)]
    transaction_details: Option<MpTransactionDetails>,
    #[serde(default)]
    barcode: Option<MpBarcode>,
    #[serde(default)]
    date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    date_of_expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct MpPointOfInteraction {
    #[serde(default)]
    transaction_data: Option<MpTransactionData>,
}

#[derive(Debug, Deserialize)]
struct MpTransactionData {
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default)]
    qr_code_base64: Option<String>,
    #[serde(default)]
    ticket_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpTransactionDetails {
    #[serde(default)]
    external_resource_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpBarcode {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpSearchResponse {
    #[serde(default)]
    results: Vec<MpPayment>,
}

#[derive(Debug, Deserialize)]
struct MpErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    cause: Vec<MpErrorCause>,
}

#[derive(Debug, Deserialize)]
struct MpErrorCause {
    #[serde(default)]
    description: Option<String>,
}

impl MpPayment {
    fn into_gateway_payment(self) -> GatewayPayment {
        let status: PaymentStatus = self.status.parse().unwrap_or(PaymentStatus::Other);

        let pix = self
            .point_of_interaction
            .and_then(|poi| poi.transaction_data)
            .map(|data| PixInfo {
                qr_code: data.qr_code,
                qr_code_base64: data.qr_code_base64,
                ticket_url: data.ticket_url,
            });

        let boleto_url = self
            .transaction_details
            .and_then(|d| d.external_resource_url);
        let barcode = self.barcode.and_then(|b| b.content);
        let boleto = if boleto_url.is_some() || barcode.is_some() {
            Some(BoletoInfo {
                barcode,
                ticket_url: boleto_url,
            })
        } else {
            None
        };

        GatewayPayment {
            id: PaymentId::new(self.id.to_string()),
            status,
            status_detail: self.status_detail,
            external_reference: self.external_reference,
            amount_cents: self.transaction_amount.map(amount_to_cents).unwrap_or(0),
            method_id: self.payment_method_id,
            metadata: self.metadata,
            pix,
            boleto,
            date_created: self.date_created,
            date_of_expiration: self.date_of_expiration,
        }
    }
}

/// The gateway speaks decimal currency units; everything internal is
/// integer cents.
fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
