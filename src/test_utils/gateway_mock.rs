//! In-memory payment gateway for tests. Mirrors the real gateway's
//! observable behavior: idempotency-key replay, search by
//! external_reference (most recent first), and state-checked cancel.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult, UpstreamKind},
    application::ports::payment_gateway::{
        CreatePayment, GatewayPayment, PaymentGatewayPort, PaymentId, PixInfo,
    },
    domain::entities::payment::{PaymentMethod, PaymentStatus},
};

#[derive(Default)]
pub struct MockGateway {
    payments: Mutex<Vec<GatewayPayment>>,
    /// idempotency key -> payment id, like the real gateway's replay cache.
    idempotency: Mutex<HashMap<String, String>>,
    create_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl MockGateway {
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn set_status(&self, payment_id: &str, status: PaymentStatus) {
        let mut payments = self.payments.lock().unwrap();
        if let Some(payment) = payments.iter_mut().find(|p| p.id.as_str() == payment_id) {
            payment.status = status;
        }
    }

    pub fn status_of(&self, payment_id: &str) -> Option<PaymentStatus> {
        let payments = self.payments.lock().unwrap();
        payments
            .iter()
            .find(|p| p.id.as_str() == payment_id)
            .map(|p| p.status)
    }

}

#[async_trait]
impl PaymentGatewayPort for MockGateway {
    async fn create_payment(
        &self,
        request: &CreatePayment,
        idempotency_key: &str,
    ) -> AppResult<GatewayPayment> {
        {
            // Replay only while the original is still live, modelling the
            // gateway's bounded idempotency window.
            let idempotency = self.idempotency.lock().unwrap();
            if let Some(existing_id) = idempotency.get(idempotency_key) {
                let payments = self.payments.lock().unwrap();
                if let Some(payment) = payments
                    .iter()
                    .find(|p| p.id.as_str() == existing_id && !p.status.is_terminal())
                {
                    return Ok(payment.clone());
                }
            }
        }

        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut payments = self.payments.lock().unwrap();
        let id = format!("mock-{}", payments.len() + 1);

        let pix = match request.method {
            PaymentMethod::Pix => Some(PixInfo {
                qr_code: Some("00020126mockqr".into()),
                qr_code_base64: Some("bW9ja3Fy".into()),
                ticket_url: None,
            }),
            _ => None,
        };

        let payment = GatewayPayment {
            id: PaymentId::new(&id),
            status: PaymentStatus::Pending,
            status_detail: None,
            external_reference: Some(request.external_reference.clone()),
            amount_cents: request.amount_cents,
            method_id: Some(request.method.gateway_method_id().to_string()),
            metadata: request.metadata.clone(),
            pix,
            boleto: None,
            date_created: Some(chrono::Utc::now()),
            date_of_expiration: None,
        };

        payments.push(payment.clone());
        drop(payments);
        self.idempotency
            .lock()
            .unwrap()
            .insert(idempotency_key.to_string(), id);
        Ok(payment)
    }

    async fn get_payment(&self, id: &PaymentId) -> AppResult<GatewayPayment> {
        let payments = self.payments.lock().unwrap();
        payments
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn search_by_external_reference(
        &self,
        external_reference: &str,
        limit: u32,
    ) -> AppResult<Vec<GatewayPayment>> {
        let payments = self.payments.lock().unwrap();
        Ok(payments
            .iter()
            .rev() // most recent first
            .filter(|p| p.external_reference.as_deref() == Some(external_reference))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn cancel_payment(&self, id: &PaymentId) -> AppResult<GatewayPayment> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let mut payments = self.payments.lock().unwrap();
        let payment = payments
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or(AppError::NotFound)?;

        if !payment.status.is_cancellable() {
            return Err(AppError::upstream(
                UpstreamKind::Other,
                format!("payment {} is {}", id, payment.status),
            ));
        }
        payment.status = PaymentStatus::Cancelled;
        Ok(payment.clone())
    }
}
