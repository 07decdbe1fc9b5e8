use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        dev::DevOverrideStoreTrait,
        payments::{IntentStoreTrait, StoredIntent},
    },
    domain::entities::{order::OrderRef, payment::{PaymentMethod, PaymentStatus}},
};

/// Redis-backed dedup store for recent payment intents. TTL eviction is
/// native to the store, so state survives restarts and is shared across
/// instances.
#[derive(Clone)]
pub struct RedisIntentStore {
    manager: ConnectionManager,
}

impl RedisIntentStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn key(order: &OrderRef, method: PaymentMethod) -> String {
        format!("intent:{}:{}:{}", order.order_id, order.revision, method)
    }
}

#[async_trait]
impl IntentStoreTrait for RedisIntentStore {
    async fn get(&self, order: &OrderRef, method: PaymentMethod) -> AppResult<Option<StoredIntent>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn
            .get(Self::key(order, method))
            .await
            .map_err(|e| AppError::Internal(format!("Intent store read failed: {e}")))?;

        match raw {
            Some(json) => match serde_json::from_str(&json) {
                Ok(intent) => Ok(Some(intent)),
                Err(err) => {
                    tracing::warn!(error = %err, "Dropping unreadable stored intent");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        order: &OrderRef,
        method: PaymentMethod,
        intent: &StoredIntent,
        ttl_secs: u64,
    ) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let json = serde_json::to_string(intent)
            .map_err(|e| AppError::Internal(format!("Failed to serialize intent: {e}")))?;

        let _: () = conn
            .set_ex(Self::key(order, method), json, ttl_secs.max(1))
            .await
            .map_err(|e| AppError::Internal(format!("Intent store write failed: {e}")))?;

        Ok(())
    }
}

/// Redis-backed store for non-production payment-status overrides.
#[derive(Clone)]
pub struct RedisDevOverrideStore {
    manager: ConnectionManager,
}

impl RedisDevOverrideStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn key(payment_id: &str) -> String {
        format!("dev_override:{payment_id}")
    }
}

#[async_trait]
impl DevOverrideStoreTrait for RedisDevOverrideStore {
    async fn set(&self, payment_id: &str, status: PaymentStatus, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .set_ex(Self::key(payment_id), status.as_str(), ttl_secs.max(1))
            .await
            .map_err(|e| AppError::Internal(format!("Override write failed: {e}")))?;
        Ok(())
    }

    async fn get(&self, payment_id: &str) -> AppResult<Option<PaymentStatus>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn
            .get(Self::key(payment_id))
            .await
            .map_err(|e| AppError::Internal(format!("Override read failed: {e}")))?;

        Ok(raw.and_then(|s| s.parse().ok()))
    }
}
