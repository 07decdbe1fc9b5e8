//! In-memory doubles for the Redis-backed stores. TTLs are ignored: tests
//! control expiry by clearing entries explicitly.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    application::use_cases::{
        auth::OAuthStateStoreTrait,
        dev::DevOverrideStoreTrait,
        payments::{IntentStoreTrait, StoredIntent},
    },
    domain::entities::{
        order::OrderRef,
        payment::{PaymentMethod, PaymentStatus},
    },
    infra::rate_limit::RateLimiterTrait,
};

#[derive(Default)]
pub struct InMemoryIntentStore {
    map: Mutex<HashMap<String, StoredIntent>>,
}

impl InMemoryIntentStore {
    fn key(order: &OrderRef, method: PaymentMethod) -> String {
        format!("{}:{}:{}", order.order_id, order.revision, method)
    }
}

#[async_trait]
impl IntentStoreTrait for InMemoryIntentStore {
    async fn get(&self, order: &OrderRef, method: PaymentMethod) -> AppResult<Option<StoredIntent>> {
        Ok(self.map.lock().unwrap().get(&Self::key(order, method)).cloned())
    }

    async fn put(
        &self,
        order: &OrderRef,
        method: PaymentMethod,
        intent: &StoredIntent,
        _ttl_secs: u64,
    ) -> AppResult<()> {
        self.map
            .lock()
            .unwrap()
            .insert(Self::key(order, method), intent.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOAuthStateStore {
    states: Mutex<HashSet<String>>,
}

#[async_trait]
impl OAuthStateStoreTrait for InMemoryOAuthStateStore {
    async fn store_state(&self, state: &str, _ttl_secs: u64) -> AppResult<()> {
        self.states.lock().unwrap().insert(state.to_string());
        Ok(())
    }

    async fn consume_state(&self, state: &str) -> AppResult<bool> {
        Ok(self.states.lock().unwrap().remove(state))
    }
}

#[derive(Default)]
pub struct InMemoryDevOverrideStore {
    map: Mutex<HashMap<String, PaymentStatus>>,
}

#[async_trait]
impl DevOverrideStoreTrait for InMemoryDevOverrideStore {
    async fn set(&self, payment_id: &str, status: PaymentStatus, _ttl_secs: u64) -> AppResult<()> {
        self.map
            .lock()
            .unwrap()
            .insert(payment_id.to_string(), status);
        Ok(())
    }

    async fn get(&self, payment_id: &str) -> AppResult<Option<PaymentStatus>> {
        Ok(self.map.lock().unwrap().get(payment_id).copied())
    }
}

/// Rate limiter that always allows; route tests are not about limits.
#[derive(Default)]
pub struct InMemoryRateLimiter;

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, _ip: &str, _discord_id: Option<&str>) -> AppResult<()> {
        Ok(())
    }
}
