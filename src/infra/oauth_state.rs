use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::auth::OAuthStateStoreTrait,
};

#[derive(Clone)]
pub struct RedisOAuthStateStore {
    manager: ConnectionManager,
}

impl RedisOAuthStateStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn key(state: &str) -> String {
        format!("oauth_state:{state}")
    }
}

#[async_trait]
impl OAuthStateStoreTrait for RedisOAuthStateStore {
    async fn store_state(&self, state: &str, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .set_ex(Self::key(state), "1", ttl_secs.max(1))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store OAuth state: {e}")))?;
        Ok(())
    }

    async fn consume_state(&self, state: &str) -> AppResult<bool> {
        let mut conn = self.manager.clone();

        // Atomic GET + DELETE: two parallel callbacks racing on the same
        // state must not both succeed.
        let script = redis::Script::new(
            r#"
            local value = redis.call('GET', KEYS[1])
            if value then
                redis.call('DEL', KEYS[1])
            end
            return value
            "#,
        );

        let raw: Option<String> = script
            .key(Self::key(state))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to consume OAuth state: {e}")))?;

        Ok(raw.is_some())
    }
}
