use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::auth::DiscordUserRepo,
    domain::entities::payment::PaymentStatus,
};

/// Store for non-production payment-status overrides. Overrides expire on
/// their own; polling checks them before asking the gateway.
#[async_trait]
pub trait DevOverrideStoreTrait: Send + Sync {
    async fn set(&self, payment_id: &str, status: PaymentStatus, ttl_secs: u64) -> AppResult<()>;

    async fn get(&self, payment_id: &str) -> AppResult<Option<PaymentStatus>>;
}

const OVERRIDE_TTL_SECS: u64 = 3600;

pub struct DevUseCases {
    store: Arc<dyn DevOverrideStoreTrait>,
    users: Arc<dyn DiscordUserRepo>,
}

impl DevUseCases {
    pub fn new(store: Arc<dyn DevOverrideStoreTrait>, users: Arc<dyn DiscordUserRepo>) -> Self {
        Self { store, users }
    }

    /// Sets an override after checking the caller holds a `dev_permission`
    /// row. The production environment gate is enforced at the route.
    pub async fn set_override(
        &self,
        discord_id: &str,
        payment_id: &str,
        status: PaymentStatus,
    ) -> AppResult<()> {
        if !self.users.has_dev_permission(discord_id).await? {
            return Err(AppError::Forbidden);
        }
        tracing::info!(%discord_id, %payment_id, status = %status, "Dev status override set");
        self.store.set(payment_id, status, OVERRIDE_TTL_SECS).await
    }

    pub async fn get_override(&self, payment_id: &str) -> AppResult<Option<PaymentStatus>> {
        self.store.get(payment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::use_cases::auth::DiscordUserProfile,
        test_utils::{repo_mocks::InMemoryDiscordUserRepo, store_mocks::InMemoryDevOverrideStore},
    };

    fn profile(discord_id: &str) -> DiscordUserProfile {
        DiscordUserProfile {
            discord_id: discord_id.to_string(),
            username: "tester".into(),
            global_name: None,
            avatar: None,
            email: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_override_requires_dev_permission() {
        let users = Arc::new(InMemoryDiscordUserRepo::default());
        users.upsert(&profile("42")).await.unwrap();
        let uc = DevUseCases::new(Arc::new(InMemoryDevOverrideStore::default()), users);

        let err = uc
            .set_override("42", "pay-1", PaymentStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(uc.get_override("pay-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_override_round_trip_for_dev_user() {
        let users = Arc::new(InMemoryDiscordUserRepo::default());
        users.upsert(&profile("42")).await.unwrap();
        users.grant_dev("42");
        let uc = DevUseCases::new(Arc::new(InMemoryDevOverrideStore::default()), users);

        uc.set_override("42", "pay-1", PaymentStatus::Approved)
            .await
            .unwrap();
        assert_eq!(
            uc.get_override("pay-1").await.unwrap(),
            Some(PaymentStatus::Approved)
        );
    }
}
