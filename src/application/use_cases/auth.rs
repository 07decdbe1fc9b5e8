use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app_error::AppResult;

// ============================================================================
// Profile Types
// ============================================================================

/// A Discord account as stored in `discord_users`. Upserted on every OAuth
/// callback so the profile tracks Discord-side renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordUserProfile {
    pub discord_id: String,
    pub username: String,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Repo / Store Traits
// ============================================================================

#[async_trait]
pub trait DiscordUserRepo: Send + Sync {
    async fn upsert(&self, profile: &DiscordUserProfile) -> AppResult<DiscordUserProfile>;

    async fn get(&self, discord_id: &str) -> AppResult<Option<DiscordUserProfile>>;

    /// Whether this user has a `dev_permission` row, gating the
    /// non-production override endpoint.
    async fn has_dev_permission(&self, discord_id: &str) -> AppResult<bool>;
}

/// Single-use OAuth state nonces. `consume` must be atomic: two callbacks
/// racing on the same state may see at most one success.
#[async_trait]
pub trait OAuthStateStoreTrait: Send + Sync {
    async fn store_state(&self, state: &str, ttl_secs: u64) -> AppResult<()>;

    async fn consume_state(&self, state: &str) -> AppResult<bool>;
}

// ============================================================================
// Use Cases
// ============================================================================

pub struct AuthUseCases {
    users: Arc<dyn DiscordUserRepo>,
    states: Arc<dyn OAuthStateStoreTrait>,
    state_ttl_secs: u64,
}

impl AuthUseCases {
    pub fn new(
        users: Arc<dyn DiscordUserRepo>,
        states: Arc<dyn OAuthStateStoreTrait>,
        state_ttl_secs: u64,
    ) -> Self {
        Self {
            users,
            states,
            state_ttl_secs,
        }
    }

    /// Creates and stores the state nonce for one login attempt.
    pub async fn new_login_state(&self) -> AppResult<String> {
        let state = hex::encode(rand::random::<[u8; 16]>());
        self.states.store_state(&state, self.state_ttl_secs).await?;
        Ok(state)
    }

    /// Burns a state nonce from the OAuth callback. False means unknown,
    /// expired, or already used.
    pub async fn consume_login_state(&self, state: &str) -> AppResult<bool> {
        if state.is_empty() {
            return Ok(false);
        }
        self.states.consume_state(state).await
    }

    pub async fn upsert_user(&self, profile: &DiscordUserProfile) -> AppResult<DiscordUserProfile> {
        self.users.upsert(profile).await
    }

    pub async fn get_user(&self, discord_id: &str) -> AppResult<Option<DiscordUserProfile>> {
        self.users.get(discord_id).await
    }

    pub async fn is_dev(&self, discord_id: &str) -> AppResult<bool> {
        self.users.has_dev_permission(discord_id).await
    }
}
