//! In-memory repo doubles for the database-backed traits.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    application::use_cases::{
        auth::{DiscordUserProfile, DiscordUserRepo},
        coupons::CouponRepoTrait,
        plans::PlanFeaturesRepoTrait,
    },
    domain::entities::{coupon::CouponRule, plan::PlanCode},
};

// ============================================================================
// Coupons
// ============================================================================

#[derive(Default)]
pub struct InMemoryCouponRepo {
    general: Mutex<Vec<CouponRule>>,
    gifts: Mutex<Vec<CouponRule>>,
    /// code -> times claimed, shared with tests for assertions.
    claims: Arc<Mutex<HashMap<String, u32>>>,
}

impl InMemoryCouponRepo {
    pub fn add_general(&self, rule: CouponRule) {
        self.general.lock().unwrap().push(rule);
    }

    pub fn add_gift(&self, rule: CouponRule) {
        self.gifts.lock().unwrap().push(rule);
    }

    pub fn claim_counts(&self) -> Arc<Mutex<HashMap<String, u32>>> {
        self.claims.clone()
    }

    fn find_in(rules: &[CouponRule], code: &str) -> Option<CouponRule> {
        rules
            .iter()
            .find(|r| r.code.to_lowercase() == code)
            .cloned()
    }

    fn claim_in(&self, rules: &mut [CouponRule], code: &str) -> bool {
        let Some(rule) = rules
            .iter_mut()
            .find(|r| r.code.to_lowercase() == code.to_lowercase())
        else {
            return false;
        };
        match rule.remaining_uses {
            Some(remaining) if remaining <= 0 => false,
            remaining => {
                rule.remaining_uses = remaining.map(|r| r - 1);
                *self
                    .claims
                    .lock()
                    .unwrap()
                    .entry(rule.code.clone())
                    .or_insert(0) += 1;
                true
            }
        }
    }
}

#[async_trait]
impl CouponRepoTrait for InMemoryCouponRepo {
    async fn find_general(&self, code: &str) -> AppResult<Option<CouponRule>> {
        Ok(Self::find_in(&self.general.lock().unwrap(), code))
    }

    async fn find_gift(&self, code: &str) -> AppResult<Option<CouponRule>> {
        Ok(Self::find_in(&self.gifts.lock().unwrap(), code))
    }

    async fn claim_general(&self, code: &str) -> AppResult<bool> {
        let mut general = self.general.lock().unwrap();
        let claimed = self.claim_in(&mut general, code);
        Ok(claimed)
    }

    async fn claim_gift(&self, code: &str, discord_id: &str) -> AppResult<bool> {
        let mut gifts = self.gifts.lock().unwrap();
        let owned = gifts.iter().any(|r| {
            r.code.to_lowercase() == code.to_lowercase()
                && r.owner_discord_id.as_deref() == Some(discord_id)
        });
        if !owned {
            return Ok(false);
        }
        let claimed = self.claim_in(&mut gifts, code);
        Ok(claimed)
    }
}

// ============================================================================
// Discord Users
// ============================================================================

#[derive(Default)]
pub struct InMemoryDiscordUserRepo {
    users: Mutex<HashMap<String, DiscordUserProfile>>,
    devs: Mutex<HashSet<String>>,
}

impl InMemoryDiscordUserRepo {
    pub fn grant_dev(&self, discord_id: &str) {
        self.devs.lock().unwrap().insert(discord_id.to_string());
    }
}

#[async_trait]
impl DiscordUserRepo for InMemoryDiscordUserRepo {
    async fn upsert(&self, profile: &DiscordUserProfile) -> AppResult<DiscordUserProfile> {
        let now = chrono::Utc::now();
        let mut users = self.users.lock().unwrap();
        let stored = users
            .entry(profile.discord_id.clone())
            .and_modify(|existing| {
                existing.username = profile.username.clone();
                existing.global_name = profile.global_name.clone();
                existing.avatar = profile.avatar.clone();
                if profile.email.is_some() {
                    existing.email = profile.email.clone();
                }
                existing.updated_at = Some(now);
            })
            .or_insert_with(|| DiscordUserProfile {
                created_at: Some(now),
                updated_at: Some(now),
                ..profile.clone()
            });
        Ok(stored.clone())
    }

    async fn get(&self, discord_id: &str) -> AppResult<Option<DiscordUserProfile>> {
        Ok(self.users.lock().unwrap().get(discord_id).cloned())
    }

    async fn has_dev_permission(&self, discord_id: &str) -> AppResult<bool> {
        Ok(self.devs.lock().unwrap().contains(discord_id))
    }
}

// ============================================================================
// Plan Features
// ============================================================================

#[derive(Default)]
pub struct InMemoryPlanFeaturesRepo {
    features: Mutex<HashMap<PlanCode, Vec<String>>>,
}

impl InMemoryPlanFeaturesRepo {
    pub fn set(&self, plan: PlanCode, features: Vec<String>) {
        self.features.lock().unwrap().insert(plan, features);
    }
}

#[async_trait]
impl PlanFeaturesRepoTrait for InMemoryPlanFeaturesRepo {
    async fn features_for(&self, plan: PlanCode) -> AppResult<Vec<String>> {
        Ok(self
            .features
            .lock()
            .unwrap()
            .get(&plan)
            .cloned()
            .unwrap_or_default())
    }
}
