use async_trait::async_trait;

use crate::{app_error::AppResult, domain::entities::plan::PlanCode};

/// Read-only catalogue of the feature strings shown for each plan,
/// backed by the `plan_features` table.
#[async_trait]
pub trait PlanFeaturesRepoTrait: Send + Sync {
    async fn features_for(&self, plan: PlanCode) -> AppResult<Vec<String>>;
}
