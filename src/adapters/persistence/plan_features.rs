use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::plans::PlanFeaturesRepoTrait,
    domain::entities::plan::PlanCode,
};

#[async_trait]
impl PlanFeaturesRepoTrait for PostgresPersistence {
    async fn features_for(&self, plan: PlanCode) -> AppResult<Vec<String>> {
        let features: Vec<String> = sqlx::query_scalar(
            "SELECT feature FROM plan_features WHERE plan = $1 ORDER BY display_order, feature",
        )
        .bind(plan.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(features)
    }
}
