use std::sync::Arc;

use crate::{
    application::use_cases::{
        auth::AuthUseCases, coupons::CouponUseCases, dev::DevUseCases, payments::PaymentUseCases,
        plans::PlanFeaturesRepoTrait,
    },
    infra::{
        config::AppConfig, discord::DiscordClient, rate_limit::RateLimiterTrait,
        session::SessionCodec,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub payments: Arc<PaymentUseCases>,
    pub coupons: Arc<CouponUseCases>,
    pub auth: Arc<AuthUseCases>,
    pub dev: Arc<DevUseCases>,
    pub plan_features: Arc<dyn PlanFeaturesRepoTrait>,
    pub sessions: SessionCodec,
    pub discord: Arc<DiscordClient>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
