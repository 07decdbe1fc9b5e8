//! Test app state builder for HTTP-level testing: a full `AppState`
//! wired onto in-memory mocks.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        auth::AuthUseCases, coupons::CouponUseCases, dev::DevUseCases, payments::PaymentUseCases,
        pricing::MinimumAmounts,
    },
    domain::entities::coupon::CouponRule,
    infra::{config::AppConfig, discord::DiscordClient, session::SessionCodec},
    test_utils::{
        gateway_mock::MockGateway,
        repo_mocks::{InMemoryCouponRepo, InMemoryDiscordUserRepo, InMemoryPlanFeaturesRepo},
        store_mocks::{
            InMemoryDevOverrideStore, InMemoryIntentStore, InMemoryOAuthStateStore,
            InMemoryRateLimiter,
        },
    },
};

/// Handles to the mocks behind a built test state, for assertions.
pub struct TestHandles {
    pub gateway: Arc<MockGateway>,
    pub coupon_repo: Arc<InMemoryCouponRepo>,
    pub user_repo: Arc<InMemoryDiscordUserRepo>,
    pub plan_features: Arc<InMemoryPlanFeaturesRepo>,
    pub sessions: SessionCodec,
}

pub struct TestAppStateBuilder {
    static_coupons: Vec<CouponRule>,
    environment: String,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            static_coupons: vec![],
            environment: "test".to_string(),
        }
    }

    pub fn with_static_coupon(mut self, rule: CouponRule) -> Self {
        self.static_coupons.push(rule);
        self
    }

    pub fn with_environment(mut self, environment: &str) -> Self {
        self.environment = environment.to_string();
        self
    }

    pub fn build(self) -> (AppState, TestHandles) {
        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            database_url: String::new(),
            redis_url: String::new(),
            app_origin: Url::parse("http://localhost:3000").unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            environment: self.environment,
            trust_proxy: false,
            mp_access_token: SecretString::new("test_mp_token".into()),
            mp_base_url: "http://gateway.test".to_string(),
            mp_notification_url: None,
            payment_search_limit: 30,
            intent_ttl_secs: 120,
            minimum_amounts: MinimumAmounts::default(),
            discord_client_id: "test_client_id".to_string(),
            discord_client_secret: SecretString::new("test_client_secret".into()),
            discord_redirect_uri: "http://localhost:3001/api/auth/discord/callback".to_string(),
            oauth_state_ttl_secs: 600,
            session_secret: SecretString::new("test_session_secret".into()),
            session_ttl: time::Duration::days(7),
            rate_limit_window_secs: 60,
            rate_limit_per_ip: 60,
            rate_limit_per_user: 30,
            static_coupons: self.static_coupons.clone(),
        });

        let gateway = Arc::new(MockGateway::default());
        let coupon_repo = Arc::new(InMemoryCouponRepo::default());
        let user_repo = Arc::new(InMemoryDiscordUserRepo::default());
        let plan_features = Arc::new(InMemoryPlanFeaturesRepo::default());

        let coupons = Arc::new(CouponUseCases::new(
            self.static_coupons,
            coupon_repo.clone(),
        ));
        let payments = Arc::new(PaymentUseCases::new(
            gateway.clone(),
            Arc::new(InMemoryIntentStore::default()),
            coupons.clone(),
            config.minimum_amounts,
            config.intent_ttl_secs,
            config.payment_search_limit,
            None,
        ));
        let auth = Arc::new(AuthUseCases::new(
            user_repo.clone(),
            Arc::new(InMemoryOAuthStateStore::default()),
            config.oauth_state_ttl_secs,
        ));
        let dev = Arc::new(DevUseCases::new(
            Arc::new(InMemoryDevOverrideStore::default()),
            user_repo.clone(),
        ));
        let discord = Arc::new(DiscordClient::new(
            config.discord_client_id.clone(),
            config.discord_client_secret.clone(),
            config.discord_redirect_uri.clone(),
        ));
        let sessions = SessionCodec::new(&config.session_secret);

        let state = AppState {
            config,
            payments,
            coupons,
            auth,
            dev,
            plan_features: plan_features.clone(),
            sessions: sessions.clone(),
            discord,
            rate_limiter: Arc::new(InMemoryRateLimiter),
        };

        (
            state,
            TestHandles {
                gateway,
                coupon_repo,
                user_repo,
                plan_features,
                sessions,
            },
        )
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
