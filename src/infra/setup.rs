use std::fs::File;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::use_cases::{
        auth::{AuthUseCases, DiscordUserRepo, OAuthStateStoreTrait},
        coupons::{CouponRepoTrait, CouponUseCases},
        dev::{DevOverrideStoreTrait, DevUseCases},
        payments::{IntentStoreTrait, PaymentUseCases},
        plans::PlanFeaturesRepoTrait,
    },
    infra::{
        config::AppConfig,
        db::init_db,
        discord::DiscordClient,
        error::InfraError,
        intent_store::{RedisDevOverrideStore, RedisIntentStore},
        mercado_pago::MercadoPagoClient,
        oauth_state::RedisOAuthStateStore,
        rate_limit::{RedisRateLimiter, RateLimiterTrait},
        session::SessionCodec,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url).await?;
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let redis_client = redis::Client::open(config.redis_url.as_str())
        .map_err(InfraError::RedisConnection)?;
    let redis_manager = ConnectionManager::new(redis_client)
        .await
        .map_err(InfraError::RedisConnection)?;

    let rate_limiter: Arc<dyn RateLimiterTrait> = Arc::new(RedisRateLimiter::new(
        redis_manager.clone(),
        config.rate_limit_window_secs,
        config.rate_limit_per_ip,
        config.rate_limit_per_user,
    ));

    let coupon_repo = postgres_arc.clone() as Arc<dyn CouponRepoTrait>;
    let user_repo = postgres_arc.clone() as Arc<dyn DiscordUserRepo>;
    let plan_features = postgres_arc.clone() as Arc<dyn PlanFeaturesRepoTrait>;

    let gateway = Arc::new(MercadoPagoClient::new(
        config.mp_base_url.clone(),
        config.mp_access_token.clone(),
    ));
    let intents: Arc<dyn IntentStoreTrait> =
        Arc::new(RedisIntentStore::new(redis_manager.clone()));
    let oauth_states: Arc<dyn OAuthStateStoreTrait> =
        Arc::new(RedisOAuthStateStore::new(redis_manager.clone()));
    let dev_overrides: Arc<dyn DevOverrideStoreTrait> =
        Arc::new(RedisDevOverrideStore::new(redis_manager));

    let coupons = Arc::new(CouponUseCases::new(
        config.static_coupons.clone(),
        coupon_repo,
    ));

    let payments = Arc::new(PaymentUseCases::new(
        gateway,
        intents,
        coupons.clone(),
        config.minimum_amounts,
        config.intent_ttl_secs,
        config.payment_search_limit,
        config.mp_notification_url.clone(),
    ));

    let auth = Arc::new(AuthUseCases::new(
        user_repo.clone(),
        oauth_states,
        config.oauth_state_ttl_secs,
    ));

    let dev = Arc::new(DevUseCases::new(dev_overrides, user_repo));

    let discord = Arc::new(DiscordClient::new(
        config.discord_client_id.clone(),
        config.discord_client_secret.clone(),
        config.discord_redirect_uri.clone(),
    ));

    let sessions = SessionCodec::new(&config.session_secret);

    Ok(AppState {
        config: Arc::new(config),
        payments,
        coupons,
        auth,
        dev,
        plan_features,
        sessions,
        discord,
        rate_limiter,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "checkout_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
