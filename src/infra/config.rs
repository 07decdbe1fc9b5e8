use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::{
    application::use_cases::pricing::MinimumAmounts,
    domain::entities::{
        coupon::{CouponRule, CouponSource, DiscountKind},
        plan::{BillingCycle, PlanCode},
    },
};

/// Shape of one entry in the STATIC_COUPONS env JSON array.
#[derive(Debug, Deserialize)]
pub struct StaticCouponConfig {
    pub code: String,
    pub kind: String,
    pub value_cents: i64,
    #[serde(default)]
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub plan: Option<PlanCode>,
    #[serde(default)]
    pub billing: Option<BillingCycle>,
    #[serde(default)]
    pub min_order_cents: Option<i64>,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub redis_url: String,
    /// Frontend origin: OAuth completion redirects land here.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    /// "development" | "staging" | "production". Gates the dev override
    /// endpoint.
    pub environment: String,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy.
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,

    // Payment gateway
    pub mp_access_token: SecretString,
    pub mp_base_url: String,
    /// Webhook URL passed to the gateway on create; notifications are not
    /// processed by this service.
    pub mp_notification_url: Option<String>,
    pub payment_search_limit: u32,
    pub intent_ttl_secs: u64,
    pub minimum_amounts: MinimumAmounts,

    // Discord OAuth
    pub discord_client_id: String,
    pub discord_client_secret: SecretString,
    pub discord_redirect_uri: String,
    pub oauth_state_ttl_secs: u64,

    // Sessions
    pub session_secret: SecretString,
    pub session_ttl: time::Duration,

    // Rate limiting
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub rate_limit_per_user: u64,

    pub static_coupons: Vec<CouponRule>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let environment: String = get_env_default("ENVIRONMENT", "development".to_string());
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let mp_access_token: SecretString =
            SecretString::new(get_env::<String>("MP_ACCESS_TOKEN").into());
        let mp_base_url: String =
            get_env_default("MP_BASE_URL", "https://api.mercadopago.com".to_string());
        let mp_notification_url: Option<String> = std::env::var("MP_NOTIFICATION_URL").ok();
        let payment_search_limit: u32 = get_env_default("PAYMENT_SEARCH_LIMIT", 30);
        let intent_ttl_secs: u64 = get_env_default("INTENT_TTL_SECS", 120);
        let minimum_amounts = MinimumAmounts {
            pix_cents: get_env_default("MIN_PIX_CENTS", 100),
            boleto_cents: get_env_default("MIN_BOLETO_CENTS", 300),
            card_cents: get_env_default("MIN_CARD_CENTS", 100),
        };

        let discord_client_id: String = get_env("DISCORD_CLIENT_ID");
        let discord_client_secret: SecretString =
            SecretString::new(get_env::<String>("DISCORD_CLIENT_SECRET").into());
        let discord_redirect_uri: String = get_env("DISCORD_REDIRECT_URI");
        let oauth_state_ttl_secs: u64 = get_env_default("OAUTH_STATE_TTL_SECS", 600);

        let session_secret: SecretString =
            SecretString::new(get_env::<String>("SESSION_SECRET").into());
        let session_ttl_days: i64 = get_env_default("SESSION_TTL_DAYS", 7);

        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 60);
        let rate_limit_per_user: u64 = get_env_default("RATE_LIMIT_PER_USER", 30);

        let static_coupons = parse_static_coupons(
            &get_env_default("STATIC_COUPONS", String::from("[]")),
        );

        Self {
            bind_addr,
            database_url,
            redis_url,
            app_origin,
            cors_origin,
            environment,
            trust_proxy,
            mp_access_token,
            mp_base_url,
            mp_notification_url,
            payment_search_limit,
            intent_ttl_secs,
            minimum_amounts,
            discord_client_id,
            discord_client_secret,
            discord_redirect_uri,
            oauth_state_ttl_secs,
            session_secret,
            session_ttl: time::Duration::days(session_ttl_days),
            rate_limit_window_secs,
            rate_limit_per_ip,
            rate_limit_per_user,
            static_coupons,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_static_coupons(raw: &str) -> Vec<CouponRule> {
    let configs: Vec<StaticCouponConfig> = match serde_json::from_str(raw) {
        Ok(configs) => configs,
        Err(err) => {
            // A typo here must not take the checkout down.
            tracing::error!(error = %err, "STATIC_COUPONS is not valid JSON, ignoring");
            return Vec::new();
        }
    };

    configs
        .into_iter()
        .filter_map(|c| {
            let discount = match DiscountKind::from_parts(&c.kind, c.value_cents) {
                Ok(discount) => discount,
                Err(err) => {
                    tracing::error!(code = %c.code, error = %err, "Skipping static coupon");
                    return None;
                }
            };
            Some(CouponRule {
                code: c.code,
                source: CouponSource::Static,
                discount,
                starts_at: c.starts_at,
                ends_at: c.ends_at,
                plan: c.plan,
                billing: c.billing,
                min_order_cents: c.min_order_cents,
                remaining_uses: None,
                owner_discord_id: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_static_coupons() {
        let rules = parse_static_coupons(
            r#"[
                {"code": "LAUNCH50", "kind": "percent", "value_cents": 50},
                {"code": "PIX1", "kind": "target_total", "value_cents": 1, "plan": "pro"},
                {"code": "BROKEN", "kind": "nope", "value_cents": 1}
            ]"#,
        );
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].code, "LAUNCH50");
        assert_eq!(rules[0].discount, DiscountKind::Percent(50));
        assert_eq!(rules[1].plan, Some(PlanCode::Pro));
        assert!(rules.iter().all(|r| r.source == CouponSource::Static));
    }

    #[test]
    fn test_invalid_json_yields_no_coupons() {
        assert!(parse_static_coupons("{not json").is_empty());
    }
}
