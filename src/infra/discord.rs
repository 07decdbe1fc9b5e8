use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{
    app_error::{AppError, AppResult},
    infra::http_client,
};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";

/// Discord OAuth client: builds the authorize redirect, exchanges the
/// authorization code and fetches the profile. The hosted authorization
/// server does everything else.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscordTokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// The subset of `/users/@me` this service stores.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl DiscordClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client: http_client::build_client(),
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
        }
    }

    pub fn authorize_url(&self, state: &str) -> String {
        // url crate handles the query encoding.
        let mut auth_url = url::Url::parse(DISCORD_AUTHORIZE_URL).unwrap();
        auth_url
            .query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "identify email")
            .append_pair("state", state)
            .append_pair("prompt", "none");
        auth_url.to_string()
    }

    pub async fn exchange_code(&self, code: &str) -> AppResult<DiscordTokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/oauth2/token", DISCORD_API_BASE))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Discord token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read Discord response: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Discord token exchange failed");
            // Expired/reused codes are a client-side condition, not ours.
            if status.is_client_error() {
                return Err(AppError::InvalidInput(
                    "Authorization code expired or already used".into(),
                ));
            }
            return Err(AppError::Internal(format!(
                "Discord token endpoint returned {status}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Discord token response");
            AppError::Internal("Unparseable Discord token response".into())
        })
    }

    pub async fn fetch_profile(&self, access_token: &str) -> AppResult<DiscordProfile> {
        let response = self
            .client
            .get(format!("{}/users/@me", DISCORD_API_BASE))
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Discord profile request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read Discord response: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Discord profile fetch failed");
            return Err(AppError::Internal(format!(
                "Discord profile endpoint returned {status}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Discord profile");
            AppError::Internal("Unparseable Discord profile".into())
        })
    }
}
