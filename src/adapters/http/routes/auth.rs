//! Discord OAuth routes. The flow delegates entirely to Discord's hosted
//! authorization server; this side only keeps the state nonce and turns
//! the callback into a signed session cookie pair.

use super::common::*;
use crate::application::use_cases::auth::DiscordUserProfile;

/// GET /api/auth/discord
/// Stores a single-use state nonce and redirects to Discord's authorize
/// page.
async fn discord_start(State(app_state): State<AppState>) -> AppResult<Response> {
    let state = app_state.auth.new_login_state().await?;
    let url = app_state.discord.authorize_url(&state);
    Ok(Redirect::temporary(&url).into_response())
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    /// Discord sends `error=access_denied` when the user bails out.
    #[serde(default)]
    error: Option<String>,
}

/// GET /api/auth/discord/callback
/// Exchanges the authorization code, upserts the Discord profile and sets
/// the session cookie pair. All failures land back on the app origin with
/// a login marker; a browser redirect flow has no JSON consumer.
async fn discord_callback(
    State(app_state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Response> {
    let fail = |reason: &str| -> Response {
        tracing::warn!(reason, "Discord login failed");
        let mut url = app_state.config.app_origin.clone();
        url.query_pairs_mut().append_pair("login", "error");
        Redirect::temporary(url.as_str()).into_response()
    };

    if query.error.is_some() {
        return Ok(fail("user denied authorization"));
    }
    let (Some(code), Some(state)) = (query.code.as_deref(), query.state.as_deref()) else {
        return Ok(fail("missing code or state"));
    };

    // Single-use: a replayed or expired state never reaches Discord.
    if !app_state.auth.consume_login_state(state).await? {
        return Ok(fail("invalid or expired state"));
    }

    let token = match app_state.discord.exchange_code(code).await {
        Ok(token) => token,
        Err(err) => {
            tracing::error!(error = ?err, "Discord code exchange failed");
            return Ok(fail("code exchange failed"));
        }
    };
    let profile = match app_state.discord.fetch_profile(&token.access_token).await {
        Ok(profile) => profile,
        Err(err) => {
            tracing::error!(error = ?err, "Discord profile fetch failed");
            return Ok(fail("profile fetch failed"));
        }
    };

    let user = app_state
        .auth
        .upsert_user(&DiscordUserProfile {
            discord_id: profile.id.clone(),
            username: profile.username.clone(),
            global_name: profile.global_name.clone(),
            avatar: profile.avatar.clone(),
            email: profile.email.clone(),
            created_at: None,
            updated_at: None,
        })
        .await?;

    tracing::info!(discord_id = %user.discord_id, "Discord login completed");

    let (value, sig) = app_state
        .sessions
        .encode(&user.discord_id, app_state.config.session_ttl);

    let mut headers = HeaderMap::new();
    set_session_cookies(&mut headers, value, sig, app_state.config.session_ttl)?;

    let mut url = app_state.config.app_origin.clone();
    url.query_pairs_mut().append_pair("login", "ok");
    Ok((headers, Redirect::temporary(url.as_str())).into_response())
}

/// GET /api/auth/logout
/// Clears the session cookie pair.
async fn logout() -> AppResult<Response> {
    let mut headers = HeaderMap::new();
    clear_session_cookies(&mut headers)?;
    Ok((headers, Json(serde_json::json!({ "ok": true }))).into_response())
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/discord", get(discord_start))
        .route("/discord/callback", get(discord_callback))
        .route("/logout", get(logout))
}
