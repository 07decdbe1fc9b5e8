use super::common::*;

#[derive(Serialize)]
struct MeResponse {
    ok: bool,
    discord_id: String,
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    global_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    dev: bool,
}

/// GET /api/me
/// Returns the logged-in user's stored Discord profile. Invalid cookie
/// pairs (bad signature, malformed, expired) are cleared here rather than
/// left to rot in the browser; same for sessions whose user row vanished.
async fn me(State(app_state): State<AppState>, cookies: CookieJar) -> AppResult<Response> {
    let Some(session) = session_from_cookies(&app_state, &cookies) else {
        let mut headers = HeaderMap::new();
        if cookies.get(SESSION_COOKIE).is_some() || cookies.get(SESSION_SIG_COOKIE).is_some() {
            clear_session_cookies(&mut headers)?;
        }
        return Ok((StatusCode::UNAUTHORIZED, headers).into_response());
    };

    let Some(user) = app_state.auth.get_user(&session.discord_id).await? else {
        let mut headers = HeaderMap::new();
        clear_session_cookies(&mut headers)?;
        return Ok((StatusCode::UNAUTHORIZED, headers).into_response());
    };

    let dev = app_state.auth.is_dev(&user.discord_id).await.unwrap_or(false);

    Ok(Json(MeResponse {
        ok: true,
        discord_id: user.discord_id,
        username: user.username,
        global_name: user.global_name,
        avatar: user.avatar,
        email: user.email,
        dev,
    })
    .into_response())
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
