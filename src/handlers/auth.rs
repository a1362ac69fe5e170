use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StudyError;
use crate::handlers::Success;
use crate::middleware::SessionClaims;
use crate::middleware::auth::{end_session, is_account, read_session, start_session};
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub logged_in: bool,
    pub username: Option<String>,
}

/// GET /api/auth/status
pub async fn status(State(state): State<AppState>, jar: PrivateCookieJar) -> Json<AuthStatus> {
    let username = read_session(&jar, Utc::now().timestamp())
        .map(|claims| claims.username)
        .filter(|name| is_account(name, &state.account));
    Json(AuthStatus {
        logged_in: username.is_some(),
        username,
    })
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, StudyError> {
    if !is_account(&body.username, &state.account) {
        warn!("login attempt with unknown username");
        return Err(StudyError::Unauthorized);
    }

    let claims = SessionClaims::issue(body.username);
    let jar = start_session(jar, &claims, !state.insecure_cookie)?;
    info!(username = %claims.username, "session started");
    Ok((jar, Json(Success::OK)))
}

/// POST /api/auth/logout
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    (end_session(jar), Json(Success::OK))
}
