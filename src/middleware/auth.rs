//! Single-account session gate.
//!
//! The session lives in an encrypted private cookie holding the username and
//! the issue time. Only one username is ever accepted and no password is
//! checked; the gate keeps casual visitors from editing, nothing more.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use time::Duration;
use tracing::warn;

use crate::error::StudyError;
use crate::router::AppState;

pub const SESSION_COOKIE: &str = "study_session";
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    /// Unix seconds
    pub issued_at: i64,
}

impl SessionClaims {
    pub fn issue(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            issued_at: Utc::now().timestamp(),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.issued_at) >= SESSION_TTL_SECS
    }
}

pub fn is_account(candidate: &str, account: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(account.as_bytes()))
}

/// Current unexpired session, if the cookie decrypts and parses.
pub fn read_session(jar: &PrivateCookieJar, now: i64) -> Option<SessionClaims> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let claims: SessionClaims = serde_json::from_str(cookie.value()).ok()?;
    (!claims.is_expired(now)).then_some(claims)
}

pub fn start_session(
    jar: PrivateCookieJar,
    claims: &SessionClaims,
    secure: bool,
) -> Result<PrivateCookieJar, StudyError> {
    let value = serde_json::to_string(claims)?;
    Ok(jar.add(build_cookie(value, secure)))
}

pub fn end_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(
        Cookie::build(Cookie::new(SESSION_COOKIE, ""))
            .path("/")
            .build(),
    )
}

fn build_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(SESSION_TTL_SECS))
        .build()
}

/// Extractor for mutating routes: succeeds only when the session belongs to
/// the configured account, otherwise rejects with 403.
#[derive(Debug, Clone)]
pub struct RequireAccount {
    pub username: String,
}

impl FromRequestParts<AppState> for RequireAccount {
    type Rejection = StudyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        match read_session(&jar, Utc::now().timestamp()) {
            Some(claims) if is_account(&claims.username, &state.account) => Ok(Self {
                username: claims.username,
            }),
            _ => {
                warn!(path = %parts.uri.path(), "rejected write without account session");
                Err(StudyError::Forbidden)
            }
        }
    }
}
