use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use axum_extra::extract::cookie::Key;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::db::StudyStorage;
use crate::handlers::{auth, checklist, keywords};
use crate::service::{ChecklistService, KeywordService};

#[derive(Clone)]
pub struct AppState {
    pub checklist: ChecklistService,
    pub keywords: KeywordService,
    /// The one username allowed to write.
    pub account: Arc<str>,
    pub key: Key,
    pub insecure_cookie: bool,
}

impl AppState {
    pub fn new(storage: StudyStorage, account: Arc<str>, key: Key, insecure_cookie: bool) -> Self {
        Self {
            checklist: ChecklistService::new(storage.clone()),
            keywords: KeywordService::new(storage),
            account,
            key,
            insecure_cookie,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Directory served for non-API paths, minus files that must never leave
/// the server: dotfiles (`.env` carries the session secret) and the
/// database with its sidecar files.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    pub dir: PathBuf,
    hidden: Vec<String>,
}

impl StaticAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            hidden: Vec::new(),
        }
    }

    /// Hide `file_name` plus the `-wal`, `-shm` and `-journal` files SQLite
    /// keeps next to it.
    pub fn hide_database_files(mut self, file_name: &str) -> Self {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            self.hidden.push(format!("{file_name}{suffix}"));
        }
        self
    }

    pub fn is_hidden(&self, path: &str) -> bool {
        path.split('/').any(|raw| {
            // undecodable segments are refused rather than guessed at
            let Ok(segment) = urlencoding::decode(raw) else {
                return true;
            };
            segment.starts_with('.')
                || self
                    .hidden
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&segment))
        })
    }
}

async fn guard_static(
    State(assets): State<Arc<StaticAssets>>,
    req: Request,
    next: Next,
) -> Response {
    if assets.is_hidden(req.uri().path()) {
        warn!(path = %req.uri().path(), "refused request for a private file");
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(req).await
}

/// Build the API router with `assets` served for every non-API path.
///
/// Literal segments always win over `{exam_id}` in the path matcher, so
/// `/api/keywords/multi-year` never reaches the per-exam handler whatever
/// the registration order.
pub fn study_router(state: AppState, assets: StaticAssets) -> Router {
    let assets = Arc::new(assets);
    let static_files = Router::new()
        .fallback_service(ServeDir::new(&assets.dir))
        .layer(middleware::from_fn_with_state(assets.clone(), guard_static));

    Router::new()
        .route(
            "/api/checklist",
            get(checklist::get_checklist).post(checklist::save_checklist),
        )
        .route("/api/auth/status", get(auth::status))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/keywords/{exam_id}",
            get(keywords::get_keywords).post(keywords::save_keywords),
        )
        .route("/api/keywords/multi-year", get(keywords::multi_year))
        .route("/api/{*rest}", any(api_not_found))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn api_not_found(uri: Uri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, format!("no API route for {}", uri.path()))
}
