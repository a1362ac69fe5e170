use axum::{Json, extract::State};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::StudyError;
use crate::handlers::Success;
use crate::middleware::RequireAccount;
use crate::router::AppState;

/// GET /api/checklist
pub async fn get_checklist(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, bool>>, StudyError> {
    Ok(Json(state.checklist.get_all().await?))
}

/// POST /api/checklist
pub async fn save_checklist(
    State(state): State<AppState>,
    _account: RequireAccount,
    Json(entries): Json<BTreeMap<String, bool>>,
) -> Result<Json<Success>, StudyError> {
    state.checklist.set_all(&entries).await?;
    info!(count = entries.len(), "checklist saved");
    Ok(Json(Success::OK))
}
