use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::str::FromStr;

use crate::db::ALL_SUBJECTS;
use crate::error::StudyError;
use crate::handlers::Success;
use crate::middleware::RequireAccount;
use crate::router::AppState;
use crate::service::{KeywordView, MultiYearReport, MultiYearRequest};

#[derive(Debug, Deserialize)]
pub struct SubjectQuery {
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveKeywordsBody {
    pub subject: Option<String>,
    #[serde(default)]
    pub keywords: String,
}

/// Raw query for the multi-year lookup. Numbers arrive as strings so a
/// missing or malformed value becomes our own 400 instead of an extractor rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiYearQuery {
    pub exam_type: Option<String>,
    pub subject: Option<String>,
    pub years: Option<String>,
    pub base_year: Option<String>,
}

impl TryFrom<MultiYearQuery> for MultiYearRequest {
    type Error = StudyError;

    fn try_from(q: MultiYearQuery) -> Result<Self, Self::Error> {
        let base_year = parse_opt::<i32>("baseYear", q.base_year)?;
        if base_year.is_none() {
            return Err(StudyError::BadRequest("baseYear is required".to_string()));
        }
        let exam_type = q
            .exam_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| StudyError::BadRequest("examType is required".to_string()))?;

        Ok(MultiYearRequest {
            exam_type,
            subject: non_empty(q.subject),
            years: parse_opt::<i32>("years", q.years)?,
            base_year,
        })
    }
}

/// An absent or empty subject means every subject.
fn non_empty(subject: Option<String>) -> Option<String> {
    subject.filter(|s| !s.is_empty())
}

fn parse_opt<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, StudyError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| StudyError::BadRequest(format!("{name} must be an integer"))),
    }
}

/// GET /api/keywords/multi-year
pub async fn multi_year(
    State(state): State<AppState>,
    Query(query): Query<MultiYearQuery>,
) -> Result<Json<MultiYearReport>, StudyError> {
    let req = MultiYearRequest::try_from(query)?;
    Ok(Json(state.keywords.get_multi_year(&req).await?))
}

/// GET /api/keywords/{exam_id}
pub async fn get_keywords(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<KeywordView>, StudyError> {
    let subject = non_empty(query.subject);
    let subject = subject.as_deref().unwrap_or(ALL_SUBJECTS);
    Ok(Json(state.keywords.get_one(&exam_id, subject).await?))
}

/// POST /api/keywords/{exam_id}
pub async fn save_keywords(
    State(state): State<AppState>,
    _account: RequireAccount,
    Path(exam_id): Path<String>,
    Json(body): Json<SaveKeywordsBody>,
) -> Result<Json<Success>, StudyError> {
    let subject = non_empty(body.subject);
    state
        .keywords
        .set_one(&exam_id, subject.as_deref(), &body.keywords)
        .await?;
    Ok(Json(Success::OK))
}
