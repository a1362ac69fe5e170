//! Keyword lists per exam and the multi-year frequency aggregation.
//!
//! Keyword text is stored verbatim, one keyword per line. Counting trims each
//! line and drops blank ones; no other normalization is applied, so `Foo` and
//! `foo` are different terms.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::{ALL_SUBJECTS, KeywordRecord, StudyStorage, SubjectFilter};
use crate::error::StudyError;

pub const DEFAULT_YEARS: i32 = 3;
/// Widest window a single lookup may span.
pub const MAX_YEARS: i32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordView {
    pub keywords: String,
    pub is_aggregated: bool,
}

/// Parameters of a multi-year lookup. `base_year` is optional here so that a
/// missing value is reported as a bad request rather than a decode failure.
#[derive(Debug, Clone, Default)]
pub struct MultiYearRequest {
    pub exam_type: String,
    pub subject: Option<String>,
    pub years: Option<i32>,
    pub base_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiYearReport {
    pub exam_ids: Vec<String>,
    pub subject: String,
    pub year_range: String,
    pub merged_keywords: BTreeMap<String, u64>,
    pub year_data: BTreeMap<String, u64>,
}

/// Frequency table built from keyword rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTally {
    /// term -> occurrences across every row seen
    pub merged: BTreeMap<String, u64>,
    /// exam id -> non-blank lines seen for that exam
    pub per_exam: BTreeMap<String, u64>,
}

impl KeywordTally {
    pub fn add(&mut self, record: &KeywordRecord) {
        if record.keywords.is_empty() {
            return;
        }
        let mut lines = 0;
        for term in keyword_lines(&record.keywords) {
            *self.merged.entry(term.to_string()).or_insert(0) += 1;
            lines += 1;
        }
        *self.per_exam.entry(record.exam_id.clone()).or_insert(0) += lines;
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a KeywordRecord>) -> Self {
        let mut tally = Self::default();
        for record in records {
            tally.add(record);
        }
        tally
    }
}

/// Trimmed, non-blank lines of a keyword block.
pub fn keyword_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|line| !line.is_empty())
}

/// `"{year}-{exam_type}"` for every year in `base_year - years + 1 ..= base_year`.
/// A non-positive window yields no ids.
pub fn exam_ids(exam_type: &str, years: i32, base_year: i32) -> Vec<String> {
    let (start, end) = year_bounds(years, base_year);
    (start..=end)
        .map(|year| format!("{year}-{exam_type}"))
        .collect()
}

fn year_bounds(years: i32, base_year: i32) -> (i64, i64) {
    let end = i64::from(base_year);
    (end - i64::from(years) + 1, end)
}

#[derive(Clone)]
pub struct KeywordService {
    storage: StudyStorage,
}

impl KeywordService {
    pub fn new(storage: StudyStorage) -> Self {
        Self { storage }
    }

    pub async fn get_one(&self, exam_id: &str, subject: &str) -> Result<KeywordView, StudyError> {
        if subject == ALL_SUBJECTS {
            let rows = self
                .storage
                .select_keywords(&[exam_id.to_string()], SubjectFilter::AllSubjects)
                .await?;
            let keywords = rows
                .iter()
                .map(|r| r.keywords.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(KeywordView {
                keywords,
                is_aggregated: true,
            });
        }

        let keywords = self
            .storage
            .get_keywords(exam_id, subject)
            .await?
            .unwrap_or_default();
        Ok(KeywordView {
            keywords,
            is_aggregated: false,
        })
    }

    /// Replace the keyword text for an exam. Callers must have passed the account check.
    pub async fn set_one(
        &self,
        exam_id: &str,
        subject: Option<&str>,
        keywords: &str,
    ) -> Result<(), StudyError> {
        let subject = subject.unwrap_or(ALL_SUBJECTS);
        self.storage
            .upsert_keywords(exam_id, subject, keywords)
            .await?;
        debug!(exam_id = %exam_id, subject = %subject, "keywords stored");
        Ok(())
    }

    pub async fn get_multi_year(
        &self,
        req: &MultiYearRequest,
    ) -> Result<MultiYearReport, StudyError> {
        let base_year = req
            .base_year
            .ok_or_else(|| StudyError::BadRequest("baseYear is required".to_string()))?;
        let years = req.years.unwrap_or(DEFAULT_YEARS);
        if years > MAX_YEARS {
            return Err(StudyError::BadRequest(format!(
                "years must not exceed {MAX_YEARS}"
            )));
        }
        let subject = req.subject.as_deref().unwrap_or(ALL_SUBJECTS);

        let (start_year, end_year) = year_bounds(years, base_year);
        let ids = exam_ids(&req.exam_type, years, base_year);

        let rows = self
            .storage
            .select_keywords(&ids, SubjectFilter::from_subject(subject))
            .await?;
        let tally = KeywordTally::from_records(&rows);
        debug!(
            exams = ids.len(),
            rows = rows.len(),
            terms = tally.merged.len(),
            "multi-year keywords merged"
        );

        Ok(MultiYearReport {
            exam_ids: ids,
            subject: subject.to_string(),
            year_range: format!("{start_year}-{end_year}"),
            merged_keywords: tally.merged,
            year_data: tally.per_exam,
        })
    }
}
