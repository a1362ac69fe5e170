use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Subject value meaning "every subject of this exam combined".
pub const ALL_SUBJECTS: &str = "all";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ChecklistRow {
    pub id: String,
    pub checked: Option<i64>,
}

impl ChecklistRow {
    pub fn is_checked(&self) -> bool {
        self.checked == Some(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct KeywordRecord {
    pub exam_id: String,
    pub subject: String,
    pub keywords: String,
}

/// Which subject rows a keyword selection covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectFilter<'a> {
    /// Every concrete subject; rows stored under [`ALL_SUBJECTS`] are skipped
    /// so a pre-aggregated row is never counted twice.
    AllSubjects,
    Only(&'a str),
}

impl<'a> SubjectFilter<'a> {
    pub fn from_subject(subject: &'a str) -> Self {
        if subject == ALL_SUBJECTS {
            Self::AllSubjects
        } else {
            Self::Only(subject)
        }
    }
}
