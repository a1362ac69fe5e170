use std::collections::BTreeMap;
use tracing::debug;

use crate::db::StudyStorage;
use crate::error::StudyError;

#[derive(Clone)]
pub struct ChecklistService {
    storage: StudyStorage,
}

impl ChecklistService {
    pub fn new(storage: StudyStorage) -> Self {
        Self { storage }
    }

    pub async fn get_all(&self) -> Result<BTreeMap<String, bool>, StudyError> {
        let rows = self.storage.list_checklist().await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let checked = row.is_checked();
                (row.id, checked)
            })
            .collect())
    }

    /// Upsert every entry. Callers must have passed the account check.
    pub async fn set_all(&self, entries: &BTreeMap<String, bool>) -> Result<(), StudyError> {
        let written = self.storage.upsert_checklist(entries).await?;
        debug!(count = written, "checklist entries stored");
        Ok(())
    }
}
