use crate::db::models::{ALL_SUBJECTS, ChecklistRow, KeywordRecord, SubjectFilter};
use crate::db::schema::SQLITE_INIT;
use crate::error::StudyError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::collections::BTreeMap;
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct StudyStorage {
    pool: SqlitePool,
}

impl StudyStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, StudyError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), StudyError> {
        // sqlx::query runs a single statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn list_checklist(&self) -> Result<Vec<ChecklistRow>, StudyError> {
        let rows = sqlx::query_as::<_, ChecklistRow>("SELECT id, checked FROM checklist")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Batch upsert in a single transaction; the first failing row aborts the batch.
    pub async fn upsert_checklist(
        &self,
        entries: &BTreeMap<String, bool>,
    ) -> Result<usize, StudyError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for (id, checked) in entries {
            let checked_i = if *checked { 1 } else { 0 };
            sqlx::query(
                r#"
                INSERT INTO checklist (id, checked) VALUES (?, ?)
                ON CONFLICT(id) DO UPDATE SET checked = excluded.checked
                "#,
            )
            .bind(id.as_str())
            .bind(checked_i)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;
        Ok(written)
    }

    pub async fn get_keywords(
        &self,
        exam_id: &str,
        subject: &str,
    ) -> Result<Option<String>, StudyError> {
        let rec: Option<(String,)> = sqlx::query_as(
            "SELECT COALESCE(keywords, '') FROM keywords WHERE exam_id = ? AND subject = ?",
        )
        .bind(exam_id)
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec.map(|r| r.0))
    }

    /// Replace the keyword text stored under `(exam_id, subject)`. A rewritten
    /// row moves to the end of insertion order.
    pub async fn upsert_keywords(
        &self,
        exam_id: &str,
        subject: &str,
        keywords: &str,
    ) -> Result<(), StudyError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO keywords (exam_id, subject, keywords) VALUES (?, ?, ?)
            "#,
        )
        .bind(exam_id)
        .bind(subject)
        .bind(keywords)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Rows for the given exams matching `filter`, in insertion order.
    /// An empty id list returns nothing without touching the database.
    pub async fn select_keywords(
        &self,
        exam_ids: &[String],
        filter: SubjectFilter<'_>,
    ) -> Result<Vec<KeywordRecord>, StudyError> {
        if exam_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"SELECT exam_id, subject, COALESCE(keywords, '') AS keywords
               FROM keywords WHERE exam_id IN ("#,
        );
        let mut ids = qb.separated(", ");
        for id in exam_ids {
            ids.push_bind(id.clone());
        }
        ids.push_unseparated(")");

        match filter {
            SubjectFilter::AllSubjects => {
                qb.push(" AND subject != ").push_bind(ALL_SUBJECTS);
            }
            SubjectFilter::Only(subject) => {
                qb.push(" AND subject = ").push_bind(subject.to_string());
            }
        }
        qb.push(" ORDER BY rowid");

        let rows = qb
            .build_query_as::<KeywordRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Every keyword row ordered by exam then subject.
    pub async fn list_keywords(&self) -> Result<Vec<KeywordRecord>, StudyError> {
        let rows = sqlx::query_as::<_, KeywordRecord>(
            r#"SELECT exam_id, subject, COALESCE(keywords, '') AS keywords
               FROM keywords ORDER BY exam_id, subject"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
