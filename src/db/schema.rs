//! SQL DDL for the checklist and keyword tables.

/// SQLite schema with:
/// - `checklist`: one boolean flag per opaque id (`checked` stored as INTEGER 0/1)
/// - `keywords`: newline-delimited keyword text per `(exam_id, subject)`
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS checklist (
    id TEXT PRIMARY KEY,
    checked INTEGER
);

CREATE TABLE IF NOT EXISTS keywords (
    exam_id TEXT NOT NULL,
    subject TEXT NOT NULL,
    keywords TEXT,
    PRIMARY KEY (exam_id, subject)
);
"#;
