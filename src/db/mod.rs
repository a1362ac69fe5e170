//! Database module: row models, schema and the SQLite-backed store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database
//! - `sqlite.rs`: pool setup and every query the services issue

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{ALL_SUBJECTS, ChecklistRow, KeywordRecord, SubjectFilter};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, StudyStorage};
