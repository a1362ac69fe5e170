pub mod checklist;
pub mod keywords;

pub use checklist::ChecklistService;
pub use keywords::{KeywordService, KeywordTally, KeywordView, MultiYearReport, MultiYearRequest};
