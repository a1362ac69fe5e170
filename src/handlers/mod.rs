pub mod auth;
pub mod checklist;
pub mod keywords;

use serde::Serialize;

/// `{ "success": true }` acknowledgement for writes.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub const OK: Success = Success { success: true };
}
