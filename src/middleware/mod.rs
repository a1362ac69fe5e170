pub mod auth;

pub use auth::{RequireAccount, SessionClaims};
