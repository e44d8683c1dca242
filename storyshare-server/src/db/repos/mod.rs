//! Repository implementations for database access
//!
//! Repositories borrow an acquired connection; acquiring and releasing it
//! is the caller's job.

pub mod stories;
pub mod admins;

pub use stories::{Story, StoryId, StoryRepo};
pub use admins::{AdminRepo, AdminUser};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}
