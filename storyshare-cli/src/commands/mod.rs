//! Command implementations for the storyshare CLI

pub mod check_db;
pub mod hash_password;
pub mod serve;

pub use check_db::run_check_db;
pub use hash_password::run_hash_password;
pub use serve::run_serve;
