//! Route handlers organized by resource

pub mod health;
pub mod stories;
pub mod admin;
