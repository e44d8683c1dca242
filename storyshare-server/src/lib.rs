//! storyshare-server: HTTP backend for a small story-sharing site
//!
//! Visitors submit stories with an optional photo, anyone can read the
//! list, and authenticated admins can delete entries. Stories live in
//! MySQL; photos are pushed to Cloudinary and only their URL is stored.

pub mod config;
pub mod db;
pub mod http;
pub mod media;
pub mod models;
pub mod security;

pub use config::{AppConfig, CloudinaryConfig, ConfigError, DatabaseConfig};
pub use db::{ConnectionProvider, Connectivity, ConnectivityStatus};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
pub use media::{CloudinaryClient, ImageHost};
