//! Database layer - connection provider, diagnostics and repositories
//!
//! # Design Principles
//!
//! - One provider per process, pool of 5 with direct-connection fallback
//! - Acquire, use, release: repositories only borrow a connection
//! - Single parameterized statement per repository operation

pub mod provider;
pub mod diagnostics;
pub mod repos;

pub use provider::{create_pool, ConnectionProvider, DbConnection, Unavailable};
pub use diagnostics::{Connectivity, ConnectivityStatus};
pub use repos::*;
