//! Connection provider - pooled access with direct-connection fallback
//!
//! A process builds one provider at startup. When the pool cannot be
//! created the provider runs in degraded mode and opens one direct
//! connection per request instead of aborting startup.
//!
//! Every successful `acquire()` must be matched by `release()`. The
//! returned [`DbConnection`] owns its handle, so dropping it on an early
//! return also gives the connection back.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Connection, MySql};

use super::diagnostics::{self, Connectivity};
use crate::config::DatabaseConfig;

/// Default maximum connections for the pool.
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// Connect timeout for direct connections.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a request waits for a pool slot before falling back.
const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// No connection could be obtained, pooled or direct.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Database connection failed. {message}")]
pub struct Unavailable {
    /// Diagnostic message from a connectivity check
    pub message: String,
}

/// Where connections come from
enum ConnectionSource {
    Pooled(MySqlPool),
    Direct,
}

/// Process-scoped connection provider
#[derive(Clone)]
pub struct ConnectionProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    source: ConnectionSource,
    config: DatabaseConfig,
    options: MySqlConnectOptions,
}

impl ConnectionProvider {
    /// Build a provider, trying to create a pool first.
    ///
    /// Pool creation failure is logged and the provider continues in
    /// direct-connection mode.
    pub async fn connect(config: DatabaseConfig) -> Self {
        let options = config.connect_options();

        let source = match create_pool(options.clone()).await {
            Ok(pool) => {
                tracing::info!(pool_size = DEFAULT_POOL_SIZE, "Connection pool created");
                ConnectionSource::Pooled(pool)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Connection pool creation failed, will use direct connections"
                );
                ConnectionSource::Direct
            }
        };

        Self::with_source(config, options, source)
    }

    /// Build a provider that only opens direct connections.
    pub fn direct(config: DatabaseConfig) -> Self {
        let options = config.connect_options();
        Self::with_source(config, options, ConnectionSource::Direct)
    }

    fn with_source(
        config: DatabaseConfig,
        options: MySqlConnectOptions,
        source: ConnectionSource,
    ) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                source,
                config,
                options,
            }),
        }
    }

    /// Whether a pool backs this provider.
    pub fn is_pooled(&self) -> bool {
        matches!(self.inner.source, ConnectionSource::Pooled(_))
    }

    /// Acquire a connection.
    ///
    /// Tries the pool first (waiting briefly for a free slot), then falls
    /// back to one direct connection. When both fail, runs a connectivity
    /// check and returns its message as [`Unavailable`].
    pub async fn acquire(&self) -> Result<DbConnection, Unavailable> {
        if let ConnectionSource::Pooled(pool) = &self.inner.source {
            match pool.acquire().await {
                Ok(conn) => {
                    tracing::debug!("Connection retrieved from pool");
                    return Ok(DbConnection::Pooled(conn));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Pool not available, using direct connection");
                }
            }
        }

        match connect_with_timeout(&self.inner.options).await {
            Ok(conn) => {
                tracing::debug!("Direct connection established");
                Ok(DbConnection::Direct(conn))
            }
            Err(e) => {
                let config = &self.inner.config;
                tracing::error!(
                    error = %e,
                    host = %config.host,
                    user = %config.user,
                    database = %config.database,
                    "Error getting database connection"
                );
                let diagnosis = self.test_connectivity().await;
                Err(Unavailable {
                    message: diagnosis.message,
                })
            }
        }
    }

    /// Release a connection acquired from this provider.
    pub async fn release(&self, conn: DbConnection) {
        conn.release().await;
    }

    /// Check that the server is reachable and the schema is in place.
    pub async fn test_connectivity(&self) -> Connectivity {
        diagnostics::test_connectivity(&self.inner.config).await
    }

    /// Close the pool, if any. Outstanding connections finish first.
    pub async fn close(&self) {
        if let ConnectionSource::Pooled(pool) = &self.inner.source {
            pool.close().await;
            tracing::debug!("Connection pool closed");
        }
    }
}

/// A live connection, pooled or direct.
///
/// Dereferences to [`MySqlConnection`] so repositories can run queries
/// against it regardless of origin.
pub enum DbConnection {
    Pooled(PoolConnection<MySql>),
    Direct(MySqlConnection),
}

impl DbConnection {
    /// Whether this connection came from the pool.
    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }

    /// Return a pooled connection to its pool or close a direct one.
    ///
    /// Close errors are logged, never surfaced.
    pub async fn release(self) {
        match self {
            Self::Pooled(conn) => {
                drop(conn);
                tracing::debug!("Connection returned to pool");
            }
            Self::Direct(conn) => match conn.close().await {
                Ok(()) => tracing::debug!("Connection closed"),
                Err(e) => tracing::error!(error = %e, "Error closing connection"),
            },
        }
    }
}

impl Deref for DbConnection {
    type Target = MySqlConnection;

    fn deref(&self) -> &MySqlConnection {
        match self {
            Self::Pooled(conn) => &**conn,
            Self::Direct(conn) => conn,
        }
    }
}

impl DerefMut for DbConnection {
    fn deref_mut(&mut self) -> &mut MySqlConnection {
        match self {
            Self::Pooled(conn) => &mut **conn,
            Self::Direct(conn) => conn,
        }
    }
}

/// Create a MySQL connection pool.
///
/// # Errors
///
/// Returns an error if the first connection cannot be established.
pub async fn create_pool(options: MySqlConnectOptions) -> Result<MySqlPool, sqlx::Error> {
    create_pool_with_options(options, DEFAULT_POOL_SIZE).await
}

/// Create a MySQL connection pool with a custom size.
pub async fn create_pool_with_options(
    options: MySqlConnectOptions,
    max_connections: u32,
) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
}

/// Open one unpooled connection, giving up after [`CONNECT_TIMEOUT`].
pub(crate) async fn connect_with_timeout(
    options: &MySqlConnectOptions,
) -> Result<MySqlConnection, sqlx::Error> {
    match tokio::time::timeout(CONNECT_TIMEOUT, MySqlConnection::connect_with(options)).await {
        Ok(result) => result,
        Err(_) => Err(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("connect timed out after {} seconds", CONNECT_TIMEOUT.as_secs()),
        ))),
    }
}
