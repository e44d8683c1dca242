//! Connectivity diagnostics
//!
//! Connects without selecting a schema, then checks that the configured
//! schema and both required tables exist. Driver error text is logged but
//! never placed in the returned message.

use serde::Serialize;
use sqlx::mysql::{MySqlConnection, MySqlDatabaseError};
use sqlx::Connection;

use super::provider::connect_with_timeout;
use crate::config::DatabaseConfig;

/// Tables the application needs
pub const REQUIRED_TABLES: [&str; 2] = ["stories", "admin_users"];

/// MySQL error numbers that mean the credentials were refused
const ACCESS_DENIED_ERRORS: [u16; 3] = [
    1044, // ER_DBACCESS_DENIED_ERROR
    1045, // ER_ACCESS_DENIED_ERROR
    1698, // ER_ACCESS_DENIED_NO_PASSWORD_ERROR
];

/// Outcome classification of a connectivity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectivityStatus {
    Ok,
    SchemaMissing,
    TablesMissing,
    AuthFailed,
    Unreachable,
    Error,
}

impl ConnectivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::SchemaMissing => "schema-missing",
            Self::TablesMissing => "tables-missing",
            Self::AuthFailed => "auth-failed",
            Self::Unreachable => "unreachable",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a connectivity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connectivity {
    pub status: ConnectivityStatus,
    pub message: String,
}

impl Connectivity {
    pub fn is_ok(&self) -> bool {
        self.status == ConnectivityStatus::Ok
    }

    fn new(status: ConnectivityStatus, config: &DatabaseConfig) -> Self {
        let message = match status {
            ConnectivityStatus::Ok => "Database connection successful!".to_string(),
            ConnectivityStatus::SchemaMissing => format!(
                "Database '{}' does not exist. Run the schema setup script first.",
                config.database
            ),
            ConnectivityStatus::TablesMissing => format!(
                "Required tables are missing ({}). Run the schema setup script to create them.",
                REQUIRED_TABLES.join(", ")
            ),
            ConnectivityStatus::AuthFailed => format!(
                "Access denied for user '{}'. Check the database username and password.",
                config.user
            ),
            ConnectivityStatus::Unreachable => format!(
                "Cannot connect to MySQL server at {}:{}. Make sure MySQL is running.",
                config.host, config.port
            ),
            ConnectivityStatus::Error => "Database connection error.".to_string(),
        };

        Self { status, message }
    }
}

/// Run the connectivity check against the configured server.
pub async fn test_connectivity(config: &DatabaseConfig) -> Connectivity {
    let mut conn = match connect_with_timeout(&config.server_options()).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::debug!(error = %e, "Connectivity check could not connect");
            return Connectivity::new(classify_error(&e), config);
        }
    };

    let outcome = check_schema(&mut conn, &config.database).await;

    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "Error closing diagnostic connection");
    }

    match outcome {
        Ok(status) => Connectivity::new(status, config),
        Err(e) => {
            tracing::debug!(error = %e, "Connectivity check query failed");
            Connectivity::new(classify_error(&e), config)
        }
    }
}

async fn check_schema(
    conn: &mut MySqlConnection,
    database: &str,
) -> Result<ConnectivityStatus, sqlx::Error> {
    let schemas: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
    )
    .bind(database)
    .fetch_one(&mut *conn)
    .await?;

    if schemas == 0 {
        return Ok(ConnectivityStatus::SchemaMissing);
    }

    let tables: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT TABLE_NAME)
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME IN (?, ?)
        "#,
    )
    .bind(database)
    .bind(REQUIRED_TABLES[0])
    .bind(REQUIRED_TABLES[1])
    .fetch_one(&mut *conn)
    .await?;

    if tables < REQUIRED_TABLES.len() as i64 {
        return Ok(ConnectivityStatus::TablesMissing);
    }

    Ok(ConnectivityStatus::Ok)
}

/// Map a driver error onto a connectivity classification.
pub fn classify_error(error: &sqlx::Error) -> ConnectivityStatus {
    match error {
        sqlx::Error::Database(db) => {
            let number = db
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(MySqlDatabaseError::number);
            match number {
                Some(n) if ACCESS_DENIED_ERRORS.contains(&n) => ConnectivityStatus::AuthFailed,
                Some(1049) => ConnectivityStatus::SchemaMissing, // ER_BAD_DB_ERROR
                Some(1146) => ConnectivityStatus::TablesMissing, // ER_NO_SUCH_TABLE
                _ => ConnectivityStatus::Error,
            }
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
            ConnectivityStatus::Unreachable
        }
        _ => ConnectivityStatus::Error,
    }
}
