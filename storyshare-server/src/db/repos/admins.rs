//! Admin user repository
//!
//! Rows are provisioned out-of-band. Passwords are stored as Argon2id PHC
//! hashes (see `storyshare hash-password`).

use sqlx::mysql::MySqlConnection;
use sqlx::FromRow;

use super::DbError;
use crate::models::AdminCredentials;
use crate::security::{self, PasswordError};

/// Admin record from database
#[derive(FromRow)]
struct AdminRow {
    username: String,
    password: String,
}

/// An authenticated admin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub username: String,
}

/// Admin repository
pub struct AdminRepo<'c> {
    conn: &'c mut MySqlConnection,
}

impl<'c> AdminRepo<'c> {
    pub fn new(conn: &'c mut MySqlConnection) -> Self {
        Self { conn }
    }

    /// Look up an admin by username and verify the password.
    ///
    /// Returns `None` for unknown users, wrong passwords and rows whose
    /// stored password is not a valid hash.
    pub async fn find(&mut self, creds: &AdminCredentials) -> Result<Option<AdminUser>, DbError> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT username, password FROM admin_users WHERE username = ? LIMIT 1",
        )
        .bind(&creds.username)
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        match security::verify_password(&creds.password, &row.password) {
            Ok(true) => Ok(Some(AdminUser {
                username: row.username,
            })),
            Ok(false) => Ok(None),
            Err(PasswordError::InvalidHash(reason)) => {
                tracing::warn!(
                    username = %row.username,
                    %reason,
                    "Admin password is not stored as a hash, re-provision with `storyshare hash-password`"
                );
                Ok(None)
            }
            Err(e) => {
                tracing::error!(error = %e, "Admin password verification failed");
                Ok(None)
            }
        }
    }
}
