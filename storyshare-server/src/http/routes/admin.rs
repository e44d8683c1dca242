//! Admin credential check

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::repos::AdminRepo;
use crate::http::error::ApiError;
use crate::http::extractors::JsonBody;
use crate::http::server::AppState;
use crate::models::AdminCredentials;

/// Verify request
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Verify response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// POST /api/admin/verify - check admin credentials
async fn verify_admin(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<VerifyRequest>,
) -> Result<(StatusCode, Json<VerifyResponse>), ApiError> {
    let Some(creds) =
        AdminCredentials::from_parts(req.username.as_deref(), req.password.as_deref())
    else {
        return Ok(rejected());
    };

    let mut conn = state.db.acquire().await?;
    let outcome = AdminRepo::new(&mut conn).find(&creds).await;
    state.db.release(conn).await;

    match outcome? {
        Some(admin) => {
            tracing::info!(admin = %admin.username, "Admin credentials verified");
            Ok((StatusCode::OK, Json(VerifyResponse { valid: true })))
        }
        None => Ok(rejected()),
    }
}

fn rejected() -> (StatusCode, Json<VerifyResponse>) {
    (StatusCode::UNAUTHORIZED, Json(VerifyResponse { valid: false }))
}

/// Admin routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/verify", post(verify_admin))
}
