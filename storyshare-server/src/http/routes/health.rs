//! Health and database diagnostic endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::db::ConnectivityStatus;
use crate::http::server::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Database diagnostic response
#[derive(Debug, Serialize)]
pub struct DiagnosticResponse {
    pub status: &'static str,
    pub message: String,
    pub reason: ConnectivityStatus,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/test-db - check the store is reachable and set up
async fn test_db(State(state): State<Arc<AppState>>) -> (StatusCode, Json<DiagnosticResponse>) {
    let connectivity = state.db.test_connectivity().await;

    let (code, status) = if connectivity.is_ok() {
        (StatusCode::OK, "success")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "error")
    };

    (
        code,
        Json(DiagnosticResponse {
            status,
            message: connectivity.message,
            reason: connectivity.status,
        }),
    )
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/test-db", get(test_db))
}
