//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - 16 MiB request body cap
//! - Optional static asset directory
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;
use crate::config::AppConfig;
use crate::db::ConnectionProvider;
use crate::media::{CloudinaryClient, ImageHost};

/// Maximum accepted request body (16 MiB)
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,

    /// Directory of front-end assets served for unmatched paths
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cors_permissive: false,
            static_dir: None,
        }
    }
}

/// Shared application state, built once per process
#[derive(Clone)]
pub struct AppState {
    pub db: ConnectionProvider,
    pub images: Arc<dyn ImageHost>,
    /// Image host folder that receives story photos
    pub upload_folder: String,
}

impl AppState {
    pub fn new(db: ConnectionProvider, images: Arc<dyn ImageHost>, upload_folder: String) -> Self {
        Self {
            db,
            images,
            upload_folder,
        }
    }

    /// Build state from configuration: connection provider plus Cloudinary.
    pub async fn from_config(config: &AppConfig) -> Self {
        let db = ConnectionProvider::connect(config.database.clone()).await;
        let images = Arc::new(CloudinaryClient::new(&config.cloudinary));
        Self::new(db, images, config.cloudinary.upload_folder.clone())
    }
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    // CORS configuration
    let cors = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        // Localhost only
        let port = config.bind_addr.port();
        let origins: Vec<HeaderValue> = [
            format!("http://localhost:{}", port),
            format!("http://127.0.0.1:{}", port),
        ]
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let mut router = Router::new()
        .merge(routes::health::router())
        .merge(routes::stories::router())
        .merge(routes::admin::router());

    if let Some(dir) = &config.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static assets");
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::map_response(json_payload_too_large))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Give the body limit layer's plain-text 413 the JSON error shape.
async fn json_payload_too_large(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"));

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return ApiError::PayloadTooLarge.into_response();
    }
    response
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let config = AppConfig::from_env()?;
/// let state = AppState::from_config(&config).await;
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let db = state.db.clone();

    let connectivity = db.test_connectivity().await;
    if connectivity.is_ok() {
        tracing::info!("{}", connectivity.message);
    } else {
        tracing::warn!(reason = %connectivity.status, "{}", connectivity.message);
        tracing::warn!("The server will start, but database operations may fail");
    }

    let app = build_router(state, &config);

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::db::test_support::unreachable_config;
    use crate::media::MockImageHost;

    const BOUNDARY: &str = "storyshare-test-boundary";

    /// Router whose store is unreachable, with a recording image host.
    fn offline_app(images: Arc<MockImageHost>) -> Router {
        let db = ConnectionProvider::direct(unreachable_config());
        let state = AppState::new(db, images, "blog_stories".into());
        build_router(state, &ServerConfig::default())
    }

    fn multipart_body(fields: &[(&str, &str)], photo: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, bytes)) = photo {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post_story(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/stories")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const FULL_STORY: [(&str, &str); 4] = [
        ("author_name", "Ann"),
        ("title", "T"),
        ("description", "D"),
        ("content", "C"),
    ];

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 5000);
        assert!(!config.cors_permissive);
        assert!(config.static_dir.is_none());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_db_reports_unreachable_consistently() {
        let app = offline_app(Arc::new(MockImageHost::new()));

        let mut reasons = Vec::new();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/api/test-db").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = body_json(response).await;
            assert_eq!(body["status"], "error");
            reasons.push(body["reason"].clone());
        }
        assert_eq!(reasons[0], json!("unreachable"));
        assert_eq!(reasons[0], reasons[1]);
    }

    #[tokio::test]
    async fn list_stories_without_database_is_500() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let response = app
            .oneshot(Request::builder().uri("/api/stories").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("Database connection failed."), "{error}");
    }

    #[tokio::test]
    async fn create_story_rejects_missing_fields() {
        let images = Arc::new(MockImageHost::new());
        let app = offline_app(images.clone());

        let body = multipart_body(&FULL_STORY[..3], Some(("cat.jpg", &b"\xff\xd8"[..])));
        let response = app.oneshot(post_story(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "All fields are required");
        assert!(images.uploads().is_empty());
    }

    #[tokio::test]
    async fn create_story_rejects_blank_fields() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let fields = [
            ("author_name", "Ann"),
            ("title", "   "),
            ("description", "D"),
            ("content", "C"),
        ];
        let response = app.oneshot(post_story(multipart_body(&fields, None))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_story_rejects_bad_extension_before_upload() {
        let images = Arc::new(MockImageHost::new());
        let app = offline_app(images.clone());

        let body = multipart_body(&FULL_STORY, Some(("setup.exe", &b"MZ"[..])));
        let response = app.oneshot(post_story(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid image format");
        assert!(images.uploads().is_empty());
    }

    #[tokio::test]
    async fn create_story_without_database_skips_upload() {
        let images = Arc::new(MockImageHost::new());
        let app = offline_app(images.clone());

        let body = multipart_body(&FULL_STORY, Some(("cat.jpg", &b"\xff\xd8"[..])));
        let response = app.oneshot(post_story(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(images.uploads().is_empty());
    }

    #[tokio::test]
    async fn create_story_requires_multipart() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/stories")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title": "T"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let payload = vec![b'a'; MAX_BODY_BYTES + 1];
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/stories")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .header("content-length", payload.len())
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["error"], "Request body too large");
        assert_eq!(body["status"], 413);
    }

    #[tokio::test]
    async fn oversized_json_without_length_is_rejected_as_json() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let mut payload = br#"{"username": "admin", "password": ""#.to_vec();
        payload.resize(MAX_BODY_BYTES + 1, b'a');

        // No content-length header, so the limit trips while the body is read
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/verify")
                    .header("content-type", "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["error"], "Request body too large");
    }

    #[tokio::test]
    async fn oversized_multipart_without_length_is_rejected_as_json() {
        let images = Arc::new(MockImageHost::new());
        let app = offline_app(images.clone());
        let photo = vec![0u8; MAX_BODY_BYTES];
        let body = multipart_body(&FULL_STORY, Some(("big.jpg", &photo[..])));

        let response = app.oneshot(post_story(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["error"], "Request body too large");
        assert!(images.uploads().is_empty());
    }

    #[tokio::test]
    async fn delete_requires_credentials() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/stories/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["error"],
            "Admin credentials required"
        );
    }

    #[tokio::test]
    async fn delete_without_database_is_500() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/stories/1")
                    .header("X-Admin-Username", "admin")
                    .header("X-Admin-Password", "pw")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn delete_non_numeric_id_is_404() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/stories/abc")
                    .header("X-Admin-Username", "admin")
                    .header("X-Admin-Password", "pw")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Story not found");
    }

    #[tokio::test]
    async fn verify_rejects_malformed_json() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/verify")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn verify_without_credentials_is_invalid() {
        let app = offline_app(Arc::new(MockImageHost::new()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/verify")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username": "admin"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "valid": false }));
    }

    #[tokio::test]
    async fn serves_static_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Stories</h1>").unwrap();

        let db = ConnectionProvider::direct(unreachable_config());
        let state = AppState::new(db, Arc::new(MockImageHost::new()), "f".into());
        let config = ServerConfig {
            static_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let app = build_router(state, &config);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Stories</h1>");
    }
}
