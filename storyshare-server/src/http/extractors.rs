//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::db::repos::StoryId;
use crate::models::{AdminCredentials, ValidationError};

/// Header carrying the admin username
pub const ADMIN_USERNAME_HEADER: &str = "x-admin-username";

/// Header carrying the admin password
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Admin credentials taken from request headers.
///
/// Rejects with 401 when either header is missing or empty. Whether the
/// credentials are valid is checked later against the store.
pub struct AdminAuth(pub AdminCredentials);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
        };

        AdminCredentials::from_parts(header(ADMIN_USERNAME_HEADER), header(ADMIN_PASSWORD_HEADER))
            .map(Self)
            .ok_or(ApiError::Unauthorized {
                message: "Admin credentials required",
            })
    }
}

/// Extract a story id from the path.
///
/// A non-numeric id cannot name a story, so it is answered as not found.
pub struct StoryIdPath(pub StoryId);

impl<S> FromRequestParts<S> for StoryIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound {
                resource: "Story",
                id: String::new(),
            })?;

        raw.parse::<StoryId>()
            .map(Self)
            .map_err(|_| ApiError::NotFound {
                resource: "Story",
                id: raw,
            })
    }
}

/// JSON body whose rejections render as JSON errors
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                return ApiError::PayloadTooLarge;
            }
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "body",
                reason: rejection.body_text(),
            })
        })?;

        Ok(Self(value))
    }
}
