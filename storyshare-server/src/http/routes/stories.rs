//! Story endpoints
//!
//! Each handler acquires one connection, does its work through the
//! repositories, and releases the connection before turning the outcome
//! into a response.

use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Serialize;
use sqlx::mysql::MySqlConnection;

use crate::db::repos::{AdminRepo, AdminUser, Story, StoryId, StoryRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminAuth, StoryIdPath};
use crate::http::server::AppState;
use crate::models::{AdminCredentials, NewStory, PhotoUpload, StoryForm, ValidationError};

/// Multipart field carrying the optional photo
const PHOTO_FIELD: &str = "photo";

/// Story response
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub id: StoryId,
    pub author_name: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub photo_url: Option<String>,
    pub created_at: Option<String>,
}

impl From<Story> for StoryResponse {
    fn from(s: Story) -> Self {
        Self {
            id: s.id,
            author_name: s.author_name,
            title: s.title,
            description: s.description,
            content: s.content,
            photo_url: s.photo_url,
            created_at: s.created_at,
        }
    }
}

/// Response for a newly created story
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: StoryId,
}

/// Plain message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /api/stories - list all stories, newest first
async fn list_stories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let outcome = StoryRepo::new(&mut conn).list().await;
    state.db.release(conn).await;

    let stories = outcome?;
    Ok(Json(stories.into_iter().map(StoryResponse::from).collect()))
}

/// POST /api/stories - submit a story with an optional photo
async fn create_story(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let multipart = multipart.map_err(|rejection| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "form",
            reason: rejection.body_text(),
        })
    })?;

    let submission = read_submission(multipart).await?;
    let story = submission.form.validate()?;
    let photo = submission
        .photo
        .map(|p| PhotoUpload::new(p.filename, p.content_type, p.bytes))
        .transpose()?;

    let mut conn = state.db.acquire().await?;
    let outcome = publish(&state, &mut conn, &story, photo).await;
    state.db.release(conn).await;

    let id = outcome?;
    tracing::info!(story_id = id, "Story added successfully");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Story added successfully",
            id,
        }),
    ))
}

/// DELETE /api/stories/{id} - remove a story (admin only)
async fn delete_story(
    State(state): State<Arc<AppState>>,
    AdminAuth(creds): AdminAuth,
    StoryIdPath(id): StoryIdPath,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let outcome = remove(&mut conn, &creds, id).await;
    state.db.release(conn).await;

    let admin = outcome?;
    tracing::info!(story_id = id, admin = %admin.username, "Story deleted successfully");

    Ok(Json(MessageResponse {
        message: "Story deleted successfully",
    }))
}

/// Upload the photo, if any, then insert the story.
///
/// A failed insert after a successful upload leaves the remote image in
/// place.
async fn publish(
    state: &AppState,
    conn: &mut MySqlConnection,
    story: &NewStory,
    photo: Option<PhotoUpload>,
) -> Result<StoryId, ApiError> {
    let photo_url = match photo {
        Some(photo) => {
            let uploaded = state.images.upload(photo, &state.upload_folder).await?;
            tracing::info!(url = %uploaded.secure_url, "Photo uploaded");
            Some(uploaded.secure_url)
        }
        None => None,
    };

    Ok(StoryRepo::new(conn).insert(story, photo_url.as_deref()).await?)
}

/// Authenticate, confirm the story exists, then delete it.
async fn remove(
    conn: &mut MySqlConnection,
    creds: &AdminCredentials,
    id: StoryId,
) -> Result<AdminUser, ApiError> {
    let admin = AdminRepo::new(&mut *conn)
        .find(creds)
        .await?
        .ok_or(ApiError::Unauthorized {
            message: "Invalid admin credentials",
        })?;

    let mut stories = StoryRepo::new(conn);
    if !stories.exists(id).await? {
        return Err(ApiError::NotFound {
            resource: "Story",
            id: id.to_string(),
        });
    }
    stories.delete(id).await?;

    Ok(admin)
}

/// Photo part before extension validation
struct RawPhoto {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Parsed multipart submission
struct Submission {
    form: StoryForm,
    photo: Option<RawPhoto>,
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut form = StoryForm::default();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == PHOTO_FIELD {
            let filename = field.file_name().map(str::to_owned).unwrap_or_default();
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await.map_err(multipart_error)?;

            // An empty filename means the client sent the field without a file
            if !filename.is_empty() {
                photo = Some(RawPhoto {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            if !form.set(&name, value) {
                tracing::debug!(field = %name, "Ignoring unknown form field");
            }
        }
    }

    Ok(Submission { form, photo })
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    ApiError::Validation(ValidationError::InvalidFormat {
        field: "form",
        reason: err.body_text(),
    })
}

/// Story routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stories", get(list_stories).post(create_story))
        .route("/api/stories/{id}", delete(delete_story))
}
