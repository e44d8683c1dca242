//! Cloudinary image host client
//!
//! Signed upload over the REST API. The signature is the hex SHA-1 of the
//! alphabetically sorted `key=value` parameters joined by `&`, followed by
//! the API secret.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use super::{ImageHost, UploadError, UploadedImage};
use crate::config::CloudinaryConfig;
use crate::models::PhotoUpload;

/// Default API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Cloudinary upload client
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    missing: Vec<&'static str>,
}

/// Successful upload response (only the fields we read)
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Error response body
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            missing: config.missing_credentials(),
        }
    }

    /// Point the client at a different API host (for testing)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.api_base, self.cloud_name)
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, photo: PhotoUpload, folder: &str) -> Result<UploadedImage, UploadError> {
        if !self.missing.is_empty() {
            return Err(UploadError::NotConfigured {
                missing: self.missing.clone(),
            });
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", folder), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let file = Part::bytes(photo.bytes)
            .file_name(photo.filename.clone())
            .mime_str(part_mime(photo.content_type.as_deref()).as_ref())?;

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_owned())
            .text("signature", signature);

        tracing::debug!(filename = %photo.filename, folder, "Uploading photo to Cloudinary");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        let secure_url = body.secure_url.ok_or(UploadError::MissingUrl)?;

        Ok(UploadedImage { secure_url })
    }
}

/// Content type for the uploaded file part.
///
/// Only the filename is validated on the way in, so a client-supplied type
/// that does not parse falls back to `application/octet-stream`.
fn part_mime(content_type: Option<&str>) -> mime::Mime {
    match content_type.map(str::parse::<mime::Mime>) {
        Some(Ok(parsed)) => parsed,
        Some(Err(e)) => {
            tracing::debug!(error = %e, "Ignoring unparseable photo content type");
            mime::APPLICATION_OCTET_STREAM
        }
        None => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Compute an upload signature for the given parameters.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
