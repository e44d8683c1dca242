//! Image host adapter trait and implementations
//!
//! Provides a trait for uploading story photos, with:
//! - Cloudinary implementation over its signed REST upload API
//! - Mock implementation for testing

pub mod cloudinary;

use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::PhotoUpload;

pub use cloudinary::CloudinaryClient;

/// A photo accepted by the image host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Public https URL of the stored image
    pub secure_url: String,
}

/// Error during upload
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("image host credentials missing: {}", missing.join(", "))]
    NotConfigured { missing: Vec<&'static str> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("image host response carried no secure_url")]
    MissingUrl,
}

/// Trait for photo uploads (testable)
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, photo: PhotoUpload, folder: &str) -> Result<UploadedImage, UploadError>;
}

/// Mock image host for testing
///
/// Records every upload and answers with a predictable URL, or with a
/// rejection when built with [`MockImageHost::failing`].
#[derive(Default)]
pub struct MockImageHost {
    uploads: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose uploads always fail
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// (folder, filename) pairs uploaded so far
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload(&self, photo: PhotoUpload, folder: &str) -> Result<UploadedImage, UploadError> {
        self.uploads
            .lock()
            .unwrap()
            .push((folder.to_owned(), photo.filename.clone()));

        if self.fail {
            return Err(UploadError::Rejected {
                status: 503,
                message: "mock failure".into(),
            });
        }

        Ok(UploadedImage {
            secure_url: format!("https://images.test/{}/{}", folder, photo.filename),
        })
    }
}
