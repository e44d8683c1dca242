//! Photo upload validation
//!
//! Only the filename's final extension is checked; content type is not
//! re-verified server-side.

use super::ValidationError;

/// Allowed photo extensions (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Check whether a filename ends in an allowed image extension.
///
/// # Example
/// ```
/// use storyshare_server::models::photo::allowed_file;
///
/// assert!(allowed_file("cat.JPG"));
/// assert!(allowed_file("archive.tar.png"));
/// assert!(!allowed_file("setup.exe"));
/// assert!(!allowed_file("png"));
/// ```
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Validated photo file awaiting upload
#[derive(Clone)]
pub struct PhotoUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Validate the filename and wrap the file contents.
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let filename = filename.into();
        if !allowed_file(&filename) {
            return Err(ValidationError::InvalidImageFormat { filename });
        }

        Ok(Self {
            filename,
            content_type,
            bytes,
        })
    }
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
