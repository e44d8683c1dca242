//! Validation error types

use std::fmt;

/// Validation error for submitted input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields are absent or blank
    MissingFields { fields: Vec<&'static str> },

    /// Photo filename carries an extension outside the allowed set
    InvalidImageFormat { filename: String },

    /// Input could not be parsed into the expected shape
    InvalidFormat { field: &'static str, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields { .. } => write!(f, "All fields are required"),
            Self::InvalidImageFormat { .. } => write!(f, "Invalid image format"),
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
        }
    }
}

impl std::error::Error for ValidationError {}
