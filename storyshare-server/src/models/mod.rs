//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod story;
pub mod photo;
pub mod admin;

pub use validation::ValidationError;
pub use story::{NewStory, StoryForm};
pub use photo::PhotoUpload;
pub use admin::AdminCredentials;
