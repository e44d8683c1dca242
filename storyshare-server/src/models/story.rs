//! Story submission validation
//!
//! All four text fields must be present and non-blank after trimming.
//! Length limits are left to the store's column definitions.

use super::ValidationError;

/// Form field names, in submission order
pub const STORY_FIELDS: [&str; 4] = ["author_name", "title", "description", "content"];

/// Raw story form as received from the client
#[derive(Debug, Clone, Default)]
pub struct StoryForm {
    pub author_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

impl StoryForm {
    /// Record a text field by its form name.
    ///
    /// Returns `false` for names that are not story fields.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "author_name" => &mut self.author_name,
            "title" => &mut self.title,
            "description" => &mut self.description,
            "content" => &mut self.content,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Validate the form, trimming every field.
    ///
    /// # Example
    /// ```
    /// use storyshare_server::models::StoryForm;
    ///
    /// let mut form = StoryForm::default();
    /// form.set("author_name", " Ann ".into());
    /// form.set("title", "T".into());
    /// form.set("description", "D".into());
    /// assert!(form.clone().validate().is_err()); // content missing
    ///
    /// form.set("content", "C".into());
    /// assert_eq!(form.validate().unwrap().author_name, "Ann");
    /// ```
    pub fn validate(self) -> Result<NewStory, ValidationError> {
        let values = [self.author_name, self.title, self.description, self.content]
            .map(|v| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()));

        let missing: Vec<&'static str> = STORY_FIELDS
            .iter()
            .zip(values.iter())
            .filter(|(_, value)| value.is_none())
            .map(|(field, _)| *field)
            .collect();

        match values {
            [Some(author_name), Some(title), Some(description), Some(content)] => Ok(NewStory {
                author_name,
                title,
                description,
                content,
            }),
            _ => Err(ValidationError::MissingFields { fields: missing }),
        }
    }
}

/// Validated story ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStory {
    pub author_name: String,
    pub title: String,
    pub description: String,
    pub content: String,
}
