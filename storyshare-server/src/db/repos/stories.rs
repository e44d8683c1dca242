//! Story repository
//!
//! Every statement is parameterized. The repository borrows a connection
//! that the caller acquired and will release.

use chrono::NaiveDateTime;
use sqlx::mysql::MySqlConnection;
use sqlx::FromRow;

use super::DbError;
use crate::models::NewStory;

/// Story identifier as assigned by the store
pub type StoryId = i64;

/// Timestamp format used when stories leave the repository
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Story record from database
#[derive(Debug, Clone, FromRow)]
pub struct StoryRow {
    pub id: StoryId,
    pub author_name: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub photo_url: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// Story with its timestamp already formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub id: StoryId,
    pub author_name: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub photo_url: Option<String>,
    pub created_at: Option<String>,
}

impl From<StoryRow> for Story {
    fn from(row: StoryRow) -> Self {
        Self {
            id: row.id,
            author_name: row.author_name,
            title: row.title,
            description: row.description,
            content: row.content,
            photo_url: row.photo_url,
            created_at: row
                .created_at
                .map(|ts| ts.format(CREATED_AT_FORMAT).to_string()),
        }
    }
}

/// Story repository
pub struct StoryRepo<'c> {
    conn: &'c mut MySqlConnection,
}

impl<'c> StoryRepo<'c> {
    pub fn new(conn: &'c mut MySqlConnection) -> Self {
        Self { conn }
    }

    /// List all stories, newest first.
    pub async fn list(&mut self) -> Result<Vec<Story>, DbError> {
        let rows: Vec<StoryRow> = sqlx::query_as(
            r#"
            SELECT
                CAST(id AS SIGNED) AS id,
                author_name,
                title,
                description,
                content,
                photo_url,
                created_at
            FROM stories
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Story::from).collect())
    }

    /// Insert a story, returning the id the store assigned.
    pub async fn insert(
        &mut self,
        story: &NewStory,
        photo_url: Option<&str>,
    ) -> Result<StoryId, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO stories (author_name, title, description, content, photo_url)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&story.author_name)
        .bind(&story.title)
        .bind(&story.description)
        .bind(&story.content)
        .bind(photo_url)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.last_insert_id() as StoryId)
    }

    /// Check whether a story with this id exists.
    pub async fn exists(&mut self, id: StoryId) -> Result<bool, DbError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stories WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(found != 0)
    }

    /// Delete one story by id, returning the number of rows removed.
    ///
    /// Zero rows is not an error: the story is gone either way.
    pub async fn delete(&mut self, id: StoryId) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(story_id = id, "Delete removed no rows, story already gone");
        }

        Ok(result.rows_affected())
    }
}
