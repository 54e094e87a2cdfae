//! Repository layer for database operations
//!
//! Key-value style access to the two stored collections. `put` is an
//! upsert, `get` returns `None` for missing ids, `get_all` is unordered
//! (callers sort), and `delete` is idempotent.

use super::models::{ImageRecord, Note};
use crate::error::Result;
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a note record
    pub async fn put_note(&self, note: &Note) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notes (
                id, title, content, title_source, font_size,
                created_at, last_modified, deleted_at, is_pinned, pinned_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                title_source = excluded.title_source,
                font_size = excluded.font_size,
                created_at = excluded.created_at,
                last_modified = excluded.last_modified,
                deleted_at = excluded.deleted_at,
                is_pinned = excluded.is_pinned,
                pinned_at = excluded.pinned_at
            "#,
        )
        .bind(&note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.settings.title)
        .bind(note.settings.font_size)
        .bind(note.metadata.created_at)
        .bind(note.metadata.last_modified)
        .bind(note.metadata.deleted_at)
        .bind(note.is_pinned)
        .bind(note.pinned_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored note: {}", note.id);
        Ok(())
    }

    /// Get a note by ID
    pub async fn get_note(&self, id: &str) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(note)
    }

    /// All note records, active and deleted alike, in unspecified order
    pub async fn get_all_notes(&self) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>("SELECT * FROM notes")
            .fetch_all(&self.pool)
            .await?;

        Ok(notes)
    }

    /// Hard-delete a note. Deleting a missing id succeeds silently.
    pub async fn delete_note(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Hard deleted note: {}", id);
        Ok(())
    }

    /// Insert or replace an image record
    pub async fn put_image(&self, image: &ImageRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO images (id, blob, deleted_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                blob = excluded.blob,
                deleted_at = excluded.deleted_at
            "#,
        )
        .bind(&image.id)
        .bind(&image.blob)
        .bind(image.deleted_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored image: {} ({} bytes)", image.id, image.blob.len());
        Ok(())
    }

    /// Get an image by ID
    pub async fn get_image(&self, id: &str) -> Result<Option<ImageRecord>> {
        let image = sqlx::query_as::<_, ImageRecord>("SELECT * FROM images WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(image)
    }

    /// All image records, active and deleted alike, in unspecified order
    pub async fn get_all_images(&self) -> Result<Vec<ImageRecord>> {
        let images = sqlx::query_as::<_, ImageRecord>("SELECT * FROM images")
            .fetch_all(&self.pool)
            .await?;

        Ok(images)
    }

    /// Hard-delete an image. Deleting a missing id succeeds silently.
    pub async fn delete_image(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Hard deleted image: {}", id);
        Ok(())
    }
}
