//! Retention service
//!
//! Soft-delete lifecycle for notes and images: stamping records into the
//! recycle bin, restoring them, and the retention sweep that hard-deletes
//! records older than the retention window. Every operation writes the
//! store first and reports what changed, so callers only touch their
//! in-memory collections after the write has succeeded.

use crate::database::{Note, Repository};
use crate::error::Result;
use crate::services::settings::GlobalSettings;
use crate::util::now_ms;

/// Outcome of a gated image soft-delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageDeletion {
    /// Image stamped into the recycle bin
    Deleted,
    /// Refused: the deletion guard is on and a note still references the
    /// image. Not an error; retrying after the reference (or the setting)
    /// goes away succeeds.
    RefusedInUse,
    /// No such image; treated as success
    Missing,
}

/// Ids hard-deleted by a retention sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub notes: Vec<String>,
    pub images: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.images.is_empty()
    }
}

/// Service for the soft-delete/restore/sweep lifecycle
#[derive(Clone)]
pub struct RetentionService {
    repo: Repository,
}

impl RetentionService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Stamp a note into the recycle bin. Returns the stamp so callers can
    /// mirror it onto their in-memory copy; `None` means the id was absent
    /// and nothing happened.
    pub async fn soft_delete_note(&self, id: &str) -> Result<Option<i64>> {
        let Some(mut note) = self.repo.get_note(id).await? else {
            return Ok(None);
        };

        let stamp = now_ms();
        note.metadata.deleted_at = Some(stamp);
        self.repo.put_note(&note).await?;

        tracing::info!("Soft deleted note: {}", id);
        Ok(Some(stamp))
    }

    /// Clear a note's soft-delete stamp and refresh `last_modified` so the
    /// restored note surfaces at the top of the list. Pin state is left
    /// exactly as it was before deletion. Returns the new `last_modified`.
    pub async fn restore_note(&self, id: &str) -> Result<Option<i64>> {
        let Some(mut note) = self.repo.get_note(id).await? else {
            return Ok(None);
        };

        let stamp = now_ms();
        note.metadata.deleted_at = None;
        note.metadata.last_modified = stamp;
        self.repo.put_note(&note).await?;

        tracing::info!("Restored note: {}", id);
        Ok(Some(stamp))
    }

    /// Hard-delete a note regardless of age
    pub async fn permanently_delete_note(&self, id: &str) -> Result<()> {
        self.repo.delete_note(id).await?;
        tracing::info!("Permanently deleted note: {}", id);
        Ok(())
    }

    /// Stamp an image into the recycle bin, unless the deletion guard
    /// refuses it because an active note still references the id.
    pub async fn soft_delete_image(
        &self,
        id: &str,
        active_notes: &[Note],
        settings: &GlobalSettings,
    ) -> Result<ImageDeletion> {
        if settings.prevent_used_image_deletion
            && active_notes.iter().any(|note| note.content.contains(id))
        {
            tracing::debug!("Refusing to delete referenced image: {}", id);
            return Ok(ImageDeletion::RefusedInUse);
        }

        let Some(mut image) = self.repo.get_image(id).await? else {
            return Ok(ImageDeletion::Missing);
        };

        image.deleted_at = Some(now_ms());
        self.repo.put_image(&image).await?;

        tracing::info!("Soft deleted image: {}", id);
        Ok(ImageDeletion::Deleted)
    }

    /// Clear an image's soft-delete stamp
    pub async fn restore_image(&self, id: &str) -> Result<()> {
        let Some(mut image) = self.repo.get_image(id).await? else {
            return Ok(());
        };

        image.deleted_at = None;
        self.repo.put_image(&image).await?;

        tracing::info!("Restored image: {}", id);
        Ok(())
    }

    /// Hard-delete an image regardless of age
    pub async fn permanently_delete_image(&self, id: &str) -> Result<()> {
        self.repo.delete_image(id).await?;
        tracing::info!("Permanently deleted image: {}", id);
        Ok(())
    }

    /// Hard-delete every soft-deleted record older than the retention
    /// window, in both collections. Returns the purged ids so callers can
    /// drop them from in-memory collections.
    pub async fn sweep(&self, retention_window_ms: i64) -> Result<SweepReport> {
        let cutoff = now_ms() - retention_window_ms;
        let mut report = SweepReport::default();

        for note in self.repo.get_all_notes().await? {
            if matches!(note.metadata.deleted_at, Some(stamp) if stamp < cutoff) {
                self.repo.delete_note(&note.id).await?;
                report.notes.push(note.id);
            }
        }

        for image in self.repo.get_all_images().await? {
            if matches!(image.deleted_at, Some(stamp) if stamp < cutoff) {
                self.repo.delete_image(&image.id).await?;
                report.images.push(image.id);
            }
        }

        if !report.is_empty() {
            tracing::info!(
                "Retention sweep purged {} notes, {} images",
                report.notes.len(),
                report.images.len()
            );
        }

        Ok(report)
    }

    /// Hard-delete every soft-deleted image, bypassing the age check.
    /// Part of emptying the recycle bin.
    pub async fn purge_deleted_images(&self) -> Result<Vec<String>> {
        let mut purged = Vec::new();

        for image in self.repo.get_all_images().await? {
            if image.deleted_at.is_some() {
                self.repo.delete_image(&image.id).await?;
                purged.push(image.id);
            }
        }

        Ok(purged)
    }
}
