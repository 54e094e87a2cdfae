//! Notes service
//!
//! Creation and persistence of notes, plus the list ordering rule shared
//! by every view of the active collection.

use crate::database::{Note, Repository};
use crate::error::Result;
use crate::services::settings::GlobalSettings;
use std::cmp::Ordering;

/// Sort notes for display: pinned notes first, ordered by ascending
/// `pinned_at` (earliest pin wins the top position), then unpinned notes
/// by descending `last_modified`. Stable, so equal keys keep their order.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| match (a.is_pinned, b.is_pinned) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a.pinned_at.unwrap_or(0).cmp(&b.pinned_at.unwrap_or(0)),
        (false, false) => b.metadata.last_modified.cmp(&a.metadata.last_modified),
    });
}

/// Service for managing notes
#[derive(Clone)]
pub struct NotesService {
    repo: Repository,
}

impl NotesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create and persist a fresh empty note
    pub async fn create_note(&self, globals: &GlobalSettings) -> Result<Note> {
        let note = Note::new(globals);

        self.repo.put_note(&note).await?;

        tracing::info!("Note created: {}", note.id);
        Ok(note)
    }

    /// Persist the current state of a note
    pub async fn save_note(&self, note: &Note) -> Result<()> {
        self.repo.put_note(note).await
    }
}
