//! Application controller
//!
//! `App` owns the whole application state (active notes, recycle bin,
//! global settings, active note id, navigation history) and exposes the
//! intent methods the view layer calls. All mutation flows through
//! `&mut self` on this single owner, which is what makes the
//! single-threaded model explicit; a host that wants real parallelism must
//! wrap `App` in its own synchronization.
//!
//! Retention operations write the store first and only then touch the
//! in-memory collections, so a failed write never leaves memory and
//! storage disagreeing.

use crate::config::{
    BUNDLE_EXPORT_EXTENSION, DB_FILE_NAME, MIN_FONT_SIZE, NOTE_EXPORT_EXTENSION,
    RETENTION_WINDOW_MS,
};
use crate::database::{self, derive_title, Note, Repository, TitleSource};
use crate::error::{AppError, Result};
use crate::history::{NavEntry, NavigationHistory, PushOutcome};
use crate::services::images::{embed_markdown, ImageStatus};
use crate::services::notes::sort_notes;
use crate::services::retention::{ImageDeletion, SweepReport};
use crate::services::settings::{ColorMode, GlobalSettings};
use crate::services::{
    ImagesService, NotesService, PackagingService, RetentionService, SettingsService,
};
use crate::text::{self, EnterEdit};
use crate::util::now_ms;
use std::path::Path;

/// What a content mutation changed besides the content itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentEdit {
    /// The derived title changed, so the note list needs a re-render
    pub title_changed: bool,
}

/// Shared mutable application state, owned by the controller
pub struct AppState {
    /// Active notes in display order
    pub notes: Vec<Note>,
    /// Recycle bin contents
    pub deleted_notes: Vec<Note>,
    pub settings: GlobalSettings,
    pub active_note_id: Option<String>,
    pub history: NavigationHistory,
}

/// Central controller wiring services and state together
pub struct App {
    settings_service: SettingsService,
    notes_service: NotesService,
    images: ImagesService,
    retention: RetentionService,
    packaging: PackagingService,
    state: AppState,
}

impl App {
    /// Open the store under the given profile directory, load settings and
    /// notes, run the retention sweep, and start the history at the list
    /// view.
    pub async fn init(profile_dir: &Path) -> Result<Self> {
        tracing::info!("Initializing application core at {:?}", profile_dir);

        std::fs::create_dir_all(profile_dir)?;

        let pool = database::create_pool(&profile_dir.join(DB_FILE_NAME)).await?;
        let repo = Repository::new(pool);

        let settings_service = SettingsService::new(profile_dir.to_path_buf());
        let settings = settings_service.load().await?;

        let all_notes = repo.get_all_notes().await?;
        let (mut notes, deleted_notes): (Vec<Note>, Vec<Note>) =
            all_notes.into_iter().partition(|n| !n.is_deleted());
        sort_notes(&mut notes);

        let retention = RetentionService::new(repo.clone());
        let report = retention.sweep(RETENTION_WINDOW_MS).await?;
        let deleted_notes = deleted_notes
            .into_iter()
            .filter(|n| !report.notes.contains(&n.id))
            .collect();

        let mut history = NavigationHistory::new();
        history.push(NavEntry::List);

        tracing::info!("Application core ready");

        Ok(Self {
            notes_service: NotesService::new(repo.clone()),
            images: ImagesService::new(repo.clone()),
            packaging: PackagingService::new(repo),
            retention,
            settings_service,
            state: AppState {
                notes,
                deleted_notes,
                settings,
                active_note_id: None,
                history,
            },
        })
    }

    // ===== State access =====

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn deleted_notes(&self) -> &[Note] {
        &self.state.deleted_notes
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.state.settings
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.state.history
    }

    pub fn active_note(&self) -> Option<&Note> {
        let id = self.state.active_note_id.as_deref()?;
        self.state.notes.iter().find(|n| n.id == id)
    }

    /// Forwarded to the history so the view can refresh its dropdown when
    /// a push discards forward entries.
    pub fn set_history_truncation_observer(&mut self, observer: Box<dyn FnMut() + Send>) {
        self.state.history.set_truncation_observer(observer);
    }

    // ===== Note lifecycle =====

    /// Create an empty note, open it in the editor, and record the visit
    pub async fn create_note(&mut self) -> Result<&Note> {
        let note = self.notes_service.create_note(&self.state.settings).await?;
        let id = note.id.clone();

        self.state.notes.push(note);
        sort_notes(&mut self.state.notes);
        self.state.active_note_id = Some(id.clone());
        self.state.history.push(NavEntry::Editor {
            note_id: id.clone(),
            in_edit_mode: true,
        });

        self.state
            .notes
            .iter()
            .find(|n| n.id == id)
            .ok_or(AppError::RecordNotFound(id))
    }

    /// Open an existing active note and record the visit
    pub fn open_note(&mut self, id: &str, in_edit_mode: bool) -> Result<&Note> {
        let index = self
            .state
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        self.state.active_note_id = Some(id.to_string());
        self.state.history.push(NavEntry::Editor {
            note_id: id.to_string(),
            in_edit_mode,
        });

        Ok(&self.state.notes[index])
    }

    /// Apply an editor content change: refresh `last_modified`, recompute
    /// the title when it is derived from content, re-sort, persist.
    pub async fn edit_note_content(&mut self, id: &str, content: String) -> Result<ContentEdit> {
        let settings = &self.state.settings;
        let note = self
            .state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        note.content = content;
        note.metadata.last_modified = now_ms();

        let mut title_changed = false;
        if note.effective_title_source(settings) == TitleSource::Default {
            let derived = derive_title(&note.content);
            if note.title != derived {
                note.title = derived;
                title_changed = true;
            }
        }

        let snapshot = note.clone();
        sort_notes(&mut self.state.notes);
        self.notes_service.save_note(&snapshot).await?;

        Ok(ContentEdit { title_changed })
    }

    /// Set a custom title directly; switches the note's title source to
    /// custom if it was still derived.
    pub async fn rename_note(&mut self, id: &str, title: String) -> Result<()> {
        let note = self
            .state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        note.settings.title = Some(TitleSource::Custom);
        note.title = title;
        note.metadata.last_modified = now_ms();

        let snapshot = note.clone();
        sort_notes(&mut self.state.notes);
        self.notes_service.save_note(&snapshot).await
    }

    /// Flip the `index`-th task-list checkbox in the note's content
    pub async fn toggle_task(&mut self, id: &str, index: usize) -> Result<ContentEdit> {
        let updated = {
            let note = self
                .state
                .notes
                .iter()
                .find(|n| n.id == id)
                .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;
            text::toggle_task(&note.content, index)
        };

        match updated {
            Some(content) => self.edit_note_content(id, content).await,
            None => Ok(ContentEdit {
                title_changed: false,
            }),
        }
    }

    /// Toggle a note's pinned state. Pinning stamps `pinned_at`;
    /// unpinning clears it. Does not touch `last_modified`.
    pub async fn toggle_pin(&mut self, id: &str) -> Result<()> {
        let note = self
            .state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        note.is_pinned = !note.is_pinned;
        note.pinned_at = note.is_pinned.then(now_ms);

        let snapshot = note.clone();
        sort_notes(&mut self.state.notes);
        self.notes_service.save_note(&snapshot).await
    }

    /// Soft-delete a note into the recycle bin. The store is written
    /// first; the note moves between the in-memory lists only after the
    /// write succeeds. Deleting a missing id is a silent success.
    pub async fn delete_note(&mut self, id: &str) -> Result<()> {
        let Some(stamp) = self.retention.soft_delete_note(id).await? else {
            return Ok(());
        };

        if let Some(index) = self.state.notes.iter().position(|n| n.id == id) {
            let mut note = self.state.notes.remove(index);
            note.metadata.deleted_at = Some(stamp);
            self.state.deleted_notes.push(note);
        }

        if self.state.active_note_id.as_deref() == Some(id) {
            self.state.active_note_id = None;
        }

        Ok(())
    }

    /// Move a note out of the recycle bin back into the active list
    pub async fn restore_note(&mut self, id: &str) -> Result<()> {
        let Some(stamp) = self.retention.restore_note(id).await? else {
            return Ok(());
        };

        if let Some(index) = self.state.deleted_notes.iter().position(|n| n.id == id) {
            let mut note = self.state.deleted_notes.remove(index);
            note.metadata.deleted_at = None;
            note.metadata.last_modified = stamp;
            self.state.notes.push(note);
            sort_notes(&mut self.state.notes);
        }

        Ok(())
    }

    /// Hard-delete a note from the recycle bin, bypassing the age check
    pub async fn delete_note_permanently(&mut self, id: &str) -> Result<()> {
        self.retention.permanently_delete_note(id).await?;
        self.state.deleted_notes.retain(|n| n.id != id);
        Ok(())
    }

    /// Hard-delete every recycled note and image
    pub async fn empty_recycle_bin(&mut self) -> Result<()> {
        for note in &self.state.deleted_notes {
            self.retention.permanently_delete_note(&note.id).await?;
        }
        self.state.deleted_notes.clear();

        self.retention.purge_deleted_images().await?;
        Ok(())
    }

    /// Run the retention sweep on demand. Also runs once during
    /// [`App::init`].
    pub async fn sweep(&mut self) -> Result<SweepReport> {
        let report = self.retention.sweep(RETENTION_WINDOW_MS).await?;
        self.state
            .deleted_notes
            .retain(|n| !report.notes.contains(&n.id));
        Ok(report)
    }

    // ===== Settings =====

    pub async fn set_note_title_source(&mut self, id: &str, source: TitleSource) -> Result<()> {
        let note = self
            .state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        note.settings.title = Some(source);
        note.metadata.last_modified = now_ms();
        if source == TitleSource::Default {
            note.title = derive_title(&note.content);
        }

        let snapshot = note.clone();
        sort_notes(&mut self.state.notes);
        self.notes_service.save_note(&snapshot).await
    }

    /// Ignores sizes below the minimum instead of erroring, matching how
    /// the settings form swallows invalid input.
    pub async fn set_note_font_size(&mut self, id: &str, size: u32) -> Result<()> {
        if size < MIN_FONT_SIZE {
            tracing::warn!("Ignoring invalid font size: {}", size);
            return Ok(());
        }

        let note = self
            .state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        note.settings.font_size = Some(size);
        note.metadata.last_modified = now_ms();

        let snapshot = note.clone();
        sort_notes(&mut self.state.notes);
        self.notes_service.save_note(&snapshot).await
    }

    pub async fn set_global_title_source(&mut self, source: TitleSource) -> Result<()> {
        self.state.settings.title = source;
        self.settings_service.save(&self.state.settings).await
    }

    pub async fn set_global_font_size(&mut self, size: u32) -> Result<()> {
        if size < MIN_FONT_SIZE {
            tracing::warn!("Ignoring invalid font size: {}", size);
            return Ok(());
        }
        self.state.settings.font_size = size;
        self.settings_service.save(&self.state.settings).await
    }

    pub async fn set_color_mode(&mut self, mode: ColorMode) -> Result<()> {
        self.state.settings.mode = mode;
        self.settings_service.save(&self.state.settings).await
    }

    /// Returns the new value
    pub async fn toggle_auto_line_break(&mut self) -> Result<bool> {
        self.state.settings.auto_line_break = !self.state.settings.auto_line_break;
        self.settings_service.save(&self.state.settings).await?;
        Ok(self.state.settings.auto_line_break)
    }

    /// Returns the new value
    pub async fn toggle_tilde_replacement(&mut self) -> Result<bool> {
        self.state.settings.tilde_replacement = !self.state.settings.tilde_replacement;
        self.settings_service.save(&self.state.settings).await?;
        Ok(self.state.settings.tilde_replacement)
    }

    pub async fn set_auto_add_spaces(&mut self, enabled: bool) -> Result<()> {
        self.state.settings.auto_add_spaces = enabled;
        self.settings_service.save(&self.state.settings).await
    }

    pub async fn set_prevent_used_image_deletion(&mut self, enabled: bool) -> Result<()> {
        self.state.settings.prevent_used_image_deletion = enabled;
        self.settings_service.save(&self.state.settings).await
    }

    // ===== Editor text transforms =====

    /// Transform pasted text according to the global settings
    pub fn transform_paste(&self, raw: &str) -> String {
        text::process_pasted_text(raw, &self.state.settings)
    }

    /// Edit to apply instead of a bare Enter keypress, if any
    pub fn enter_key_edit(&self, content: &str, cursor: usize) -> Option<EnterEdit> {
        text::enter_key_edit(content, cursor, &self.state.settings)
    }

    // ===== Images =====

    /// Store pasted image bytes; returns the markdown snippet the editor
    /// inserts at the cursor.
    pub async fn attach_image(&self, data: Vec<u8>) -> Result<String> {
        let id = self.images.attach(data).await?;
        Ok(embed_markdown(&id))
    }

    /// Blob for an active image, for the preview layer
    pub async fn image_data(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.images.fetch_active(id).await
    }

    /// Usage overview of every active image
    pub async fn image_overview(&self) -> Result<Vec<ImageStatus>> {
        self.images.overview(&self.state.notes).await
    }

    /// Soft-delete an image, subject to the used-image deletion guard
    pub async fn delete_image(&self, id: &str) -> Result<ImageDeletion> {
        self.retention
            .soft_delete_image(id, &self.state.notes, &self.state.settings)
            .await
    }

    pub async fn restore_image(&self, id: &str) -> Result<()> {
        self.retention.restore_image(id).await
    }

    pub async fn delete_image_permanently(&self, id: &str) -> Result<()> {
        self.retention.permanently_delete_image(id).await
    }

    // ===== Import / export =====

    /// Package a single active note; returns the download filename and the
    /// container bytes.
    pub async fn export_note(&self, id: &str) -> Result<(String, Vec<u8>)> {
        let note = self
            .state
            .notes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        let bytes = self.packaging.export_note(note).await?;
        Ok((PackagingService::export_file_name(note), bytes))
    }

    /// Package every active note as a bundle
    pub async fn export_all_notes(&self) -> Result<(String, Vec<u8>)> {
        let bytes = self.packaging.export_all(&self.state.notes).await?;
        Ok((PackagingService::bundle_file_name(), bytes))
    }

    /// Import a `.snote` or `.snotes` container picked by the user.
    /// Returns the ids of the notes added to the active list.
    pub async fn import_archive(&mut self, file_name: &str, bytes: &[u8]) -> Result<Vec<String>> {
        let mut imported = Vec::new();

        if file_name.ends_with(&format!(".{NOTE_EXPORT_EXTENSION}")) {
            let mut note = self.packaging.import_note(bytes).await?;
            note.metadata.last_modified = now_ms();
            self.notes_service.save_note(&note).await?;
            imported.push(note.id.clone());
            self.state.notes.push(note);
        } else if file_name.ends_with(&format!(".{BUNDLE_EXPORT_EXTENSION}")) {
            let notes = self.packaging.import_bundle(bytes).await?;
            let now = now_ms();
            // Re-stamp in order so relative recency survives while the
            // whole batch surfaces at the top of the list.
            for (offset, mut note) in notes.into_iter().enumerate() {
                note.metadata.last_modified = now + offset as i64;
                self.notes_service.save_note(&note).await?;
                imported.push(note.id.clone());
                self.state.notes.push(note);
            }
        } else {
            return Err(AppError::MalformedContainer(format!(
                "unsupported container: {file_name}"
            )));
        }

        sort_notes(&mut self.state.notes);
        tracing::info!("Imported {} notes", imported.len());
        Ok(imported)
    }

    /// Replace an existing note's title, content, and settings from a
    /// single-note container, keeping its id.
    pub async fn import_into_note(&mut self, id: &str, bytes: &[u8]) -> Result<()> {
        let imported = self.packaging.import_note(bytes).await?;

        let note = self
            .state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        note.title = imported.title;
        note.content = imported.content;
        note.settings = imported.settings;
        note.metadata.last_modified = now_ms();

        let snapshot = note.clone();
        sort_notes(&mut self.state.notes);
        self.notes_service.save_note(&snapshot).await
    }

    // ===== Navigation =====

    /// Return to the root list view. List view is home: the history is
    /// cleared rather than extended.
    pub fn show_list(&mut self) {
        self.state.active_note_id = None;
        self.state.history.clear();
        self.state.history.push(NavEntry::List);
    }

    pub fn open_settings(&mut self, is_global: bool) -> PushOutcome {
        self.state.history.push(NavEntry::Settings {
            is_global,
            note_id: self.state.active_note_id.clone(),
        })
    }

    pub fn open_recycle_bin(&mut self) -> PushOutcome {
        self.state.history.push(NavEntry::RecycleBin)
    }

    pub fn open_image_management(&mut self) -> PushOutcome {
        self.state.history.push(NavEntry::ImageManagement)
    }

    pub fn open_license(&mut self) -> PushOutcome {
        self.state.history.push(NavEntry::License)
    }

    /// Step back in the history; `None` means already at the root, which
    /// callers treat as "stay on the list view".
    pub fn go_back(&mut self) -> Option<NavEntry> {
        let entry = self.state.history.move_back().cloned();
        if let Some(entry) = &entry {
            self.apply_nav_entry(entry);
        }
        entry
    }

    pub fn go_forward(&mut self) -> Option<NavEntry> {
        let entry = self.state.history.move_forward().cloned();
        if let Some(entry) = &entry {
            self.apply_nav_entry(entry);
        }
        entry
    }

    /// Jump to an arbitrary recorded entry from the history browser.
    /// Browsing never truncates.
    pub fn jump_to(&mut self, index: usize) -> Option<NavEntry> {
        let entry = self.state.history.jump_to(index).cloned();
        if let Some(entry) = &entry {
            self.apply_nav_entry(entry);
        }
        entry
    }

    pub fn current_view(&self) -> Option<&NavEntry> {
        self.state.history.current()
    }

    fn apply_nav_entry(&mut self, entry: &NavEntry) {
        match entry {
            NavEntry::List => self.state.active_note_id = None,
            NavEntry::Editor { note_id, .. } => {
                self.state.active_note_id = Some(note_id.clone());
            }
            NavEntry::Settings {
                is_global: false,
                note_id: Some(note_id),
            } => {
                self.state.active_note_id = Some(note_id.clone());
            }
            _ => {}
        }
    }
}
