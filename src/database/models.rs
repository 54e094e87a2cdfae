//! Database models
//!
//! Rust structs representing persisted entities. Notes and images are the
//! two stored collections; serde field names are camelCase so exported
//! containers round-trip with the side-panel frontend.

use crate::config::{DEFAULT_NOTE_TITLE, TITLE_MAX_CHARS};
use crate::services::settings::GlobalSettings;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Where a note's display title comes from: derived from the first content
/// line, or set by hand.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TitleSource {
    #[default]
    Default,
    Custom,
}

/// Per-note setting overrides. Absent fields fall back to the global
/// settings, which in turn fall back to hardcoded defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NoteSettings {
    #[sqlx(rename = "title_source")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<TitleSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
}

/// Lifecycle timestamps, all epoch milliseconds. `deleted_at` present means
/// the note sits in the recycle bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    pub created_at: i64,
    pub last_modified: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

/// A markdown note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[sqlx(flatten)]
    pub settings: NoteSettings,
    #[sqlx(flatten)]
    pub metadata: NoteMetadata,
    pub is_pinned: bool,
    /// Present only while pinned; orders pinned notes earliest-first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<i64>,
}

impl Note {
    /// Create a fresh empty note. The editor font size is captured from the
    /// global settings at creation time, matching how new notes are seeded.
    pub fn new(globals: &GlobalSettings) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_NOTE_TITLE.to_string(),
            content: String::new(),
            settings: NoteSettings {
                title: None,
                font_size: Some(globals.font_size),
            },
            metadata: NoteMetadata {
                created_at: now,
                last_modified: now,
                deleted_at: None,
            },
            is_pinned: false,
            pinned_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.metadata.deleted_at.is_some()
    }

    /// Note setting, falling back to the global setting.
    pub fn effective_title_source(&self, globals: &GlobalSettings) -> TitleSource {
        self.settings.title.unwrap_or(globals.title)
    }

    /// Note setting, falling back to the global setting (which itself
    /// defaults to [`crate::config::DEFAULT_FONT_SIZE`]).
    pub fn effective_font_size(&self, globals: &GlobalSettings) -> u32 {
        self.settings.font_size.unwrap_or(globals.font_size)
    }
}

/// Derive a display title from note content: first line of the trimmed
/// text, truncated, with a fallback for empty notes.
pub fn derive_title(content: &str) -> String {
    let first_line = content.trim().lines().next().unwrap_or("");
    let title: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
    if title.is_empty() {
        DEFAULT_NOTE_TITLE.to_string()
    } else {
        title
    }
}

/// A stored image blob, referenced from note content by id
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ImageRecord {
    pub id: String,
    pub blob: Vec<u8>,
    /// Soft-delete stamp; `None` means active.
    pub deleted_at: Option<i64>,
}

impl ImageRecord {
    pub fn new(id: String, blob: Vec<u8>) -> Self {
        Self {
            id,
            blob,
            deleted_at: None,
        }
    }
}
