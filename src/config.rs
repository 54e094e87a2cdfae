//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the core.

// ===== Storage =====

/// Database file name inside the profile directory
pub const DB_FILE_NAME: &str = "db.sqlite";

// ===== Retention =====

/// How long soft-deleted notes and images stay restorable (30 days).
/// Records older than this are hard-deleted by the startup sweep.
pub const RETENTION_WINDOW_MS: i64 = 30 * 24 * 60 * 60 * 1000;

// ===== Navigation History =====

/// Maximum number of entries the navigation history retains.
/// Pushing beyond this evicts the oldest entry.
pub const HISTORY_STACK_LIMIT: usize = 512;

// ===== Notes =====

/// Maximum length of a title derived from note content
pub const TITLE_MAX_CHARS: usize = 30;

/// Title assigned to notes with no derivable first line
pub const DEFAULT_NOTE_TITLE: &str = "New Note";

/// Editor font size applied when neither the note nor the global
/// settings carry one
pub const DEFAULT_FONT_SIZE: u32 = 12;

/// Smallest accepted font size; updates below this are ignored
pub const MIN_FONT_SIZE: u32 = 1;

// ===== Export =====

/// Characters replaced with `_` when a note title becomes a filename
pub const FILE_NAME_RESERVED_CHARS: &[char] =
    &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Extension for a single exported note container
pub const NOTE_EXPORT_EXTENSION: &str = "snote";

/// Extension for a bulk export container (directory per note)
pub const BUNDLE_EXPORT_EXTENSION: &str = "snotes";
