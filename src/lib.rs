//! SimpleNotes core
//!
//! UI-agnostic engine for a markdown side-panel note-taking extension:
//! persistence, soft-delete retention, navigation history, the note/settings
//! model, and import/export packaging. The view layer lives outside this
//! crate and drives everything through [`app::App`].

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod history;
pub mod services;
pub mod text;
pub mod util;
