//! Navigation history
//!
//! A bounded array-plus-cursor record of view states. Unlike a plain LIFO
//! stack it keeps "forward" entries alive after the user navigates back,
//! so back/forward/jump can revisit them; pushing a genuinely new state
//! from a past position discards the invalidated forward branch.

use crate::config::HISTORY_STACK_LIMIT;
use serde::{Deserialize, Serialize};

/// A recorded view state. Serializes as `{ "view": ..., "params": ... }`
/// for the history-browsing dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", content = "params", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum NavEntry {
    List,
    Editor {
        note_id: String,
        in_edit_mode: bool,
    },
    Settings {
        is_global: bool,
        note_id: Option<String>,
    },
    License,
    RecycleBin,
    ImageManagement,
}

/// What a [`NavigationHistory::push`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Entry equals the current state; nothing changed.
    Duplicate,
    /// Entry appended at the tail.
    Pushed,
    /// A forward branch was discarded before appending.
    PushedTruncated,
}

/// Bounded stack-with-cursor over [`NavEntry`] values.
pub struct NavigationHistory {
    entries: Vec<NavEntry>,
    /// Index of the current state; `None` while the history is empty.
    cursor: Option<usize>,
    on_truncate: Option<Box<dyn FnMut() + Send>>,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            on_truncate: None,
        }
    }

    /// Register a callback invoked whenever a push discards forward
    /// entries, so a history-browsing UI can refresh itself.
    pub fn set_truncation_observer(&mut self, observer: Box<dyn FnMut() + Send>) {
        self.on_truncate = Some(observer);
    }

    /// Record a new state.
    ///
    /// Pushing the state already under the cursor is a no-op, preventing
    /// duplicate consecutive entries. Pushing from a position before the
    /// tail discards everything after the cursor first. Exceeding the
    /// capacity evicts the oldest entry; the cursor shifts down by one so
    /// it keeps pointing at the same logical entry.
    pub fn push(&mut self, entry: NavEntry) -> PushOutcome {
        if self.current() == Some(&entry) {
            return PushOutcome::Duplicate;
        }

        let mut truncated = false;
        if let Some(cursor) = self.cursor {
            if cursor + 1 < self.entries.len() {
                self.entries.truncate(cursor + 1);
                truncated = true;
                if let Some(observer) = self.on_truncate.as_mut() {
                    observer();
                }
            }
        }

        self.entries.push(entry);
        self.cursor = Some(self.entries.len() - 1);

        if self.entries.len() > HISTORY_STACK_LIMIT {
            self.entries.remove(0);
            self.cursor = self.cursor.and_then(|c| c.checked_sub(1));
        }

        if truncated {
            PushOutcome::PushedTruncated
        } else {
            PushOutcome::Pushed
        }
    }

    /// Step the cursor back and return the entry now under it, or `None`
    /// when already at the root.
    pub fn move_back(&mut self) -> Option<&NavEntry> {
        let cursor = self.cursor?;
        if cursor == 0 {
            return None;
        }
        self.cursor = Some(cursor - 1);
        self.entries.get(cursor - 1)
    }

    /// Step the cursor forward and return the entry now under it, or
    /// `None` when already at the tail.
    pub fn move_forward(&mut self) -> Option<&NavEntry> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor = Some(cursor + 1);
        self.entries.get(cursor + 1)
    }

    pub fn can_move_back(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_move_forward(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    /// The entry under the cursor, without moving it.
    pub fn current(&self) -> Option<&NavEntry> {
        self.entries.get(self.cursor?)
    }

    /// Move the cursor to an arbitrary recorded index. Browsing the
    /// timeline never discards entries, unlike [`Self::push`]. Returns the
    /// entry on success, `None` for an out-of-range index.
    pub fn jump_to(&mut self, index: usize) -> Option<&NavEntry> {
        if index >= self.entries.len() {
            return None;
        }
        self.cursor = Some(index);
        self.entries.get(index)
    }

    /// Drop every entry and reset the cursor to the empty sentinel.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// The recorded timeline, oldest first.
    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
