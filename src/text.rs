//! Editor text transforms
//!
//! Pure functions over markdown text: paste-time transforms (tilde
//! escaping, hard-line-break augmentation), the Enter-key two-space
//! hard-break helper, and task-list checkbox toggling. The view layer owns
//! the textarea; everything here works on plain strings and byte offsets.

use crate::services::settings::GlobalSettings;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static TASK_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[x ]\]").expect("task marker pattern compiles"));

/// Escape literal tildes so pasted text cannot trigger strikethrough.
pub fn escape_tildes(text: &str) -> String {
    text.replace('~', "\\~")
}

/// Append two trailing spaces to every non-empty line except the last,
/// forcing markdown hard line breaks. Single-line text passes through
/// untouched. CRLF line endings are normalized to LF.
pub fn add_auto_line_breaks(text: &str) -> String {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    if lines.len() <= 1 {
        return text.to_string();
    }

    let last = lines.len() - 1;
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if index < last && !line.trim().is_empty() {
                format!("{}  ", line.trim_end())
            } else {
                (*line).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Transform pasted text according to the global settings: tilde escaping
/// first, then line-break augmentation. The transforms are independent and
/// composable.
pub fn process_pasted_text(text: &str, settings: &GlobalSettings) -> String {
    let mut processed = text.to_string();

    if settings.tilde_replacement {
        processed = escape_tildes(&processed);
    }

    if settings.auto_line_break {
        processed = add_auto_line_breaks(&processed);
    }

    processed
}

/// Replacement the editor applies in place of a bare Enter keypress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterEdit {
    /// Byte range to replace (trailing whitespace after the cursor on the
    /// current line; empty when inserting at the cursor).
    pub replace: Range<usize>,
    /// Text to insert: the hard-break padding plus the newline.
    pub insert: String,
}

/// Compute the edit that makes Enter produce a markdown hard break: the
/// text before the cursor ends with exactly two spaces before the inserted
/// newline. Returns `None` when the caller should insert a plain newline
/// instead (setting disabled, or the line before the cursor is blank).
///
/// `cursor` is a byte offset and must lie on a char boundary.
pub fn enter_key_edit(text: &str, cursor: usize, settings: &GlobalSettings) -> Option<EnterEdit> {
    if !settings.auto_add_spaces {
        return None;
    }

    let line_start = text[..cursor].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[cursor..]
        .find('\n')
        .map(|i| cursor + i)
        .unwrap_or(text.len());

    let before = &text[line_start..cursor];
    let after = &text[cursor..line_end];

    if before.trim().is_empty() {
        return None;
    }

    let trailing = before
        .chars()
        .rev()
        .take_while(|c| c.is_whitespace())
        .count();
    let pad = 2usize.saturating_sub(trailing);

    // Trailing whitespace after the cursor is swallowed; anything else on
    // the line stays and moves below the break.
    let replace_end = if !after.is_empty() && after.trim().is_empty() {
        line_end
    } else {
        cursor
    };

    Some(EnterEdit {
        replace: cursor..replace_end,
        insert: format!("{}\n", " ".repeat(pad)),
    })
}

/// Flip the state of the `index`-th task-list checkbox (`[ ]` or `[x]`)
/// in the content. Returns the rewritten content, or `None` when fewer
/// than `index + 1` checkboxes exist.
pub fn toggle_task(content: &str, index: usize) -> Option<String> {
    let found = TASK_MARKER_RE.find_iter(content).nth(index)?;
    let flipped = if found.as_str() == "[ ]" { "[x]" } else { "[ ]" };

    let mut updated = String::with_capacity(content.len());
    updated.push_str(&content[..found.start()]);
    updated.push_str(flipped);
    updated.push_str(&content[found.end()..]);
    Some(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(tilde: bool, line_break: bool, add_spaces: bool) -> GlobalSettings {
        GlobalSettings {
            tilde_replacement: tilde,
            auto_line_break: line_break,
            auto_add_spaces: add_spaces,
            ..GlobalSettings::default()
        }
    }

    #[test]
    fn test_escape_tildes() {
        assert_eq!(escape_tildes("a~b~~c"), "a\\~b\\~\\~c");
        assert_eq!(escape_tildes("plain"), "plain");
    }

    #[test]
    fn test_add_auto_line_breaks_single_line_untouched() {
        assert_eq!(add_auto_line_breaks("one line"), "one line");
    }

    #[test]
    fn test_add_auto_line_breaks_skips_blank_and_last_lines() {
        assert_eq!(add_auto_line_breaks("a\n\nb\nc"), "a  \n\nb  \nc");
    }

    #[test]
    fn test_add_auto_line_breaks_normalizes_existing_trailing_spaces() {
        assert_eq!(add_auto_line_breaks("a   \nb"), "a  \nb");
    }

    #[test]
    fn test_paste_transforms_compose() {
        let both = settings(true, true, true);
        assert_eq!(process_pasted_text("a~b\nc~d", &both), "a\\~b  \nc\\~d");
    }

    #[test]
    fn test_paste_transforms_respect_settings() {
        let neither = settings(false, false, true);
        assert_eq!(process_pasted_text("a~b\nc", &neither), "a~b\nc");

        let tilde_only = settings(true, false, true);
        assert_eq!(process_pasted_text("a~b\nc", &tilde_only), "a\\~b\nc");

        let breaks_only = settings(false, true, true);
        assert_eq!(process_pasted_text("a~b\nc", &breaks_only), "a~b  \nc");
    }

    #[test]
    fn test_enter_pads_to_two_spaces() {
        let s = settings(true, true, true);

        let edit = enter_key_edit("hello", 5, &s).unwrap();
        assert_eq!(edit.replace, 5..5);
        assert_eq!(edit.insert, "  \n");

        let edit = enter_key_edit("hello ", 6, &s).unwrap();
        assert_eq!(edit.insert, " \n");

        let edit = enter_key_edit("hello  ", 7, &s).unwrap();
        assert_eq!(edit.insert, "\n");
    }

    #[test]
    fn test_enter_declines_on_blank_line_or_disabled() {
        let s = settings(true, true, true);
        assert!(enter_key_edit("", 0, &s).is_none());
        assert!(enter_key_edit("line\n   ", 8, &s).is_none());

        let off = settings(true, true, false);
        assert!(enter_key_edit("hello", 5, &off).is_none());
    }

    #[test]
    fn test_enter_swallows_trailing_whitespace_after_cursor() {
        let s = settings(true, true, true);

        // Cursor after "hi", line continues with spaces only.
        let edit = enter_key_edit("hi   ", 2, &s).unwrap();
        assert_eq!(edit.replace, 2..5);
        assert_eq!(edit.insert, "  \n");
    }

    #[test]
    fn test_enter_splits_line_with_content_after_cursor() {
        let s = settings(true, true, true);

        let edit = enter_key_edit("hi there", 2, &s).unwrap();
        assert_eq!(edit.replace, 2..2);
        assert_eq!(edit.insert, "  \n");
    }

    #[test]
    fn test_enter_only_considers_current_line() {
        let s = settings(true, true, true);

        let text = "first\nsecond";
        let edit = enter_key_edit(text, text.len(), &s).unwrap();
        assert_eq!(edit.insert, "  \n");
    }

    #[test]
    fn test_toggle_task() {
        let content = "- [ ] one\n- [x] two\n- [ ] three";

        assert_eq!(
            toggle_task(content, 0).unwrap(),
            "- [x] one\n- [x] two\n- [ ] three"
        );
        assert_eq!(
            toggle_task(content, 1).unwrap(),
            "- [ ] one\n- [ ] two\n- [ ] three"
        );
        assert!(toggle_task(content, 3).is_none());
    }
}
