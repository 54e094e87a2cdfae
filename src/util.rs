//! Small shared helpers: timestamps, filename sanitization, and the
//! image embed pattern scanner.

use crate::config::FILE_NAME_RESERVED_CHARS;
use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Markdown image embeds look like `![alt](images/<id>.png)`.
static IMAGE_EMBED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\(images/([^)]+?)\.png\)").expect("embed pattern compiles"));

/// Current time as epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp string used in bulk export filenames, e.g. `2026_08_05_14_03_59`.
pub fn export_timestamp() -> String {
    Local::now().format("%Y_%m_%d_%H_%M_%S").to_string()
}

/// Replace filesystem-reserved characters with underscores.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FILE_NAME_RESERVED_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Collect the ids of every image embedded in the given markdown content,
/// de-duplicated, in order of first appearance.
pub fn extract_image_ids(content: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for cap in IMAGE_EMBED_RE.captures_iter(content) {
        let id = cap[1].to_string();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("normal title"), "normal title");
        assert_eq!(sanitize_file_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_file_name("what?*|\"<>%"), "what_______");
    }

    #[test]
    fn test_extract_image_ids() {
        let content = "intro\n![Image](images/abc-123.png)\ntext ![x](images/def.png)";
        assert_eq!(extract_image_ids(content), vec!["abc-123", "def"]);
    }

    #[test]
    fn test_extract_image_ids_deduplicates() {
        let content = "![a](images/one.png) ![b](images/one.png) ![c](images/two.png)";
        assert_eq!(extract_image_ids(content), vec!["one", "two"]);
    }

    #[test]
    fn test_extract_image_ids_ignores_plain_links() {
        let content = "[not an image](images/abc.png) and ![no match](other/abc.png)";
        assert!(extract_image_ids(content).is_empty());
    }
}
