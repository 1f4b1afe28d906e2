//! Filename schemes for per-entry files

use crate::domain::JournalEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Extension of every per-entry file
pub const ENTRY_EXTENSION: &str = "journal";

/// Stem used when a title sanitizes to nothing
const UNTITLED_STEM: &str = "untitled";

/// How an entry's on-disk filename is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilenameScheme {
    /// `<uuid>.journal`: stable for the entry's lifetime, never collides
    #[default]
    Id,
    /// `<Title_With_Underscores>.journal`: readable, but entries whose titles
    /// sanitize to the same stem overwrite each other
    Title,
}

fn whitespace_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\s").expect("whitespace pattern is valid"))
}

/// Turn a title into a filename stem: whitespace becomes `_`, path
/// separators and leading dots are dropped
pub fn sanitize_title(title: &str) -> String {
    let replaced = whitespace_regex().replace_all(title.trim(), "_");
    let cleaned: String = replaced
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '\0'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        UNTITLED_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

impl FilenameScheme {
    /// Filename (no directory) for an entry under this scheme
    pub fn filename_for(&self, entry: &JournalEntry) -> String {
        let stem = match self {
            FilenameScheme::Id => entry.id().to_string(),
            FilenameScheme::Title => sanitize_title(&entry.title),
        };
        format!("{}.{}", stem, ENTRY_EXTENSION)
    }
}

impl FromStr for FilenameScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(FilenameScheme::Id),
            "title" => Ok(FilenameScheme::Title),
            _ => Err(format!(
                "Invalid filename_scheme: {}. Valid options: id, title",
                s
            )),
        }
    }
}

impl fmt::Display for FilenameScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilenameScheme::Id => write!(f, "id"),
            FilenameScheme::Title => write!(f, "title"),
        }
    }
}
