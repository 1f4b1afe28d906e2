//! Error types for jotter

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn stored bytes back into an entry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The byte stream is not a well-formed document
    #[error("corrupt entry data: {0}")]
    Corrupt(String),

    /// The document parses but lacks required structure or has an unknown version
    #[error("unsupported entry schema: {0}")]
    UnsupportedSchema(String),
}

/// Main error type for jotter
#[derive(Debug, Error)]
pub enum JotterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Ambiguous entry id: {0}")]
    AmbiguousId(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JotterError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            JotterError::Config(_) => 2,
            JotterError::Decode(_) => 3,
            JotterError::NotFound(_) | JotterError::EntryNotFound(_) => 4,
            JotterError::AmbiguousId(_) => 5,
            _ => 1,
        }
    }

    /// Whether this error only says the target was already gone
    pub fn is_not_found(&self) -> bool {
        match self {
            JotterError::NotFound(_) => true,
            JotterError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            JotterError::EntryNotFound(id) => {
                format!(
                    "Entry not found: '{}'\n\n\
                    Suggestions:\n\
                    • Use 'jotter list' to see entry ids\n\
                    • Any unique prefix of an id is accepted",
                    id
                )
            }
            JotterError::Decode(DecodeError::Corrupt(msg)) => {
                format!(
                    "Corrupt entry data: {}\n\n\
                    The file is not valid JSON. Restore it from an export \
                    ('jotter import <backup>') or remove it.",
                    msg
                )
            }
            JotterError::Decode(DecodeError::UnsupportedSchema(msg)) => {
                format!(
                    "Unsupported entry schema: {}\n\n\
                    The file was written by a newer or incompatible version of jotter.",
                    msg
                )
            }
            JotterError::Config(msg) => {
                if msg.contains("filename_scheme") {
                    format!(
                        "{}\n\n\
                        Valid schemes: id, title\n\
                        Example: jotter config filename_scheme id",
                        msg
                    )
                } else if msg.contains("storage_path") {
                    format!(
                        "{}\n\n\
                        Move the journal with: jotter relocate <directory>",
                        msg
                    )
                } else {
                    msg.clone()
                }
            }
            JotterError::AmbiguousId(prefix) => {
                format!(
                    "Ambiguous entry id: '{}' matches more than one entry\n\n\
                    Type more characters of the id (see 'jotter list').",
                    prefix
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using JotterError
pub type Result<T> = std::result::Result<T, JotterError>;
