//! Domain layer - Journal entries and the rules they follow

pub mod emotions;
pub mod entry;
pub mod naming;
pub mod rich_text;
pub mod stats;

pub use entry::{count_words, ImageAttachment, JournalEntry};
pub use naming::{FilenameScheme, ENTRY_EXTENSION};
pub use rich_text::RichText;
pub use stats::JournalStats;
