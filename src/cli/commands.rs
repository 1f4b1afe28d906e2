//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jotter")]
#[command(about = "Journal entries stored one file each", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new entry
    New {
        /// Entry title
        title: String,

        #[command(flatten)]
        body: EntryArgs,

        /// Pin the new entry (unpins any other)
        #[arg(long)]
        pin: bool,
    },

    /// List entries, newest first
    List {
        /// Only entries from this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Maximum number of entries to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show one entry in full
    Show {
        /// Entry id or unique prefix
        id: String,
    },

    /// Change an existing entry
    Edit {
        /// Entry id or unique prefix
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        #[command(flatten)]
        body: EntryArgs,

        /// Remove the explicit pleasantness so it is derived from emotions
        #[arg(long, conflicts_with = "pleasantness")]
        clear_pleasantness: bool,
    },

    /// Pin an entry (unpins any other)
    Pin {
        /// Entry id or unique prefix
        id: String,
    },

    /// Unpin an entry
    Unpin {
        /// Entry id or unique prefix
        id: String,
    },

    /// Delete an entry
    Delete {
        /// Entry id or unique prefix
        id: String,
    },

    /// Import entries from a folder of entry files or from an export file
    Import {
        /// Folder or export file
        path: PathBuf,

        /// Also look in subfolders (folders only)
        #[arg(short, long)]
        recursive: bool,
    },

    /// Export every entry to a single file
    Export {
        /// Destination file
        file: PathBuf,
    },

    /// Copy the journal to a new folder and use it from now on
    Relocate {
        /// New storage folder (created if needed)
        dir: PathBuf,
    },

    /// Show journal statistics
    Stats,

    /// Print the storage folder
    Folder,

    /// List known emotions by category
    Emotions,

    /// View or modify configuration
    Config {
        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },
}

/// Body and metadata options shared by `new` and `edit`
#[derive(clap::Args, Debug, Default)]
pub struct EntryArgs {
    /// Plain-text body
    #[arg(short, long, conflicts_with = "markdown")]
    pub content: Option<String>,

    /// Markdown file to use as the rich body
    #[arg(long, value_name = "FILE")]
    pub markdown: Option<PathBuf>,

    /// Image to attach and embed at the end of the body (repeatable)
    #[arg(long = "attach", value_name = "FILE")]
    pub attachments: Vec<PathBuf>,

    /// Emotion label (repeatable; replaces existing emotions on edit)
    #[arg(short, long = "emotion", value_name = "EMOTION")]
    pub emotions: Vec<String>,

    /// Mood valence between 0 and 1
    #[arg(short, long)]
    pub pleasantness: Option<f64>,

    /// Entry date (YYYY-MM-DD or RFC 3339)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Tag (repeatable; replaces existing tags on edit)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}
