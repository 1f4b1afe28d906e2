//! jotter - Journal entry storage
//!
//! Keeps journal entries as one JSON file each under a relocatable storage
//! root, loads them into a sorted in-memory collection, and supports
//! import, export and relocation of the whole journal.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;

pub use application::{SharedStorageManager, StorageManager};
pub use domain::{JournalEntry, RichText};
pub use error::{DecodeError, JotterError};
