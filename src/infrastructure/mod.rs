//! Infrastructure layer - External I/O and persistence

pub mod codec;
pub mod config;
pub mod file_store;

pub use config::{Config, ConfigStore};
pub use file_store::{FileStore, StoredEntry};
