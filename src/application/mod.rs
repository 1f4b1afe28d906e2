//! Application layer - Use cases and orchestration

pub mod manage_config;
pub mod shared;
pub mod storage_manager;
pub mod transfer;

pub use manage_config::ConfigService;
pub use shared::SharedStorageManager;
pub use storage_manager::{StorageManager, SubscriptionId};
pub use transfer::{ImportReport, RelocateReport};
