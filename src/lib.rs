// Library module for s3deploy
// Re-exports modules for use in integration tests and the CLI

pub mod config;
pub mod error;
pub mod fs;
pub mod sync;

pub use config::EffectiveConfig;
pub use error::DeployError;
pub use fs::{MemoryStore, ObjectStore, S3Store};
pub use sync::{SyncEngine, SyncReport};
