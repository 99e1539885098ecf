pub mod backend;
pub mod local;
pub mod memory;
pub mod s3;
pub mod types;

pub use backend::ObjectStore;
pub use local::{LocalFile, LocalTree};
pub use memory::{MemoryStore, StoreCall, StoredObject};
pub use s3::{S3Provider, S3Store};
pub use types::*;
