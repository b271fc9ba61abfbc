//! Durable local storage for the studio client.
//!
//! [`DurableStorage`] is a string key/value contract with two backends:
//! [`FileStorage`] (one JSON object in `storage.json`) and [`MemoryStorage`].
//! [`SessionStore`] layers the typed auth session on top.

mod file;
mod keys;
mod memory;
mod session;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session::{AuthUser, Session, SessionStore};
pub use traits::DurableStorage;

use studio_core::Paths;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage file exists but is not a JSON object of strings.
    #[error("Storage file is unreadable: {0}")]
    Encoding(String),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// File-backed storage at [`Paths::storage_file`].
pub fn create_storage(paths: &Paths) -> StorageResult<Box<dyn DurableStorage>> {
    FileStorage::new(paths.storage_file()).map(|storage| Box::new(storage) as Box<dyn DurableStorage>)
}

pub fn create_session_store(paths: &Paths) -> StorageResult<SessionStore> {
    create_storage(paths).map(SessionStore::new)
}
