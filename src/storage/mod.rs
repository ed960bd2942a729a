// Persisted key-value storage.
// Holds small string entries (such as the auth token) that outlive the process.

pub mod paths;
pub mod store;

pub use paths::storage_path;
pub use store::{FileStore, KeyValueStore, MemoryStore};
