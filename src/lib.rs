// Request gateway library.
// Bearer-authenticated HTTP calls with failure logging and a client-side query cache.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod storage;

pub use auth::{CredentialProvider, NoCredentials, StaticToken, StoredToken, TOKEN_KEY};
pub use cache::{CacheKey, KeySegment, QueryCache};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{
    Gateway, Mutation, MutationMethod, MutationOptions, QueryOptions, RequestOptions, Upload,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
