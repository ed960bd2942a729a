// Query cache module.
// Keys and in-memory storage for cached read results.

pub mod key;
pub mod store;

pub use key::{CacheKey, KeySegment};
pub use store::{CachedData, DEFAULT_GC_TIME, DEFAULT_STALE_TIME, QueryCache};
