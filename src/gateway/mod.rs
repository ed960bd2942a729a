// Request gateway module.
// Wraps outbound HTTP with bearer auth, failure logging, and query caching.

pub mod client;
pub mod mutation;
pub mod options;
pub mod query;

pub use client::Gateway;
pub use mutation::{Mutation, MutationMethod, Upload};
pub use options::{MutationOptions, QueryOptions, RequestOptions};
