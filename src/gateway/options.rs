// Per-call overrides for requests, queries, and mutations.
// Every field starts at the gateway default; whatever the caller sets wins.

use std::future::Future;
use std::time::Duration;

use reqwest::RequestBuilder;
use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};

use crate::cache::{CacheKey, DEFAULT_GC_TIME, DEFAULT_STALE_TIME};
use crate::error::Result;

/// Base delay before the first retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the delay between retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Overrides applied to a single HTTP request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers. These replace any header of the same name set by the gateway,
    /// including `Authorization`.
    pub headers: HeaderMap,
    /// Timeout for this request instead of the configured one.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = if self.headers.is_empty() {
            builder
        } else {
            builder.headers(self.headers.clone())
        };

        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

/// Caching policy for a cached read.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// How long a cached result is served without refetching.
    pub stale_time: Duration,
    /// How long unused entries stay in the cache. Idle entries are dropped
    /// whenever a query fetches.
    pub gc_time: Duration,
    /// Additional attempts after a failed fetch.
    pub retry: u32,
    /// Base delay between attempts, doubled each time.
    pub retry_delay: Duration,
    pub request: RequestOptions,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
            retry: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            request: RequestOptions::default(),
        }
    }
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }
}

/// Policy for mutations and uploads.
#[derive(Debug, Clone)]
pub struct MutationOptions {
    /// Additional attempts after a failed write. Ignored for uploads.
    pub retry: u32,
    pub retry_delay: Duration,
    /// Cache key prefixes marked stale after a successful write.
    pub invalidate: Vec<CacheKey>,
    pub request: RequestOptions,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            retry: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            invalidate: Vec::new(),
            request: RequestOptions::default(),
        }
    }
}

impl MutationOptions {
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Invalidate queries under `prefix` once the write succeeds.
    pub fn invalidate(mut self, prefix: impl Into<CacheKey>) -> Self {
        self.invalidate.push(prefix.into());
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }
}

/// Delay before retry number `attempt` (zero-based): `base * 2^attempt`, capped.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RETRY_DELAY)
}

/// Run `attempt` until it succeeds or `retries` extra attempts have failed.
pub(crate) async fn with_retry<T, F, Fut>(
    retries: u32,
    base_delay: Duration,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failures = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if failures < retries => {
                let delay = retry_delay(base_delay, failures);
                failures += 1;
                tracing::debug!(attempt = failures, ?delay, error = %err, "retrying request");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
