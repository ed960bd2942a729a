// Cached reads.
// GET requests whose results are stored in the query cache under a key.

use reqwest::{Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::cache::CacheKey;
use crate::error::{GatewayError, Result};

use super::client::{Gateway, intercept_response};
use super::options::{QueryOptions, with_retry};

impl Gateway {
    /// Cached GET of `path`.
    ///
    /// A fresh entry under `key` is returned without touching the network.
    /// Otherwise the response is fetched, stored under `key`, and returned.
    pub async fn query<T: DeserializeOwned>(
        &self,
        key: impl Into<CacheKey>,
        path: &str,
        options: &QueryOptions,
    ) -> Result<T> {
        self.cached(key.into(), options, || self.request(Method::GET, path))
            .await
    }

    /// Cached GET of `path` with query parameters.
    ///
    /// Parameters are not part of the key; include them in `key` when
    /// different parameters should be cached separately.
    pub async fn query_with_params<T, P>(
        &self,
        key: impl Into<CacheKey>,
        path: &str,
        params: &P,
        options: &QueryOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.cached(key.into(), options, || {
            self.request(Method::GET, path).query(params)
        })
        .await
    }

    /// Mark queries under `prefix` stale so their next read refetches.
    pub fn invalidate(&self, prefix: impl Into<CacheKey>) -> usize {
        self.cache().invalidate(&prefix.into())
    }

    async fn cached<T, F>(&self, key: CacheKey, options: &QueryOptions, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        if let Some(value) = self.cache().get_fresh(&key, options.stale_time) {
            tracing::debug!(key = %key, "query served from cache");
            return intercept_response(serde_json::from_value(value).map_err(GatewayError::from));
        }

        let value: Value = with_retry(options.retry, options.retry_delay, || {
            self.execute(build(), &options.request)
        })
        .await?;

        let data = intercept_response(
            serde_json::from_value::<T>(value.clone()).map_err(GatewayError::from),
        )?;

        self.cache().prune(options.gc_time);
        tracing::debug!(key = %key, "query cached");
        self.cache().set_query_data(key, value);

        Ok(data)
    }
}
