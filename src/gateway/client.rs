// Gateway HTTP client.
// Handles authentication, failure logging, and request/response processing.

use std::sync::Arc;

use reqwest::{
    Client, Method, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::auth::{CredentialProvider, StoredToken};
use crate::cache::QueryCache;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::storage::FileStore;

use super::options::RequestOptions;

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";
const USER_AGENT_VALUE: &str = concat!("reqgate/", env!("CARGO_PKG_VERSION"));

/// Central entry point for outbound HTTP calls.
///
/// Cloning is cheap; clones share the connection pool, credentials, and cache.
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    config: Arc<GatewayConfig>,
    credentials: Arc<dyn CredentialProvider>,
    cache: QueryCache,
}

impl Gateway {
    /// Create a gateway that asks `credentials` for a token on every request.
    pub fn new(
        config: GatewayConfig,
        credentials: impl CredentialProvider + 'static,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        tracing::debug!(base_url = %config.base_url, timeout = ?config.timeout, "gateway created");

        Ok(Self {
            client,
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            cache: QueryCache::new(),
        })
    }

    /// Gateway configured from the environment, reading the token from the
    /// default persisted store.
    pub fn from_env() -> Result<Self> {
        let store = FileStore::open_default()?;
        Self::new(GatewayConfig::from_env(), StoredToken::new(store))
    }

    /// Use `cache` instead of a private one, e.g. to share it between gateways.
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Effective URL for `path`.
    pub fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    /// Uncached GET.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.request(Method::GET, path), &RequestOptions::default())
            .await
    }

    /// Uncached GET with query parameters.
    pub async fn get_with_params<T, P>(&self, path: &str, params: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).query(params);
        self.execute(builder, &RequestOptions::default()).await
    }

    /// Send `body` as JSON with an arbitrary method.
    pub async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(method, path).json(body);
        self.execute(builder, options).await
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Run a request through the interceptors and decode the body.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        options: &RequestOptions,
    ) -> Result<T> {
        intercept_response(self.dispatch(builder, options).await)
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        options: &RequestOptions,
    ) -> Result<T> {
        let builder = options.apply(self.authorize(builder)?);
        let response = builder.send().await?;

        tracing::debug!(status = %response.status(), url = %response.url(), "response received");

        let response = check_response(response).await?;
        decode(response).await
    }

    /// Request interceptor: attach the bearer token if one is available.
    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        match self.credentials.bearer_token()? {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                value.set_sensitive(true);
                Ok(builder.header(AUTHORIZATION, value))
            }
            None => Ok(builder),
        }
    }
}

/// Response interceptor: log any failure once, then pass it on unchanged.
pub(crate) fn intercept_response<T>(outcome: Result<T>) -> Result<T> {
    if let Err(err) = &outcome {
        tracing::error!(error = %err, "API Error");
    }
    outcome
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status { status, url, body })
}

/// Decode a JSON body. An empty body decodes as `null`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
