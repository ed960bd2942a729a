// Mutations and uploads.
// Handles that send a payload when invoked and resolve with the response body.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use reqwest::Method;
use reqwest::multipart::Form;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{GatewayError, Result};

use super::client::{Gateway, intercept_response};
use super::options::{MutationOptions, with_retry};

/// HTTP method used by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationMethod {
    #[default]
    Post,
    Put,
    Patch,
}

impl MutationMethod {
    pub fn as_method(&self) -> Method {
        match self {
            MutationMethod::Post => Method::POST,
            MutationMethod::Put => Method::PUT,
            MutationMethod::Patch => Method::PATCH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationMethod::Post => "post",
            MutationMethod::Put => "put",
            MutationMethod::Patch => "patch",
        }
    }
}

impl fmt::Display for MutationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationMethod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "post" => Ok(MutationMethod::Post),
            "put" => Ok(MutationMethod::Put),
            "patch" => Ok(MutationMethod::Patch),
            other => Err(GatewayError::Other(format!(
                "unsupported mutation method: {}",
                other
            ))),
        }
    }
}

/// A write bound to a path and method, invoked with a JSON payload.
pub struct Mutation<T> {
    gateway: Gateway,
    path: String,
    method: MutationMethod,
    options: MutationOptions,
    _response: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Mutation<T> {
    pub fn method(&self) -> MutationMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Send `payload` and resolve with the decoded response body.
    pub async fn mutate<P: Serialize + ?Sized>(&self, payload: &P) -> Result<T> {
        let body = intercept_response(serde_json::to_value(payload).map_err(GatewayError::from))?;

        let data = with_retry(self.options.retry, self.options.retry_delay, || {
            let builder = self
                .gateway
                .request(self.method.as_method(), &self.path)
                .json(&body);
            self.gateway.execute(builder, &self.options.request)
        })
        .await?;

        invalidate_after_write(&self.gateway, &self.options);
        Ok(data)
    }
}

/// A multipart POST bound to a path.
pub struct Upload<T> {
    gateway: Gateway,
    path: String,
    options: MutationOptions,
    _response: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Upload<T> {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// POST `form` as `multipart/form-data` and resolve with the decoded body.
    ///
    /// Forms are consumed by sending, so uploads are attempted once.
    pub async fn mutate(&self, form: Form) -> Result<T> {
        let builder = self.gateway.request(Method::POST, &self.path).multipart(form);
        let data = self.gateway.execute(builder, &self.options.request).await?;

        invalidate_after_write(&self.gateway, &self.options);
        Ok(data)
    }
}

impl Gateway {
    /// Build a mutation that sends its payload to `path` with `method`.
    pub fn mutation<T: DeserializeOwned>(
        &self,
        path: &str,
        method: MutationMethod,
        options: MutationOptions,
    ) -> Mutation<T> {
        Mutation {
            gateway: self.clone(),
            path: path.to_string(),
            method,
            options,
            _response: PhantomData,
        }
    }

    /// Build an upload that POSTs multipart forms to `path`.
    pub fn upload<T: DeserializeOwned>(&self, path: &str, options: MutationOptions) -> Upload<T> {
        Upload {
            gateway: self.clone(),
            path: path.to_string(),
            options,
            _response: PhantomData,
        }
    }
}

fn invalidate_after_write(gateway: &Gateway, options: &MutationOptions) {
    for prefix in &options.invalidate {
        gateway.cache().invalidate(prefix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method() {
        assert_eq!("post".parse::<MutationMethod>().unwrap(), MutationMethod::Post);
        assert_eq!("PUT".parse::<MutationMethod>().unwrap(), MutationMethod::Put);
        assert_eq!("patch".parse::<MutationMethod>().unwrap(), MutationMethod::Patch);
        assert!("delete".parse::<MutationMethod>().is_err());
        assert!("get".parse::<MutationMethod>().is_err());
    }

    #[test]
    fn test_default_is_post() {
        assert_eq!(MutationMethod::default(), MutationMethod::Post);
        assert_eq!(MutationMethod::default().as_method(), Method::POST);
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(MutationMethod::Put.as_method(), Method::PUT);
        assert_eq!(MutationMethod::Patch.as_method(), Method::PATCH);
        assert_eq!(MutationMethod::Patch.to_string(), "patch");
    }
}
