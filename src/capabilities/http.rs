use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crux_http::Http;

use crate::api::{Envelope, ServerCallback};

pub const CALLBACK_PATH: &str = "triggerServerCallback";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
pub const MAX_URL_LENGTH: usize = 2048;

/// Base URL of the game client's callback bridge, checked once at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    scheme: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let url = url.into();
        Self::validate(&url)?;

        let parsed = Url::parse(url.trim()).map_err(|e| RpcError::InvalidUrl {
            url: Self::truncate_url(&url),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme().to_lowercase();
        let host = parsed
            .host_str()
            .ok_or_else(|| RpcError::InvalidUrl {
                url: Self::truncate_url(&url),
                reason: "missing host".to_string(),
            })?
            .to_lowercase();

        Ok(Self {
            url: parsed.to_string(),
            scheme,
            host,
        })
    }

    /// Only for compile-time constants that are known to parse.
    pub(crate) fn from_parts(scheme: &str, host: &str) -> Self {
        Self {
            url: format!("{scheme}://{host}/"),
            scheme: scheme.to_string(),
            host: host.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full URL every server callback is posted to.
    pub fn callback_url(&self) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), CALLBACK_PATH)
    }

    fn validate(url: &str) -> Result<(), RpcError> {
        if url.is_empty() {
            return Err(RpcError::InvalidUrl {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(RpcError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("URL exceeds maximum length of {} bytes", MAX_URL_LENGTH),
            });
        }

        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(RpcError::InvalidUrl {
                url: url.to_string(),
                reason: "URL cannot be only whitespace".to_string(),
            });
        }

        let parsed = Url::parse(trimmed).map_err(|e| RpcError::InvalidUrl {
            url: Self::truncate_url(url),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(RpcError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!(
                    "invalid scheme '{}', only 'http' and 'https' are allowed",
                    scheme
                ),
            });
        }

        if parsed.host_str().is_none() {
            return Err(RpcError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "URL must have a host".to_string(),
            });
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(RpcError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(RpcError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "base URL cannot carry a query or fragment".to_string(),
            });
        }

        Ok(())
    }

    fn truncate_url(url: &str) -> String {
        if url.len() <= 100 {
            url.to_string()
        } else {
            let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
            format!("{}...", &url[..cut])
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum RpcError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{operation}: could not encode arguments: {message}")]
    Serialization { operation: String, message: String },

    #[error("{operation}: request failed: {message}")]
    Transport { operation: String, message: String },

    #[error("{operation}: server answered with HTTP {status}")]
    Status { operation: String, status: u16 },

    #[error("{operation}: response had no body")]
    EmptyBody { operation: String },

    #[error("no usable endpoint: {reason}")]
    NoEndpoint { reason: String },
}

pub type RpcResult<T> = Result<T, RpcError>;

/// Encodes the `{name, arguments}` envelope shared by every server callback.
pub fn encode_envelope<A: Serialize>(
    callback: ServerCallback,
    arguments: &A,
) -> Result<Vec<u8>, RpcError> {
    let envelope = Envelope {
        name: callback.name(),
        arguments,
    };
    serde_json::to_vec(&envelope).map_err(|e| RpcError::Serialization {
        operation: callback.name().to_string(),
        message: e.to_string(),
    })
}

/// Posts server callbacks through the shell's HTTP capability.
///
/// Every call is a single `POST` with no retry and no timeout of its own; the
/// continuation always receives an [`RpcResult`].
pub struct RpcClient<'a, Ev> {
    http: &'a Http<Ev>,
    url: String,
}

impl<'a, Ev> RpcClient<'a, Ev>
where
    Ev: 'static + Send,
{
    pub fn new(http: &'a Http<Ev>, endpoint: &ValidatedUrl) -> Self {
        Self {
            http,
            url: endpoint.callback_url(),
        }
    }

    /// Calls a callback whose JSON reply is decoded into `T`.
    pub fn query<A, T, F>(
        &self,
        callback: ServerCallback,
        arguments: &A,
        on_reply: F,
    ) -> Result<(), RpcError>
    where
        A: Serialize,
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(RpcResult<T>) -> Ev + Send + 'static,
    {
        let body = encode_envelope(callback, arguments)?;
        debug!(operation = callback.name(), url = %self.url, "server callback");

        self.http
            .post(&self.url)
            .body_bytes(body)
            .header("Content-Type", JSON_CONTENT_TYPE)
            .expect_json::<T>()
            .send(move |result| on_reply(decode_reply(callback, result)));

        Ok(())
    }

    /// Calls a callback whose reply body is not needed, only its success.
    pub fn command<A, F>(
        &self,
        callback: ServerCallback,
        arguments: &A,
        on_reply: F,
    ) -> Result<(), RpcError>
    where
        A: Serialize,
        F: FnOnce(RpcResult<()>) -> Ev + Send + 'static,
    {
        let body = encode_envelope(callback, arguments)?;
        debug!(operation = callback.name(), url = %self.url, "server callback");

        self.http
            .post(&self.url)
            .body_bytes(body)
            .header("Content-Type", JSON_CONTENT_TYPE)
            .send(move |result| on_reply(decode_reply(callback, result).map(|_| ())));

        Ok(())
    }
}

fn decode_reply<T>(
    callback: ServerCallback,
    result: crux_http::Result<crux_http::Response<T>>,
) -> RpcResult<T> {
    match result {
        Ok(mut response) => {
            let status = response.status();
            if !status.is_success() {
                let status = u16::from(status);
                warn!(operation = callback.name(), status, "server callback rejected");
                return Err(RpcError::Status {
                    operation: callback.name().to_string(),
                    status,
                });
            }
            response.take_body().ok_or_else(|| RpcError::EmptyBody {
                operation: callback.name().to_string(),
            })
        }
        Err(e) => {
            warn!(operation = callback.name(), error = %e, "server callback failed");
            Err(RpcError::Transport {
                operation: callback.name().to_string(),
                message: e.to_string(),
            })
        }
    }
}
