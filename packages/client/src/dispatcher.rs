//! Query dispatcher: one click, one `POST`.
//!
//! The translation service is co-located with the page, so the endpoint is
//! the page's own scheme, host and port followed by
//! [`TRANSLATE_PATH`]. The body is the clicked point as `{lat, lng}`.

use std::sync::Arc;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tkv_translate_models::{ClickPoint, CorrelationRequest, TRANSLATE_PATH};

use crate::DispatchError;

/// Content type sent with every translation request.
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Maximum number of characters of an error body kept in
/// [`DispatchError::Status`].
const BODY_PREVIEW_LEN: usize = 200;

/// Errors from deriving the service origin.
#[derive(Debug, Error)]
pub enum OriginError {
    /// The page URL does not parse.
    #[error("Invalid page URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The page URL has no host (e.g. `file:` URLs).
    #[error("Page URL '{0}' has no host")]
    NoHost(String),

    /// The page URL has no port and its scheme has no known default.
    #[error("Page URL '{0}' has no port")]
    NoPort(String),
}

/// Scheme, host and port of the page serving the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
    port: u16,
}

impl Origin {
    /// Extracts the origin from a page URL. Path, query and fragment are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError`] if the URL does not parse, has no host, or
    /// has neither an explicit port nor a scheme with a default port.
    pub fn parse(page_url: &str) -> Result<Self, OriginError> {
        let url = Url::parse(page_url).map_err(|e| OriginError::InvalidUrl {
            url: page_url.to_string(),
            message: e.to_string(),
        })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| OriginError::NoHost(page_url.to_string()))?
            .to_string();

        let port = url
            .port_or_known_default()
            .ok_or_else(|| OriginError::NoPort(page_url.to_string()))?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
        })
    }

    /// URL of the translation operation on this origin.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::InvalidUrl`] if the combined URL does not
    /// parse.
    pub fn endpoint(&self) -> Result<Url, OriginError> {
        let url = format!("{self}{TRANSLATE_PATH}");
        Url::parse(&url).map_err(|e| OriginError::InvalidUrl {
            url,
            message: e.to_string(),
        })
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Sends a JSON body to an endpoint and returns the response body.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Posts `body` to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the request fails or the response status
    /// is not a success.
    async fn post_json(&self, endpoint: &Url, body: String) -> Result<String, DispatchError>;
}

/// [`Transport`] over a `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, endpoint: &Url, body: String) -> Result<String, DispatchError> {
        let resp = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body: text.chars().take(BODY_PREVIEW_LEN).collect(),
            });
        }

        Ok(text)
    }
}

/// Turns click points into translation requests.
pub struct QueryDispatcher {
    endpoint: Url,
    transport: Arc<dyn Transport>,
}

impl QueryDispatcher {
    /// Creates a dispatcher for `origin` using the given transport.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError`] if the endpoint URL cannot be built.
    pub fn new(origin: &Origin, transport: Arc<dyn Transport>) -> Result<Self, OriginError> {
        Ok(Self {
            endpoint: origin.endpoint()?,
            transport,
        })
    }

    /// Creates a dispatcher for `origin` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError`] if the endpoint URL cannot be built.
    pub fn http(origin: &Origin) -> Result<Self, OriginError> {
        Self::new(origin, Arc::new(HttpTransport::new()))
    }

    /// The translation endpoint requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Serializes a click point into the request body.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Encode`] if serialization fails.
    pub fn request_body(point: ClickPoint) -> Result<String, DispatchError> {
        Ok(CorrelationRequest::from(point).to_body()?)
    }

    /// Sends the translation request for one click and returns the raw
    /// response body.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the body cannot be encoded, the request
    /// fails, or the service answers with a non-success status.
    pub async fn dispatch(&self, point: ClickPoint) -> Result<String, DispatchError> {
        let body = Self::request_body(point)?;
        log::debug!("POST {} {body}", self.endpoint);
        self.transport.post_json(&self.endpoint, body).await
    }
}
