//! HTTP seam between commands and the network.
//!
//! Commands build an [`HttpRequest`] and hand it to a [`Transport`]. The
//! default transport is [`ReqwestTransport`]; tests swap in
//! [`MockTransport`].

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod mock;
mod reqwest;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use ::reqwest::Method;
use ::reqwest::header::HeaderMap;
use dataapi_core::{Error, Result};
use url::Url;

#[cfg(any(test, feature = "test-utils"))]
pub use self::mock::MockTransport;
pub use self::reqwest::{Error as ReqwestError, ReqwestConfig, ReqwestTransport};

/// Tracing target for transport operations.
pub const TRACING_TARGET: &str = "dataapi_client::transport";

/// A fully resolved HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Deadline for the whole exchange.
    pub timeout: Option<Duration>,
    /// Connection establishment limit requested by the caller.
    ///
    /// [`ReqwestTransport`] fixes this when it is built, so the shipped
    /// transport is picked per connect timeout and ignores this field.
    pub connect_timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            connect_timeout: None,
        }
    }

    /// Returns the body as UTF-8 text, for logging and assertions.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|body| std::str::from_utf8(body).ok())
    }

    /// Returns a header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Status and body of an HTTP response.
///
/// Bodies are read fully before being returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends HTTP requests.
///
/// Implementations perform exactly one attempt per call and report network
/// failures as [`ErrorKind::Transport`](dataapi_core::ErrorKind::Transport).
/// HTTP error statuses are not failures at this level.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

static DEFAULT_TRANSPORT: OnceLock<std::result::Result<Arc<ReqwestTransport>, Error>> =
    OnceLock::new();

/// Process-wide reqwest transport used when no transport is configured.
pub fn default_transport() -> Result<Arc<dyn Transport>> {
    let transport = DEFAULT_TRANSPORT
        .get_or_init(|| ReqwestTransport::new(ReqwestConfig::default()).map(Arc::new))
        .clone()?;
    Ok(transport)
}

static CONNECT_TRANSPORTS: OnceLock<Mutex<HashMap<Duration, Arc<ReqwestTransport>>>> =
    OnceLock::new();

/// Shared reqwest transport with the given connect timeout.
///
/// One transport is built per distinct timeout and reused afterwards.
/// Timeouts are applied in whole seconds, at least one.
pub fn connect_timeout_transport(connect_timeout: Duration) -> Result<Arc<ReqwestTransport>> {
    let config = ReqwestConfig::default().with_connect_timeout(connect_timeout);
    let key = config.connect_timeout().unwrap_or(connect_timeout);

    let mut cache = CONNECT_TRANSPORTS
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(transport) = cache.get(&key) {
        return Ok(Arc::clone(transport));
    }

    let transport = Arc::new(ReqwestTransport::new(config)?);
    cache.insert(key, Arc::clone(&transport));
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_timeout_transport_is_configured() {
        let transport = connect_timeout_transport(Duration::from_secs(7)).unwrap();
        assert_eq!(
            transport.config().connect_timeout(),
            Some(Duration::from_secs(7))
        );
    }

    #[test]
    fn test_connect_timeout_transport_is_cached() {
        let first = connect_timeout_transport(Duration::from_secs(9)).unwrap();
        let second = connect_timeout_transport(Duration::from_secs(9)).unwrap();
        let other = connect_timeout_transport(Duration::from_secs(10)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn test_sub_second_connect_timeout_rounds_up() {
        let transport = connect_timeout_transport(Duration::from_millis(250)).unwrap();
        assert_eq!(
            transport.config().connect_timeout(),
            Some(Duration::from_secs(1))
        );
    }
}
