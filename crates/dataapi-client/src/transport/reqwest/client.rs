//! Reqwest-backed [`Transport`].

use std::sync::Arc;

use reqwest::Client;

use super::{Error, ReqwestConfig};
use crate::transport::{HttpRequest, HttpResponse, TRACING_TARGET, Transport};

struct ReqwestTransportInner {
    http: Client,
    config: ReqwestConfig,
}

/// Transport that sends requests with a shared [`reqwest::Client`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<ReqwestTransportInner>,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Creates a transport with the given configuration.
    pub fn new(config: ReqwestConfig) -> dataapi_core::Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest transport"
        );

        let mut builder = Client::builder().timeout(timeout).user_agent(&user_agent);
        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }

        let http = builder.build().map_err(Error::from)?;
        Ok(Self::from_client(http, config))
    }

    /// Wraps an existing client, e.g. one with custom TLS settings.
    pub fn from_client(http: Client, config: ReqwestConfig) -> Self {
        Self {
            inner: Arc::new(ReqwestTransportInner { http, config }),
        }
    }

    /// Gets the transport configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> dataapi_core::Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
            ..
        } = request;

        let mut builder = self.inner.http.request(method, url).headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "HTTP request failed"
            );
            Error::from(error)
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Error::from)?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
