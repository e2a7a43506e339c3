//! Layered API options.
//!
//! Every scope (client, database, collection or table, single call) carries a
//! sparse [`ApiOptions`]. Before a command executes the layers are merged in
//! the fixed order defaults, client, database, resource, call: scalar fields
//! take the last value set, headers are unioned key by key and each timeout
//! is merged on its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dataapi_core::{Result, Warning};

use crate::transport::{Transport, connect_timeout_transport, default_transport};

/// Default Data API version.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Keyspace used when none is configured.
pub const DEFAULT_KEYSPACE: &str = "default_keyspace";

/// Default per-request timeout: 30 seconds.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Callback invoked synchronously for every warning in a response.
pub type WarningHandler = Arc<dyn Fn(&Warning) + Send + Sync>;

/// Timeouts, each merged independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutOptions {
    /// Deadline for a single HTTP exchange.
    pub request: Option<Duration>,
    /// Limit on establishing a connection.
    pub connection: Option<Duration>,
    /// Deadline for bulk commands such as `insertMany`.
    pub bulk_operation: Option<Duration>,
}

impl TimeoutOptions {
    fn merge(&mut self, layer: &TimeoutOptions) {
        if layer.request.is_some() {
            self.request = layer.request;
        }
        if layer.connection.is_some() {
            self.connection = layer.connection;
        }
        if layer.bulk_operation.is_some() {
            self.bulk_operation = layer.bulk_operation;
        }
    }
}

/// Sparse configuration for one scope. Unset fields inherit.
#[derive(Clone, Default)]
pub struct ApiOptions {
    pub token: Option<String>,
    pub keyspace: Option<String>,
    pub api_version: Option<String>,
    pub transport: Option<Arc<dyn Transport>>,
    /// Extra headers, e.g. `x-embedding-api-key`.
    pub headers: HashMap<String, String>,
    pub timeout: TimeoutOptions,
    pub warning_handler: Option<WarningHandler>,
}

impl fmt::Debug for ApiOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header_names: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        header_names.sort_unstable();

        f.debug_struct("ApiOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("keyspace", &self.keyspace)
            .field("api_version", &self.api_version)
            .field("transport", &self.transport.is_some())
            .field("headers", &header_names)
            .field("timeout", &self.timeout)
            .field("warning_handler", &self.warning_handler.is_some())
            .finish()
    }
}

impl ApiOptions {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The base layer every merge starts from.
    pub fn defaults() -> Self {
        Self {
            keyspace: Some(DEFAULT_KEYSPACE.to_owned()),
            api_version: Some(DEFAULT_API_VERSION.to_owned()),
            timeout: TimeoutOptions {
                request: Some(DEFAULT_REQUEST_TIMEOUT),
                ..TimeoutOptions::default()
            },
            ..Self::default()
        }
    }

    /// Merges `layers` on top of [`ApiOptions::defaults`]. Absent layers are skipped.
    pub fn merge<'a>(layers: impl IntoIterator<Item = Option<&'a ApiOptions>>) -> ApiOptions {
        layers
            .into_iter()
            .flatten()
            .fold(Self::defaults(), |mut merged, layer| {
                merged.apply(layer);
                merged
            })
    }

    fn apply(&mut self, layer: &ApiOptions) {
        if layer.token.is_some() {
            self.token.clone_from(&layer.token);
        }
        if layer.keyspace.is_some() {
            self.keyspace.clone_from(&layer.keyspace);
        }
        if layer.api_version.is_some() {
            self.api_version.clone_from(&layer.api_version);
        }
        if layer.transport.is_some() {
            self.transport.clone_from(&layer.transport);
        }
        for (name, value) in &layer.headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self.timeout.merge(&layer.timeout);
        if layer.warning_handler.is_some() {
            self.warning_handler.clone_from(&layer.warning_handler);
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Adds a single header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds several headers, overriding same-named ones.
    #[must_use]
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout.request = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeout.connection = Some(timeout);
        self
    }

    /// Sets the timeout used by bulk commands.
    #[must_use]
    pub fn with_bulk_operation_timeout(mut self, timeout: Duration) -> Self {
        self.timeout.bulk_operation = Some(timeout);
        self
    }

    /// Registers a callback for response warnings.
    #[must_use]
    pub fn with_warning_handler(
        mut self,
        handler: impl Fn(&Warning) + Send + Sync + 'static,
    ) -> Self {
        self.warning_handler = Some(Arc::new(handler));
        self
    }

    /// Token, or an empty string when unset.
    pub fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }

    pub fn keyspace(&self) -> &str {
        self.keyspace.as_deref().unwrap_or(DEFAULT_KEYSPACE)
    }

    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout.request.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn connection_timeout(&self) -> Option<Duration> {
        self.timeout.connection
    }

    pub fn bulk_operation_timeout(&self) -> Option<Duration> {
        self.timeout.bulk_operation
    }

    /// The configured transport, or a shared reqwest transport.
    ///
    /// Without a configured transport the connection timeout selects which
    /// shared reqwest transport is used.
    pub fn transport(&self) -> Result<Arc<dyn Transport>> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }

        match self.connection_timeout() {
            Some(timeout) => {
                let transport: Arc<dyn Transport> = connect_timeout_transport(timeout)?;
                Ok(transport)
            }
            None => default_transport(),
        }
    }

    pub fn warning_handler(&self) -> Option<&WarningHandler> {
        self.warning_handler.as_ref()
    }
}
