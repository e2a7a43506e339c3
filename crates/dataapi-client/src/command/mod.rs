//! Command construction and execution.
//!
//! A [`Command`] pairs an [`Envelope`] with the scopes it runs under. On
//! [`Command::execute`] the option layers are merged, the request is POSTed
//! once to `<endpoint>/api/json/<version>/<keyspace>[/<resource>]` and the
//! response is split by [`extract_errors`] into body, warnings and error.

mod classify;
mod envelope;

use std::sync::Arc;
use std::time::Duration;

use dataapi_core::results::{CountResult, MultipleResult, SingleResult};
use dataapi_core::{Error, ErrorKind, Result, Warnings};
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

pub use self::classify::extract_errors;
pub use self::envelope::Envelope;
use crate::database::Database;
use crate::options::ApiOptions;
use crate::transport::{HttpRequest, HttpResponse};

/// Tracing target for command execution.
pub const TRACING_TARGET: &str = "dataapi_client::command";

/// Header carrying the application token.
pub const TOKEN_HEADER: &str = "token";

/// Fixed path segments between the endpoint and the API version.
const API_PATH: [&str; 2] = ["api", "json"];

/// A single Data API command bound to its scopes.
#[derive(Debug, Clone)]
pub struct Command {
    database: Option<Database>,
    envelope: Envelope,
    resource: Option<String>,
    keyspace: Option<String>,
    resource_options: Option<Arc<ApiOptions>>,
    call_options: Option<ApiOptions>,
    bulk: bool,
}

impl Command {
    /// Creates a command against `database`.
    ///
    /// A command without a database fails with a configuration error when
    /// executed.
    pub fn new(database: Option<Database>, envelope: Envelope) -> Self {
        Self {
            database,
            envelope,
            resource: None,
            keyspace: None,
            resource_options: None,
            call_options: None,
            bulk: false,
        }
    }

    /// Targets a collection or table.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Overrides the keyspace resolved from the options.
    #[must_use]
    pub fn with_keyspace(mut self, keyspace: Option<String>) -> Self {
        self.keyspace = keyspace;
        self
    }

    /// Sets the collection or table layer.
    #[must_use]
    pub fn with_resource_options(mut self, options: Option<Arc<ApiOptions>>) -> Self {
        self.resource_options = options;
        self
    }

    /// Sets the per-call layer.
    #[must_use]
    pub fn with_call_options(mut self, options: Option<ApiOptions>) -> Self {
        self.call_options = options;
        self
    }

    /// Marks the command as a bulk operation.
    #[must_use]
    pub fn with_bulk(mut self, bulk: bool) -> Self {
        self.bulk = bulk;
        self
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Merges defaults, client, database, resource and call options in order.
    pub fn resolve_options(&self) -> ApiOptions {
        let (client, database) = match &self.database {
            Some(database) => (database.client_options(), database.options()),
            None => (None, None),
        };

        ApiOptions::merge([
            client,
            database,
            self.resource_options.as_deref(),
            self.call_options.as_ref(),
        ])
    }

    /// Builds the request URL.
    pub fn url(&self, options: &ApiOptions) -> Result<Url> {
        let database = self
            .database
            .as_ref()
            .ok_or_else(|| Error::configuration("command cannot execute without a database"))?;

        let endpoint = database.endpoint();
        if endpoint.is_empty() {
            return Err(Error::configuration("empty API endpoint"));
        }

        let mut url = Url::parse(endpoint).map_err(|error| {
            Error::from_source(ErrorKind::Configuration, error)
                .with_message(format!("invalid API endpoint: {endpoint}"))
        })?;

        let keyspace = self.keyspace.as_deref().unwrap_or(options.keyspace());
        url.path_segments_mut()
            .map_err(|()| Error::configuration(format!("invalid API endpoint: {endpoint}")))?
            .pop_if_empty()
            .extend(API_PATH)
            .extend([options.api_version(), keyspace])
            .extend(self.resource.as_deref());

        Ok(url)
    }

    fn headers(options: &ApiOptions) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let token = options.token();
        if !token.is_empty() {
            let name = HeaderName::from_static(TOKEN_HEADER);
            headers.insert(name, header_value(TOKEN_HEADER, token)?);
        }

        insert_custom_headers(&mut headers, options)?;
        Ok(headers)
    }

    fn timeout(&self, options: &ApiOptions) -> Duration {
        options
            .bulk_operation_timeout()
            .filter(|_| self.bulk)
            .unwrap_or_else(|| options.request_timeout())
    }

    async fn send(&self, options: &ApiOptions) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(Method::POST, self.url(options)?);
        request.headers = Self::headers(options)?;
        request.body = Some(self.envelope.to_bytes()?);
        request.timeout = Some(self.timeout(options));
        request.connect_timeout = options.connection_timeout();

        let transport = options.transport()?;
        let command = self.envelope.name().unwrap_or_default().to_owned();

        tracing::debug!(
            target: TRACING_TARGET,
            command = %command,
            url = %request.url,
            body = request.body_text().unwrap_or_default(),
            "Executing command"
        );

        let response = transport.send(request).await.inspect_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET,
                command = %command,
                error = %error,
                "Command request failed"
            );
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            command = %command,
            status = response.status,
            "Command response received"
        );

        Ok(response)
    }

    /// Sends the command once and classifies the response.
    ///
    /// Never retries. Errors raised before the request leave the body empty.
    pub async fn execute(&self) -> RawResponse {
        let options = self.resolve_options();
        match self.send(&options).await {
            Ok(response) => {
                let (warnings, error) =
                    extract_errors(response.status, &response.body, options.warning_handler());
                RawResponse {
                    body: response.body,
                    warnings,
                    error,
                }
            }
            Err(error) => RawResponse::from_error(error),
        }
    }
}

pub(crate) fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|error| {
        Error::from_source(ErrorKind::Configuration, error)
            .with_message(format!("invalid value for header {name}"))
    })
}

/// Applies the merged custom headers, replacing same-named defaults.
pub(crate) fn insert_custom_headers(headers: &mut HeaderMap, options: &ApiOptions) -> Result<()> {
    for (name, value) in &options.headers {
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
            Error::from_source(ErrorKind::Configuration, error)
                .with_message(format!("invalid header name: {name}"))
        })?;
        headers.insert(header, header_value(name, value)?);
    }
    Ok(())
}

/// Classified outcome of one command.
///
/// The body is kept even when `error` is set.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub body: Vec<u8>,
    pub warnings: Warnings,
    pub error: Option<Error>,
}

impl RawResponse {
    /// An outcome that failed before a response was received.
    pub fn from_error(error: Error) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Returns the body, or the error if one was classified.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.body),
        }
    }

    /// Decodes the whole body, failing first on a classified error.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.into_result()?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub fn into_single(self) -> SingleResult {
        SingleResult::new(self.body, self.warnings, self.error)
    }

    pub fn into_multiple(self) -> MultipleResult {
        MultipleResult::new(self.body, self.warnings, self.error)
    }

    pub fn into_count(self) -> CountResult {
        CountResult::new(self.body, self.warnings, self.error)
    }
}
