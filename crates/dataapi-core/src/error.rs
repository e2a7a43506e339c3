//! Structured error handling for Data API operations.

use std::fmt;
use std::sync::Arc;

use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for shared dynamic errors that can be sent across threads.
///
/// Sources are reference counted so that [`Error`] stays cheaply cloneable.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while talking to the Data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Client-side configuration is incomplete or inconsistent.
    Configuration,
    /// A caller-supplied argument was rejected before any request was made.
    InvalidArgument,
    /// The request failed on the network or the server answered with HTTP >= 400.
    Transport,
    /// The server accepted the request but reported structured errors.
    DataApi,
    /// The cursor was used after being closed.
    CursorClosed,
    /// No document is positioned under the cursor.
    NoCurrentDocument,
    /// A single-document query matched nothing.
    NoDocuments,
    /// A count exceeded the server limit or the caller's upper bound.
    TooManyDocumentsToCount,
    /// JSON encoding or decoding failed.
    Serialization,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Human readable fallback used when an error carries no message.
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::Configuration => "invalid client configuration",
            Self::InvalidArgument => "invalid argument",
            Self::Transport => "transport error",
            Self::DataApi => "unknown data api error",
            Self::CursorClosed => "cursor is closed",
            Self::NoCurrentDocument => "no current document; call next() first",
            Self::NoDocuments => "no documents found",
            Self::TooManyDocumentsToCount => "too many documents",
            Self::Serialization => "serialization error",
            Self::Unknown => "unknown error",
        }
    }
}

/// Structured error type with classification and an optional source.
#[must_use]
#[derive(Debug, Clone, Error)]
#[error("{}", render(kind, message, data_api_errors))]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<String>,
    /// HTTP status code, for transport errors caused by a response.
    pub status_code: Option<u16>,
    /// Structured errors reported in the response `errors` array.
    pub data_api_errors: Option<DataApiErrors>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<SharedError>,
}

fn render(kind: &ErrorKind, message: &Option<String>, errors: &Option<DataApiErrors>) -> String {
    match (message, errors) {
        (Some(message), _) => message.clone(),
        (None, Some(errors)) => errors.to_string(),
        (None, None) => kind.default_message().to_owned(),
    }
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            status_code: None,
            data_api_errors: None,
            source: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::new(kind).with_source(source)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Records the HTTP status code that produced this error.
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Configuration error raised before any network call.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration).with_message(message)
    }

    /// Rejected argument raised before any network call.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument).with_message(message)
    }

    /// Network failure or HTTP error response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport).with_message(message)
    }

    /// Structured errors returned alongside an HTTP success status.
    pub fn data_api(errors: DataApiErrors) -> Self {
        Self {
            data_api_errors: Some(errors),
            ..Self::new(ErrorKind::DataApi)
        }
    }

    pub fn cursor_closed() -> Self {
        Self::new(ErrorKind::CursorClosed)
    }

    pub fn no_current_document() -> Self {
        Self::new(ErrorKind::NoCurrentDocument)
    }

    pub fn no_documents() -> Self {
        Self::new(ErrorKind::NoDocuments)
    }

    pub fn too_many_documents_to_count() -> Self {
        Self::new(ErrorKind::TooManyDocumentsToCount)
    }

    /// Returns the HTTP status code, if the error came from a response.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Returns the structured server errors, if any were reported.
    #[must_use]
    pub fn data_api_errors(&self) -> Option<&DataApiErrors> {
        self.data_api_errors.as_ref()
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.kind == ErrorKind::Configuration
    }

    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        self.kind == ErrorKind::InvalidArgument
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    #[must_use]
    pub fn is_data_api(&self) -> bool {
        self.kind == ErrorKind::DataApi
    }

    #[must_use]
    pub fn is_cursor_closed(&self) -> bool {
        self.kind == ErrorKind::CursorClosed
    }

    #[must_use]
    pub fn is_no_documents(&self) -> bool {
        self.kind == ErrorKind::NoDocuments
    }

    #[must_use]
    pub fn is_too_many_documents_to_count(&self) -> bool {
        self.kind == ErrorKind::TooManyDocumentsToCount
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        let message = error.to_string();
        Self::from_source(ErrorKind::Serialization, error).with_message(message)
    }
}

impl From<DataApiErrors> for Error {
    fn from(errors: DataApiErrors) -> Self {
        Self::data_api(errors)
    }
}

/// A single structured error reported by the Data API.
///
/// Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl fmt::Display for DataApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_diagnostic(
            f,
            self.message.as_deref(),
            ErrorKind::DataApi.default_message(),
            [
                ("code", self.error_code.as_deref()),
                ("family", self.family.as_deref()),
                ("scope", self.scope.as_deref()),
            ],
        )
    }
}

/// Writes `message (label: value, ...)`, skipping empty fields.
///
/// Shared by server errors and warnings, which render identically.
pub(crate) fn write_diagnostic(
    f: &mut fmt::Formatter<'_>,
    message: Option<&str>,
    fallback: &str,
    details: [(&str, Option<&str>); 3],
) -> fmt::Result {
    let message = message.filter(|message| !message.is_empty());
    f.write_str(message.unwrap_or(fallback))?;

    let mut details = details
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .filter(|value| !value.is_empty())
                .map(|value| (label, value))
        })
        .peekable();

    if details.peek().is_none() {
        return Ok(());
    }

    f.write_str(" (")?;
    for (index, (label, value)) in details.enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{label}: {value}")?;
    }
    f.write_str(")")
}

impl std::error::Error for DataApiError {}

/// Non-empty, ordered collection of errors returned by a single call.
#[derive(Debug, Clone, PartialEq, Eq, Deref, IntoIterator, Serialize)]
#[into_iterator(owned, ref)]
#[serde(transparent)]
pub struct DataApiErrors(Vec<DataApiError>);

impl DataApiErrors {
    /// Wraps `errors`, returning `None` when the list is empty.
    #[must_use]
    pub fn new(errors: Vec<DataApiError>) -> Option<Self> {
        (!errors.is_empty()).then_some(Self(errors))
    }

    /// Returns `true` if any member carries the given error code.
    #[must_use]
    pub fn contains_code(&self, code: &str) -> bool {
        self.0
            .iter()
            .any(|error| error.error_code.as_deref() == Some(code))
    }

    /// Consumes the collection, returning the underlying errors.
    #[must_use]
    pub fn into_inner(self) -> Vec<DataApiError> {
        self.0
    }
}

impl fmt::Display for DataApiErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DataApiErrors {}
