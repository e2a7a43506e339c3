//! Error types for the reqwest transport.

use thiserror::Error;

/// Error type for reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<Error> for dataapi_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                let error = if e.is_timeout() {
                    dataapi_core::Error::transport(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    dataapi_core::Error::transport("connection failed")
                } else {
                    dataapi_core::Error::transport(e.to_string())
                };

                match e.status() {
                    Some(status) => error.with_status_code(status.as_u16()).with_source(e),
                    None => error.with_source(e),
                }
            }
        }
    }
}
