use serde::Deserialize;

use crate::{Error, Result, Warnings};

#[derive(Debug, Default, Deserialize)]
struct CountEnvelope {
    #[serde(default)]
    status: CountStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountStatus {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    more_data: bool,
}

/// Outcome of a `countDocuments` command.
///
/// Expected body shape: `{"status": {"count": <int>, "moreData": <bool>}}`.
#[derive(Debug, Clone)]
pub struct CountResult {
    body: Vec<u8>,
    warnings: Warnings,
    error: Option<Error>,
}

impl CountResult {
    /// Wraps a classified response.
    pub fn new(body: Vec<u8>, warnings: Warnings, error: Option<Error>) -> Self {
        Self {
            body,
            warnings,
            error,
        }
    }

    /// Returns the document count.
    ///
    /// Fails with
    /// [`ErrorKind::TooManyDocumentsToCount`](crate::ErrorKind::TooManyDocumentsToCount)
    /// when the server reports `moreData`, or when `upper_bound` is non-zero
    /// and the count exceeds it.
    pub fn count(&self, upper_bound: u64) -> Result<u64> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.body.is_empty() {
            return Err(Error::no_documents());
        }

        let CountEnvelope { status } = serde_json::from_slice(&self.body)?;
        if status.more_data || (upper_bound > 0 && status.count > upper_bound) {
            return Err(Error::too_many_documents_to_count()
                .with_message(format!("too many documents (counted at least {})", status.count)));
        }

        Ok(status.count)
    }

    /// Warnings reported with the response.
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }
}
