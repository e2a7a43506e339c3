use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, Result, Warnings};

#[derive(Deserialize)]
struct SingleEnvelope {
    #[serde(default)]
    data: SingleData,
}

#[derive(Default, Deserialize)]
struct SingleData {
    #[serde(default)]
    document: Option<Value>,
}

/// Outcome of a single-document query such as `findOne`.
///
/// Expected body shape: `{"data": {"document": <item-or-null>}}`.
#[derive(Debug, Clone)]
pub struct SingleResult {
    body: Vec<u8>,
    warnings: Warnings,
    error: Option<Error>,
}

impl SingleResult {
    /// Wraps a classified response.
    pub fn new(body: Vec<u8>, warnings: Warnings, error: Option<Error>) -> Self {
        Self {
            body,
            warnings,
            error,
        }
    }

    /// A result that failed before any request was made.
    pub fn from_error(error: Error) -> Self {
        Self::new(Vec::new(), Warnings::new(), Some(error))
    }

    /// Decodes the matched document.
    ///
    /// Returns [`ErrorKind::NoDocuments`](crate::ErrorKind::NoDocuments) when
    /// the body is empty or the document is `null`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let document = self.raw_document()?;
        Ok(serde_json::from_value(document)?)
    }

    /// Returns the matched document as raw JSON.
    pub fn raw_document(&self) -> Result<Value> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.body.is_empty() {
            return Err(Error::no_documents());
        }

        let envelope: SingleEnvelope = serde_json::from_slice(&self.body)?;
        match envelope.data.document {
            None | Some(Value::Null) => Err(Error::no_documents()),
            Some(document) => Ok(document),
        }
    }

    /// Warnings reported with the response.
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// The error associated with this result, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Raw response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Book {
        title: String,
    }

    #[test]
    fn test_decode_document() {
        let result = SingleResult::new(
            br#"{"data":{"document":{"title":"Dune"}}}"#.to_vec(),
            Warnings::new(),
            None,
        );
        let book: Book = result.decode().unwrap();
        assert_eq!(book.title, "Dune");
    }

    #[test]
    fn test_null_document() {
        let result = SingleResult::new(
            br#"{"data":{"document":null}}"#.to_vec(),
            Warnings::new(),
            None,
        );
        assert!(result.decode::<Book>().unwrap_err().is_no_documents());
    }

    #[test]
    fn test_empty_body() {
        let result = SingleResult::new(Vec::new(), Warnings::new(), None);
        assert!(result.decode::<Book>().unwrap_err().is_no_documents());
    }

    #[test]
    fn test_error_takes_precedence() {
        let result =
            SingleResult::from_error(Error::invalid_argument("invalid filter type: string"));
        let error = result.decode::<Book>().unwrap_err();
        assert!(error.is_invalid_argument());
        assert!(result.error().is_some());
    }
}
