use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cursor::Page;
use crate::{Error, Result, Warnings};

#[derive(Deserialize)]
struct MultipleEnvelope {
    #[serde(default)]
    data: MultipleData,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultipleData {
    #[serde(default)]
    documents: Option<Vec<Value>>,
    #[serde(default)]
    next_page_state: Option<String>,
}

/// One page of a multi-document query such as `find`.
///
/// Expected body shape:
/// `{"data": {"documents": [...], "nextPageState": <string-or-null>}}`.
#[derive(Debug, Clone)]
pub struct MultipleResult {
    body: Vec<u8>,
    warnings: Warnings,
    error: Option<Error>,
}

impl MultipleResult {
    /// Wraps a classified response.
    pub fn new(body: Vec<u8>, warnings: Warnings, error: Option<Error>) -> Self {
        Self {
            body,
            warnings,
            error,
        }
    }

    fn parse(&self) -> Result<MultipleData> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.body.is_empty() {
            return Err(Error::no_documents());
        }

        let envelope: MultipleEnvelope = serde_json::from_slice(&self.body)?;
        Ok(envelope.data)
    }

    /// Decodes the documents on this page.
    ///
    /// A missing or `null` document list is reported as
    /// [`ErrorKind::NoDocuments`](crate::ErrorKind::NoDocuments).
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let documents = self.parse()?.documents.ok_or_else(Error::no_documents)?;
        documents
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(Error::from))
            .collect()
    }

    /// Continuation token for the following page.
    ///
    /// `None` when there are no more pages or the response was not parseable.
    pub fn next_page_state(&self) -> Option<String> {
        self.parse()
            .ok()
            .and_then(|data| data.next_page_state)
            .filter(|state| !state.is_empty())
    }

    /// Returns `true` if more pages are available.
    pub fn has_next_page(&self) -> bool {
        self.next_page_state().is_some()
    }

    /// Converts this response into a cursor page, carrying its warnings.
    pub fn into_page(self) -> Result<Page> {
        let data = self.parse()?;
        Ok(Page::new(data.documents.unwrap_or_default())
            .with_next_page_state(data.next_page_state)
            .with_warnings(self.warnings))
    }

    /// Warnings reported with the response.
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// The error associated with this result, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Warning;

    #[test]
    fn test_decode_documents() {
        let result = MultipleResult::new(
            br#"{"data":{"documents":[{"n":1},{"n":2}],"nextPageState":"abc"}}"#.to_vec(),
            Warnings::new(),
            None,
        );

        let documents: Vec<Value> = result.decode().unwrap();
        assert_eq!(documents, vec![json!({"n": 1}), json!({"n": 2})]);
        assert_eq!(result.next_page_state().as_deref(), Some("abc"));
        assert!(result.has_next_page());
    }

    #[test]
    fn test_null_documents() {
        let result = MultipleResult::new(
            br#"{"data":{"documents":null,"nextPageState":null}}"#.to_vec(),
            Warnings::new(),
            None,
        );
        assert!(result.decode::<Value>().unwrap_err().is_no_documents());
        assert!(!result.has_next_page());
    }

    #[test]
    fn test_empty_page_state() {
        let result = MultipleResult::new(
            br#"{"data":{"documents":[],"nextPageState":""}}"#.to_vec(),
            Warnings::new(),
            None,
        );
        assert!(!result.has_next_page());
    }

    #[test]
    fn test_into_page() {
        let warnings = vec![Warning {
            message: Some("unindexed filter".into()),
            ..Default::default()
        }];
        let result = MultipleResult::new(
            br#"{"data":{"documents":[{"n":1}],"nextPageState":"next"}}"#.to_vec(),
            warnings,
            None,
        );

        let page = result.into_page().unwrap();
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.next_page_state.as_deref(), Some("next"));
        assert_eq!(page.warnings.len(), 1);
    }

    #[test]
    fn test_error_propagates() {
        let result =
            MultipleResult::new(Vec::new(), Warnings::new(), Some(Error::transport("down")));
        assert!(result.into_page().unwrap_err().is_transport());
    }
}
