//! Result pages and the fetcher seam used by [`Cursor`](super::Cursor).

use std::future::Future;

use serde_json::Value;

use crate::{Result, Warnings};

/// One page of documents as returned by a find-style command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Raw documents in server order.
    pub documents: Vec<Value>,
    /// Opaque token for the following page. `None` when this is the last page.
    pub next_page_state: Option<String>,
    /// Warnings reported with this page.
    pub warnings: Warnings,
}

impl Page {
    /// Creates a page from `documents` with no continuation.
    pub fn new(documents: Vec<Value>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// Sets the continuation token. An empty token is treated as absent.
    #[must_use]
    pub fn with_next_page_state(mut self, next_page_state: Option<String>) -> Self {
        self.next_page_state = next_page_state.filter(|state| !state.is_empty());
        self
    }

    /// Attaches warnings reported with this page.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Warnings) -> Self {
        self.warnings = warnings;
        self
    }

    /// Returns `true` if another page can be requested.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.next_page_state.is_some()
    }
}

/// Fetches a page of results given the continuation token.
///
/// The first call receives `None`. Implementations should be re-entrant:
/// each call issues exactly one request.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page identified by `page_state`.
    async fn fetch_page(&self, page_state: Option<String>) -> Result<Page>;
}

#[async_trait::async_trait]
impl<F, Fut> PageFetcher for F
where
    F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page>> + Send + 'static,
{
    async fn fetch_page(&self, page_state: Option<String>) -> Result<Page> {
        (self)(page_state).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_page_state_is_absent() {
        let page = Page::new(vec![json!({"a": 1})]).with_next_page_state(Some(String::new()));
        assert!(!page.has_next_page());

        let page = Page::new(Vec::new()).with_next_page_state(Some("token".into()));
        assert!(page.has_next_page());
    }

    #[tokio::test]
    async fn test_closure_fetcher() {
        let fetcher = |state: Option<String>| async move {
            Ok::<_, crate::Error>(Page::new(vec![json!(state)]))
        };

        let page = fetcher.fetch_page(Some("p2".into())).await.unwrap();
        assert_eq!(page.documents, vec![json!("p2")]);
    }
}
