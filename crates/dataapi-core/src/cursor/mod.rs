//! Forward-only cursor over paginated query results.
//!
//! A [`Cursor`] buffers one page at a time and asks its [`PageFetcher`] for
//! the next page once the buffer is drained. All state lives behind a single
//! async mutex that stays held across the page fetch, so each operation is
//! atomic with respect to other callers sharing the cursor.

mod page;

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{AsRefStr, Display, IntoStaticStr};
use tokio::sync::Mutex;

pub use self::page::{Page, PageFetcher};
use crate::{Error, Result, Warnings};

/// Tracing target for cursor operations.
pub const TRACING_TARGET: &str = "dataapi_core::cursor";

/// Lifecycle of a [`Cursor`].
///
/// `Closed` is absorbing and `Exhausted` never returns to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CursorState {
    /// Iteration has not started.
    #[default]
    Idle,
    /// At least one call to [`Cursor::next`] has been made.
    Active,
    /// Every document has been consumed.
    Exhausted,
    /// The cursor was closed explicitly.
    Closed,
}

/// Iterator over query results that fetches pages on demand.
///
/// ```ignore
/// let cursor = collection.find(Filter::eq("genre", "fantasy"), FindOptions::new());
/// while cursor.next().await {
///     let book: Book = cursor.decode().await?;
/// }
/// if let Some(error) = cursor.err().await {
///     return Err(error);
/// }
/// ```
pub struct Cursor {
    inner: Mutex<CursorInner>,
}

struct CursorInner {
    state: CursorState,
    fetcher: Option<Arc<dyn PageFetcher>>,
    buffer: Vec<Value>,
    position: Option<usize>,
    next_page_state: Option<String>,
    error: Option<Error>,
    warnings: Warnings,
    initialized: bool,
}

impl CursorInner {
    fn new(fetcher: Option<Arc<dyn PageFetcher>>) -> Self {
        Self {
            state: CursorState::Idle,
            fetcher,
            buffer: Vec::new(),
            position: None,
            next_page_state: None,
            error: None,
            warnings: Warnings::new(),
            initialized: false,
        }
    }

    /// Fetches a page and replaces the buffer. State is untouched on failure.
    async fn fetch(&mut self, page_state: Option<String>) -> Result<()> {
        let Some(fetcher) = self.fetcher.clone() else {
            return Err(Error::configuration("cursor has no page fetcher"));
        };

        tracing::debug!(
            target: TRACING_TARGET,
            has_page_state = page_state.is_some(),
            "Fetching page"
        );

        let page = fetcher.fetch_page(page_state).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            documents = page.documents.len(),
            has_next_page = page.has_next_page(),
            "Fetched page"
        );

        self.buffer = page.documents;
        self.position = None;
        self.next_page_state = page.next_page_state.filter(|state| !state.is_empty());
        self.warnings.extend(page.warnings);
        Ok(())
    }

    fn fail(&mut self, error: Error) {
        tracing::warn!(
            target: TRACING_TARGET,
            error = %error,
            "Cursor page fetch failed"
        );
        self.error = Some(error);
    }

    async fn ensure_initialized(&mut self) -> Result<()> {
        if !self.initialized {
            self.fetch(None).await?;
            self.initialized = true;
        }
        Ok(())
    }

    async fn advance(&mut self) -> bool {
        match self.state {
            CursorState::Closed => {
                self.error = Some(Error::cursor_closed());
                return false;
            }
            CursorState::Exhausted => return false,
            CursorState::Idle | CursorState::Active => {}
        }

        if let Err(error) = self.ensure_initialized().await {
            self.fail(error);
            return false;
        }

        self.state = CursorState::Active;

        let next = self.position.map_or(0, |position| position + 1);
        if next < self.buffer.len() {
            self.position = Some(next);
            return true;
        }

        let Some(page_state) = self.next_page_state.clone() else {
            self.state = CursorState::Exhausted;
            return false;
        };

        if let Err(error) = self.fetch(Some(page_state)).await {
            self.fail(error);
            return false;
        }

        if self.buffer.is_empty() {
            self.state = CursorState::Exhausted;
            return false;
        }

        self.position = Some(0);
        true
    }

    fn current(&self) -> Option<&Value> {
        self.position.and_then(|position| self.buffer.get(position))
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        if self.state == CursorState::Closed {
            return Err(Error::cursor_closed());
        }

        let document = self.current().ok_or_else(Error::no_current_document)?;
        Ok(T::deserialize(document)?)
    }
}

impl Cursor {
    /// Creates an idle cursor. The first page is fetched lazily.
    pub fn new(fetcher: impl PageFetcher + 'static) -> Self {
        Self::from_inner(CursorInner::new(Some(Arc::new(fetcher))))
    }

    /// Creates a cursor seeded with an already fetched first page.
    ///
    /// The cursor starts exhausted when the page is empty and has no
    /// continuation token.
    pub fn with_initial_page(page: Page, fetcher: impl PageFetcher + 'static) -> Self {
        let mut inner = CursorInner::new(Some(Arc::new(fetcher)));
        let next_page_state = page.next_page_state.filter(|state| !state.is_empty());

        if page.documents.is_empty() && next_page_state.is_none() {
            inner.state = CursorState::Exhausted;
        }

        inner.buffer = page.documents;
        inner.next_page_state = next_page_state;
        inner.warnings = page.warnings;
        inner.initialized = true;
        Self::from_inner(inner)
    }

    /// Creates an exhausted cursor that reports `error`.
    ///
    /// Used when a query is rejected before any page could be fetched.
    pub fn with_error(error: Error) -> Self {
        let mut inner = CursorInner::new(None);
        inner.state = CursorState::Exhausted;
        inner.error = Some(error);
        Self::from_inner(inner)
    }

    fn from_inner(inner: CursorInner) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> CursorState {
        self.inner.lock().await.state
    }

    /// Advances to the next document, fetching a new page if needed.
    ///
    /// Returns `false` when there are no more documents or an error occurred;
    /// check [`Cursor::err`] to tell the two apart.
    pub async fn next(&self) -> bool {
        self.inner.lock().await.advance().await
    }

    /// Decodes the current document into `T`.
    pub async fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        self.inner.lock().await.decode()
    }

    /// Advances and decodes in one step.
    ///
    /// Returns `Ok(None)` once the cursor is exhausted, or the terminal error
    /// if iteration stopped because of one.
    pub async fn try_next<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let mut inner = self.inner.lock().await;
        if inner.advance().await {
            return inner.decode().map(Some);
        }

        match inner.error.clone() {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }

    /// Drains every remaining document across all pages into a vector.
    ///
    /// The cursor is exhausted afterwards. If a page fetch fails the error is
    /// returned and recorded, and the cursor is left wherever the last
    /// successful fetch put it.
    pub async fn all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut inner = self.inner.lock().await;

        if inner.state == CursorState::Closed {
            return Err(Error::cursor_closed());
        }

        if let Err(error) = inner.ensure_initialized().await {
            inner.fail(error.clone());
            return Err(error);
        }

        let start = inner.position.map_or(0, |position| position + 1);
        let mut documents: Vec<Value> = inner
            .buffer
            .get(start..)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();

        while let Some(page_state) = inner.next_page_state.clone() {
            if let Err(error) = inner.fetch(Some(page_state)).await {
                inner.fail(error.clone());
                return Err(error);
            }
            documents.extend(inner.buffer.iter().cloned());
        }

        inner.state = CursorState::Exhausted;
        drop(inner);

        documents
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(Error::from))
            .collect()
    }

    /// Calls `f` with every remaining document.
    ///
    /// Returning [`ControlFlow::Break`] stops early without error. An error
    /// returned by `f` is recorded as the cursor's terminal error.
    pub async fn iterate<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(Value) -> Result<ControlFlow<()>>,
    {
        let mut inner = self.inner.lock().await;

        while inner.advance().await {
            let Some(document) = inner.current().cloned() else {
                break;
            };

            match f(document) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => return Ok(()),
                Err(error) => {
                    inner.error = Some(error.clone());
                    return Err(error);
                }
            }
        }

        match inner.error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Closes the cursor. Idempotent and infallible.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == CursorState::Closed {
            return;
        }

        inner.state = CursorState::Closed;
        inner.buffer = Vec::new();
        inner.position = None;
        inner.next_page_state = None;
    }

    /// Returns the terminal error, if iteration stopped because of one.
    pub async fn err(&self) -> Option<Error> {
        self.inner.lock().await.error.clone()
    }

    /// Returns a copy of the current document.
    pub async fn current(&self) -> Option<Value> {
        self.inner.lock().await.current().cloned()
    }

    /// Number of documents left in the buffered page.
    pub async fn remaining_batch_length(&self) -> usize {
        let inner = self.inner.lock().await;
        match inner.position {
            None => inner.buffer.len(),
            Some(position) => inner.buffer.len().saturating_sub(position + 1),
        }
    }

    /// Returns `true` if another page can be requested.
    ///
    /// More pages do not guarantee more documents.
    pub async fn has_next_page(&self) -> bool {
        self.inner.lock().await.next_page_state.is_some()
    }

    /// Warnings accumulated from every page fetched so far.
    ///
    /// The list only grows over the cursor's lifetime. Nothing is dropped
    /// when a new page replaces the buffer.
    pub async fn warnings(&self) -> Warnings {
        self.inner.lock().await.warnings.clone()
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Cursor");
        match self.inner.try_lock() {
            Ok(inner) => debug
                .field("state", &inner.state)
                .field("buffered", &inner.buffer.len())
                .field("position", &inner.position)
                .field("has_next_page", &inner.next_page_state.is_some()),
            Err(_) => debug.field("state", &"<locked>"),
        };
        debug.finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::Warning;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn items(ids: &[u32]) -> Vec<Value> {
        ids.iter().map(|id| json!({ "id": id })).collect()
    }

    /// Serves `pages` in order, keyed by the token `p{index}`.
    fn paged(pages: Vec<Vec<u32>>, calls: Arc<AtomicUsize>) -> impl PageFetcher {
        let pages = Arc::new(pages);
        move |page_state: Option<String>| {
            let pages = pages.clone();
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let index = match page_state {
                    None => 0,
                    Some(state) => state.trim_start_matches('p').parse::<usize>().unwrap(),
                };
                let next = (index + 1 < pages.len()).then(|| format!("p{}", index + 1));
                Ok::<_, Error>(Page::new(items(&pages[index])).with_next_page_state(next))
            }
        }
    }

    fn failing() -> impl PageFetcher {
        |_: Option<String>| async { Err::<Page, _>(Error::transport("connection refused")) }
    }

    #[tokio::test]
    async fn test_single_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1, 2, 3]], calls.clone()));
        assert_eq!(cursor.state().await, CursorState::Idle);

        let mut seen = Vec::new();
        while cursor.next().await {
            seen.push(cursor.decode::<Item>().await.unwrap().id);
        }

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cursor.state().await, CursorState::Exhausted);
        assert!(cursor.err().await.is_none());
    }

    #[tokio::test]
    async fn test_multiple_pages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1, 2], vec![3, 4], vec![5]], calls.clone()));

        let mut seen = Vec::new();
        while let Some(item) = cursor.try_next::<Item>().await.unwrap() {
            seen.push(item.id);
        }

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!cursor.has_next_page().await);
    }

    #[tokio::test]
    async fn test_all_across_pages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1, 2], vec![3, 4], vec![5]], calls.clone()));

        let all: Vec<Item> = cursor.all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(cursor.state().await, CursorState::Exhausted);
        assert!(!cursor.next().await);
    }

    #[tokio::test]
    async fn test_all_after_partial_iteration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1, 2], vec![3]], calls.clone()));

        assert!(cursor.next().await);
        let rest: Vec<Item> = cursor.all().await.unwrap();
        assert_eq!(rest, vec![Item { id: 2 }, Item { id: 3 }]);
    }

    #[tokio::test]
    async fn test_all_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![]], calls.clone()));

        let all: Vec<Item> = cursor.all().await.unwrap();
        assert!(all.is_empty());
        assert_eq!(cursor.state().await, CursorState::Exhausted);
    }

    #[tokio::test]
    async fn test_fetch_error() {
        let cursor = Cursor::new(failing());

        assert!(!cursor.next().await);
        let error = cursor.err().await.unwrap();
        assert!(error.is_transport());
        assert_eq!(error.to_string(), "connection refused");

        let result: Result<Vec<Item>> = cursor.all().await;
        assert!(result.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_all_mid_drain_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = {
            let calls = calls.clone();
            move |page_state: Option<String>| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match (page_state.as_deref(), call) {
                        (None, _) => {
                            Ok(Page::new(items(&[1, 2])).with_next_page_state(Some("a".into())))
                        }
                        (Some("a"), 1) => Err(Error::transport("boom")),
                        _ => Ok(Page::new(items(&[3]))),
                    }
                }
            }
        };
        let cursor = Cursor::new(fetcher);

        let error = cursor.all::<Item>().await.unwrap_err();
        assert!(error.is_transport());
        assert_eq!(error.to_string(), "boom");
        assert_eq!(cursor.err().await.unwrap().to_string(), "boom");
        assert_eq!(cursor.state().await, CursorState::Idle);
        assert!(cursor.has_next_page().await);

        // The first page is still buffered, so a second drain starts over from it.
        let all: Vec<Item> = cursor.all().await.unwrap();
        assert_eq!(all, vec![Item { id: 1 }, Item { id: 2 }, Item { id: 3 }]);
        assert_eq!(cursor.state().await, CursorState::Exhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_next_empty_follow_up_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1], vec![]], calls.clone()));

        assert!(cursor.next().await);
        assert!(!cursor.next().await);

        assert_eq!(cursor.state().await, CursorState::Exhausted);
        assert!(cursor.err().await.is_none());
        assert!(!cursor.has_next_page().await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_warnings_accumulate_across_pages() {
        let fetcher = |page_state: Option<String>| async move {
            let (documents, next, message) = match page_state {
                None => (items(&[1]), Some("p1".to_owned()), "first"),
                Some(_) => (items(&[2]), None, "second"),
            };
            let warning = Warning {
                message: Some(message.to_owned()),
                ..Warning::default()
            };
            Ok::<_, Error>(
                Page::new(documents)
                    .with_next_page_state(next)
                    .with_warnings(vec![warning]),
            )
        };
        let cursor = Cursor::new(fetcher);

        let _: Vec<Item> = cursor.all().await.unwrap();

        let messages: Vec<_> = cursor
            .warnings()
            .await
            .into_iter()
            .filter_map(|warning| warning.message)
            .collect();
        assert_eq!(messages, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1, 2]], calls.clone()));
        assert!(cursor.next().await);

        cursor.close().await;
        cursor.close().await;

        assert_eq!(cursor.state().await, CursorState::Closed);
        assert!(!cursor.next().await);
        assert!(cursor.err().await.unwrap().is_cursor_closed());
        assert!(cursor.decode::<Item>().await.unwrap_err().is_cursor_closed());
        assert!(cursor.all::<Item>().await.unwrap_err().is_cursor_closed());
        assert_eq!(cursor.remaining_batch_length().await, 0);
    }

    #[tokio::test]
    async fn test_decode_without_next() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1]], calls.clone()));

        let error = cursor.decode::<Item>().await.unwrap_err();
        assert_eq!(error.kind, crate::ErrorKind::NoCurrentDocument);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_with_initial_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = Page::new(items(&[10, 11]))
            .with_next_page_state(Some("p1".into()))
            .with_warnings(vec![Warning {
                message: Some("first page".into()),
                ..Default::default()
            }]);
        let cursor = Cursor::with_initial_page(page, paged(vec![vec![], vec![12]], calls.clone()));

        let all: Vec<Item> = cursor.all().await.unwrap();
        assert_eq!(all, vec![Item { id: 10 }, Item { id: 11 }, Item { id: 12 }]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cursor.warnings().await.len(), 1);
    }

    #[tokio::test]
    async fn test_with_initial_empty_page() {
        let cursor = Cursor::with_initial_page(Page::default(), failing());
        assert_eq!(cursor.state().await, CursorState::Exhausted);
        assert!(!cursor.next().await);
        assert!(cursor.err().await.is_none());
    }

    #[tokio::test]
    async fn test_with_error() {
        let cursor = Cursor::with_error(Error::invalid_argument("invalid filter type: string"));
        assert_eq!(cursor.state().await, CursorState::Exhausted);
        assert!(!cursor.next().await);
        assert!(cursor.err().await.unwrap().is_invalid_argument());
    }

    #[tokio::test]
    async fn test_current_and_remaining() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::with_initial_page(Page::new(items(&[1, 2, 3])), paged(vec![], calls));

        assert!(cursor.current().await.is_none());
        assert_eq!(cursor.remaining_batch_length().await, 3);

        assert!(cursor.next().await);
        assert_eq!(cursor.current().await, Some(json!({ "id": 1 })));
        assert_eq!(cursor.remaining_batch_length().await, 2);
    }

    #[tokio::test]
    async fn test_iterate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1, 2], vec![3]], calls.clone()));

        let mut seen = Vec::new();
        cursor
            .iterate(|document| {
                seen.push(document["id"].as_u64().unwrap_or_default());
                Ok(ControlFlow::Continue(()))
            })
            .await
            .unwrap();

        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_iterate_early_stop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1, 2], vec![3]], calls.clone()));

        let mut seen = 0;
        cursor
            .iterate(|_| {
                seen += 1;
                Ok(if seen == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                })
            })
            .await
            .unwrap();

        assert_eq!(seen, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cursor.err().await.is_none());
    }

    #[tokio::test]
    async fn test_iterate_callback_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Cursor::new(paged(vec![vec![1, 2]], calls));

        let result = cursor
            .iterate(|_| Err(Error::invalid_argument("rejected")))
            .await;

        assert!(result.unwrap_err().is_invalid_argument());
        assert!(cursor.err().await.unwrap().is_invalid_argument());
    }
}
