//! In-memory transport for tests.
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! dataapi-client = { version = "...", features = ["test-utils"] }
//! ```
//!
//! ```rust,ignore
//! let transport = MockTransport::new()
//!     .with_json(200, json!({"data": {"document": {"_id": "1"}}}));
//! let client = Client::new(ApiOptions::new().with_transport(transport.clone().into_shared()));
//! // ... run the operation ...
//! assert_eq!(transport.requests().len(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dataapi_core::{Error, Result};

use super::{HttpRequest, HttpResponse, Transport};

#[derive(Default)]
struct MockState {
    responses: VecDeque<Result<HttpResponse>>,
    requests: Vec<HttpRequest>,
}

/// Transport that replays queued responses and records every request.
///
/// Responses are served in FIFO order; when the queue is empty the transport
/// fails with a transport error.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockTransport")
            .field("queued", &state.responses.len())
            .field("recorded", &state.requests.len())
            .finish()
    }
}

impl MockTransport {
    /// Creates a transport with an empty response queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a raw response.
    #[must_use]
    pub fn with_response(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queues a JSON response.
    #[must_use]
    pub fn with_json(self, status: u16, body: serde_json::Value) -> Self {
        self.with_response(status, body.to_string())
    }

    /// Queues a transport failure.
    #[must_use]
    pub fn with_error(self, error: Error) -> Self {
        self.push(Err(error));
        self
    }

    /// Queues a response or failure on a shared transport.
    pub fn push(&self, response: Result<HttpResponse>) {
        self.lock().responses.push_back(response);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.lock().requests.last().cloned()
    }

    /// Converts into a shared trait object for [`ApiOptions`](crate::ApiOptions).
    pub fn into_shared(self) -> Arc<dyn Transport> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut state = self.lock();
        state.requests.push(request);
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::transport("mock transport has no queued response")))
    }
}
