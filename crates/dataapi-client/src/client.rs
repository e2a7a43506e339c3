//! Entry point holding the outermost option layer.

use std::sync::Arc;

use crate::admin::Admin;
use crate::database::Database;
use crate::options::ApiOptions;

/// Tracing target for client construction.
pub const TRACING_TARGET: &str = "dataapi_client::client";

struct ClientInner {
    options: ApiOptions,
}

/// Data API client.
///
/// Options set here are inherited by every database, collection, table and
/// command created from the client unless a narrower scope overrides them.
///
/// # Examples
///
/// ```rust,ignore
/// use dataapi_client::{ApiOptions, Client};
///
/// let client = Client::new(ApiOptions::new().with_token("AstraCS:..."));
/// let database = client.database("https://<id>-<region>.apps.astra.datastax.com", None);
/// let books = database.collection("books", None);
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client with the given outermost options.
    pub fn new(options: ApiOptions) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            keyspace = options.keyspace.as_deref(),
            api_version = options.api_version.as_deref(),
            "Creating Data API client"
        );

        Self {
            inner: Arc::new(ClientInner { options }),
        }
    }

    /// Options set on the client.
    pub fn options(&self) -> &ApiOptions {
        &self.inner.options
    }

    /// Returns a handle for the database at `endpoint`.
    ///
    /// No request is made; an empty endpoint is reported by the first command.
    pub fn database(&self, endpoint: impl Into<String>, options: Option<ApiOptions>) -> Database {
        Database::with_client(self.clone(), endpoint.into(), options)
    }

    /// Returns a handle for the DevOps administration API.
    pub fn admin(&self, options: Option<ApiOptions>) -> Admin {
        Admin::new(self.clone(), options)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ApiOptions::default())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}
