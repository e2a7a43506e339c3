//! Document collections.

use dataapi_core::results::{InsertResponse, SingleResult};
use dataapi_core::{Cursor, FilterSpec, Result};
use serde::Serialize;
use serde_json::Value;

use crate::database::Database;
use crate::find::{FindOptions, FindTarget};
use crate::options::ApiOptions;
use crate::resource::Resource;

#[derive(Serialize)]
struct CountPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

/// Handle for a document collection.
///
/// # Examples
///
/// ```rust,ignore
/// use dataapi_client::{Filter, FindOptions};
///
/// let books = database.collection("books", None);
/// books.insert_one(&json!({"title": "Dune", "rating": 4.8}), None).await?;
///
/// let cursor = books.find(Filter::gte("rating", 4.5), FindOptions::new().with_limit(10));
/// let top: Vec<Book> = cursor.all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    resource: Resource,
}

impl Collection {
    pub(crate) fn new(database: Database, name: String, options: Option<ApiOptions>) -> Self {
        Self {
            resource: Resource::new(database, name, options),
        }
    }

    pub fn name(&self) -> &str {
        self.resource.name()
    }

    pub fn database(&self) -> &Database {
        self.resource.database()
    }

    /// Options set on the collection.
    pub fn options(&self) -> Option<&ApiOptions> {
        self.resource.options()
    }

    /// Inserts a single document.
    ///
    /// Warnings reach the configured warning handler only.
    pub async fn insert_one<T: Serialize>(
        &self,
        document: &T,
        options: Option<ApiOptions>,
    ) -> Result<InsertResponse> {
        self.resource.insert_one(document, options).await
    }

    /// Inserts several documents in one bulk command.
    ///
    /// Uses the bulk-operation timeout when one is configured. An empty slice
    /// is rejected before any request is made.
    pub async fn insert_many<T: Serialize>(
        &self,
        documents: &[T],
        options: Option<ApiOptions>,
    ) -> Result<InsertResponse> {
        self.resource.insert_many(documents, "documents", options).await
    }

    /// Finds the first document matching `filter`.
    pub async fn find_one(
        &self,
        filter: impl Into<FilterSpec>,
        options: FindOptions,
    ) -> SingleResult {
        self.resource.find_one(filter.into(), options).await
    }

    /// Returns a cursor over every document matching `filter`.
    ///
    /// No request is made until the cursor is first advanced. An invalid
    /// filter yields a cursor that has already failed.
    pub fn find(&self, filter: impl Into<FilterSpec>, options: FindOptions) -> Cursor {
        self.resource.find(filter.into(), options, FindTarget::Collection)
    }

    /// Counts documents matching `filter`.
    ///
    /// Fails with `TooManyDocumentsToCount` when the server stops counting,
    /// or when `upper_bound` is non-zero and the count exceeds it. Pass zero
    /// to rely on the server limit alone.
    pub async fn count_documents(
        &self,
        filter: impl Into<FilterSpec>,
        upper_bound: u64,
        options: Option<ApiOptions>,
    ) -> Result<u64> {
        let filter = filter.into().to_value()?;
        self.resource
            .command("countDocuments", CountPayload { filter }, options)?
            .execute()
            .await
            .into_count()
            .count(upper_bound)
    }
}
