//! Find options and the page fetcher behind find cursors.

use dataapi_core::{Page, PageFetcher, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::options::ApiOptions;
use crate::resource::Resource;

/// Options for `find` and `find_one` on collections and tables.
///
/// `find_one` only uses the sort, projection and similarity settings.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort clause, e.g. `{"rating": -1}` or `{"$vector": [...]}`.
    pub sort: Map<String, Value>,
    /// Projection, e.g. `{"title": true}`.
    pub projection: Map<String, Value>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    /// Return `$similarity` with each vector search hit.
    pub include_similarity: Option<bool>,
    /// Return the sort vector with the first page. Collections only.
    pub include_sort_vector: Option<bool>,
    /// Resume from a page state returned by an earlier query.
    pub initial_page_state: Option<String>,
    /// Per-call option layer.
    pub api_options: Option<ApiOptions>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sort field. Call order is kept on the wire.
    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sort.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_projection(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.projection.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn with_include_similarity(mut self, include: bool) -> Self {
        self.include_similarity = Some(include);
        self
    }

    #[must_use]
    pub fn with_include_sort_vector(mut self, include: bool) -> Self {
        self.include_sort_vector = Some(include);
        self
    }

    #[must_use]
    pub fn with_initial_page_state(mut self, page_state: impl Into<String>) -> Self {
        self.initial_page_state = Some(page_state.into());
        self
    }

    #[must_use]
    pub fn with_api_options(mut self, options: ApiOptions) -> Self {
        self.api_options = Some(options);
        self
    }
}

/// Which optional settings a target accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FindTarget {
    Collection,
    Table,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindPayloadOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_similarity: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_sort_vector: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_state: Option<String>,
}

impl FindPayloadOptions {
    fn is_empty(&self) -> bool {
        self.limit.is_none()
            && self.skip.is_none()
            && self.include_similarity.is_none()
            && self.include_sort_vector.is_none()
            && self.page_state.is_none()
    }
}

/// Payload shared by `find` and `findOne`.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct FindPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    sort: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    projection: Map<String, Value>,
    #[serde(skip_serializing_if = "FindPayloadOptions::is_empty")]
    options: FindPayloadOptions,
}

impl FindPayload {
    /// Payload for `find`, without a page state.
    pub(crate) fn find(filter: Option<Value>, options: &FindOptions, target: FindTarget) -> Self {
        let include_sort_vector = match target {
            FindTarget::Collection => options.include_sort_vector,
            FindTarget::Table => None,
        };

        Self {
            filter,
            sort: options.sort.clone(),
            projection: options.projection.clone(),
            options: FindPayloadOptions {
                limit: options.limit,
                skip: options.skip,
                include_similarity: options.include_similarity,
                include_sort_vector,
                page_state: None,
            },
        }
    }

    /// Payload for `findOne`.
    pub(crate) fn find_one(filter: Option<Value>, options: &FindOptions) -> Self {
        Self {
            filter,
            sort: options.sort.clone(),
            projection: options.projection.clone(),
            options: FindPayloadOptions {
                include_similarity: options.include_similarity,
                ..FindPayloadOptions::default()
            },
        }
    }

    fn with_page_state(mut self, page_state: Option<String>) -> Self {
        self.options.page_state = page_state;
        self
    }
}

/// Issues one `find` per page for a cursor.
pub(crate) struct FindPages {
    resource: Resource,
    payload: FindPayload,
    initial_page_state: Option<String>,
    api_options: Option<ApiOptions>,
}

impl FindPages {
    pub(crate) fn new(resource: Resource, payload: FindPayload, options: FindOptions) -> Self {
        Self {
            resource,
            payload,
            initial_page_state: options.initial_page_state,
            api_options: options.api_options,
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for FindPages {
    async fn fetch_page(&self, page_state: Option<String>) -> Result<Page> {
        // The initial page state only applies to the first request.
        let page_state = page_state.or_else(|| self.initial_page_state.clone());
        let payload = self.payload.clone().with_page_state(page_state);

        self.resource
            .command("find", payload, self.api_options.clone())?
            .execute()
            .await
            .into_multiple()
            .into_page()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_payload() {
        let payload = FindPayload::find(None, &FindOptions::new(), FindTarget::Collection);
        assert_eq!(serde_json::to_value(payload).unwrap(), json!({}));
    }

    #[test]
    fn test_find_payload() {
        let options = FindOptions::new()
            .with_sort("rating", -1)
            .with_projection("title", true)
            .with_limit(10)
            .with_skip(5)
            .with_include_similarity(true)
            .with_include_sort_vector(true);

        let filter = Some(json!({"author": "Herbert"}));
        let payload = FindPayload::find(filter, &options, FindTarget::Collection)
            .with_page_state(Some("token".into()));

        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({
                "filter": {"author": "Herbert"},
                "sort": {"rating": -1},
                "projection": {"title": true},
                "options": {
                    "limit": 10,
                    "skip": 5,
                    "includeSimilarity": true,
                    "includeSortVector": true,
                    "pageState": "token"
                }
            })
        );
    }

    #[test]
    fn test_table_find_drops_sort_vector() {
        let options = FindOptions::new().with_include_sort_vector(true);
        let payload = FindPayload::find(None, &options, FindTarget::Table);
        assert_eq!(serde_json::to_value(payload).unwrap(), json!({}));
    }

    #[test]
    fn test_find_one_ignores_paging() {
        let options = FindOptions::new()
            .with_limit(3)
            .with_initial_page_state("token")
            .with_include_similarity(true);

        let payload = FindPayload::find_one(Some(json!({})), &options);
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({"filter": {}, "options": {"includeSimilarity": true}})
        );
    }
}
