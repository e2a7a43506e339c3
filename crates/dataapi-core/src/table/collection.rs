use serde::{Deserialize, Serialize};

use super::column::VectorService;
use super::index::VectorMetric;

/// Vector search settings of a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
    /// Defaults to cosine on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<VectorMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<VectorService>,
}

/// Options sent with `createCollection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<VectorOptions>,
}

impl CollectionDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables vector search with the given dimension and metric.
    #[must_use]
    pub fn with_vector(mut self, dimension: u32, metric: VectorMetric) -> Self {
        let vector = self.vector.get_or_insert_with(VectorOptions::default);
        vector.dimension = Some(dimension);
        vector.metric = Some(metric);
        self
    }

    /// Generates vectors server-side with the given provider.
    #[must_use]
    pub fn with_vector_service(mut self, service: VectorService) -> Self {
        self.vector
            .get_or_insert_with(VectorOptions::default)
            .service = Some(service);
        self
    }
}
