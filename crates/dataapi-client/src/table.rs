//! Tables and their indexes.

use dataapi_core::results::{InsertResponse, SingleResult};
use dataapi_core::table::{IndexColumn, IndexDefinitionOptions, IndexDescriptor, VectorMetric};
use dataapi_core::{Cursor, FilterSpec, Result};
use serde::{Deserialize, Serialize};

use crate::database::{Database, IfNotExists};
use crate::find::{FindOptions, FindTarget};
use crate::options::ApiOptions;
use crate::resource::Resource;

/// Options for [`Table::create_index`].
#[derive(Debug, Clone, Default)]
pub struct CreateIndexOptions {
    /// Index ASCII-folded text.
    pub ascii: Option<bool>,
    /// Index Unicode-normalized text.
    pub normalize: Option<bool>,
    pub case_sensitive: Option<bool>,
    pub if_not_exists: bool,
}

impl CreateIndexOptions {
    #[must_use]
    pub fn with_ascii(mut self, ascii: bool) -> Self {
        self.ascii = Some(ascii);
        self
    }

    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = Some(normalize);
        self
    }

    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    #[must_use]
    pub fn with_if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = if_not_exists;
        self
    }

    fn definition_options(&self) -> Option<IndexDefinitionOptions> {
        if self.ascii.is_none() && self.normalize.is_none() && self.case_sensitive.is_none() {
            return None;
        }

        Some(IndexDefinitionOptions {
            ascii: self.ascii,
            normalize: self.normalize,
            case_sensitive: self.case_sensitive,
            ..IndexDefinitionOptions::default()
        })
    }
}

/// Options for [`Table::create_vector_index`].
#[derive(Debug, Clone, Default)]
pub struct CreateVectorIndexOptions {
    pub metric: Option<VectorMetric>,
    /// Embedding model the vectors come from, e.g. `openai-v3-small`.
    pub source_model: Option<String>,
    pub if_not_exists: bool,
}

impl CreateVectorIndexOptions {
    #[must_use]
    pub fn with_metric(mut self, metric: VectorMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    #[must_use]
    pub fn with_source_model(mut self, source_model: impl Into<String>) -> Self {
        self.source_model = Some(source_model.into());
        self
    }

    #[must_use]
    pub fn with_if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = if_not_exists;
        self
    }

    fn definition_options(&self) -> Option<IndexDefinitionOptions> {
        if self.metric.is_none() && self.source_model.is_none() {
            return None;
        }

        Some(IndexDefinitionOptions {
            metric: self.metric,
            source_model: self.source_model.clone(),
            ..IndexDefinitionOptions::default()
        })
    }
}

#[derive(Serialize)]
struct CreateIndexPayload<'a, C: Serialize> {
    name: &'a str,
    definition: CreateIndexDefinition<C>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<IfNotExists>,
}

#[derive(Serialize)]
struct CreateIndexDefinition<C: Serialize> {
    column: C,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<IndexDefinitionOptions>,
}

#[derive(Serialize)]
struct ListIndexesPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ListIndexesOptions>,
}

#[derive(Serialize)]
struct ListIndexesOptions {
    explain: bool,
}

#[derive(Deserialize)]
struct ListIndexesResponse {
    #[serde(default)]
    status: ListIndexesStatus,
}

#[derive(Default, Deserialize)]
struct ListIndexesStatus {
    #[serde(default)]
    indexes: Vec<IndexDescriptor>,
}

/// Handle for a table.
#[derive(Debug, Clone)]
pub struct Table {
    resource: Resource,
}

impl Table {
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

    /// Options set on the table.
    pub fn options(&self) -> Option<&ApiOptions> {
        self.resource.options()
    }

    /// Inserts a single row. Every primary key column must be present.
    pub async fn insert_one<T: Serialize>(
        &self,
        row: &T,
        options: Option<ApiOptions>,
    ) -> Result<InsertResponse> {
        self.resource.insert_one(row, options).await
    }

    /// Inserts several rows in one bulk command.
    pub async fn insert_many<T: Serialize>(
        &self,
        rows: &[T],
        options: Option<ApiOptions>,
    ) -> Result<InsertResponse> {
        self.resource.insert_many(rows, "rows", options).await
    }

    /// Finds the first row matching `filter`.
    pub async fn find_one(
        &self,
        filter: impl Into<FilterSpec>,
        options: FindOptions,
    ) -> SingleResult {
        self.resource.find_one(filter.into(), options).await
    }

    /// Returns a cursor over every row matching `filter`.
    ///
    /// `include_sort_vector` is not sent for tables.
    pub fn find(&self, filter: impl Into<FilterSpec>, options: FindOptions) -> Cursor {
        self.resource.find(filter.into(), options, FindTarget::Table)
    }

    /// Creates a regular index on a column, or on the keys or values of a map
    /// column.
    pub async fn create_index(
        &self,
        name: &str,
        column: impl Into<IndexColumn>,
        options: CreateIndexOptions,
    ) -> Result<()> {
        let payload = CreateIndexPayload {
            name,
            definition: CreateIndexDefinition {
                column: column.into(),
                options: options.definition_options(),
            },
            options: IfNotExists::when(options.if_not_exists),
        };

        self.resource
            .command("createIndex", payload, None)?
            .execute()
            .await
            .into_result()?;
        Ok(())
    }

    /// Creates a vector index on a vector column.
    pub async fn create_vector_index(
        &self,
        name: &str,
        column: &str,
        options: CreateVectorIndexOptions,
    ) -> Result<()> {
        let payload = CreateIndexPayload {
            name,
            definition: CreateIndexDefinition {
                column,
                options: options.definition_options(),
            },
            options: IfNotExists::when(options.if_not_exists),
        };

        self.resource
            .command("createVectorIndex", payload, None)?
            .execute()
            .await
            .into_result()?;
        Ok(())
    }

    /// Lists the indexes of this table.
    ///
    /// Only names are returned unless `explain` is set.
    pub async fn list_indexes(&self, explain: bool) -> Result<Vec<IndexDescriptor>> {
        let payload = ListIndexesPayload {
            options: explain.then_some(ListIndexesOptions { explain }),
        };

        let response: ListIndexesResponse = self
            .resource
            .command("listIndexes", payload, None)?
            .execute()
            .await
            .decode()?;
        Ok(response.status.indexes)
    }
}
