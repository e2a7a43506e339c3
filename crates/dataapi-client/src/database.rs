//! Database handle and schema commands.

use std::sync::Arc;

use dataapi_core::Result;
use dataapi_core::table::{CollectionDefinition, TableDefinition};
use serde::Serialize;

use crate::client::Client;
use crate::collection::Collection;
use crate::command::{Command, Envelope};
use crate::options::ApiOptions;
use crate::table::Table;

/// Tracing target for database-level commands.
pub const TRACING_TARGET: &str = "dataapi_client::database";

struct DatabaseInner {
    client: Option<Client>,
    endpoint: String,
    options: Option<ApiOptions>,
}

/// Handle for a single database endpoint.
///
/// Cheap to clone. Options set here are inherited by collections, tables and
/// commands created from it.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

/// Options for [`Database::create_table`].
#[derive(Debug, Clone, Default)]
pub struct CreateTableOptions {
    /// Succeed without changes when the table already exists.
    pub if_not_exists: bool,
    /// Create the table in this keyspace instead of the resolved one.
    pub keyspace: Option<String>,
}

impl CreateTableOptions {
    #[must_use]
    pub fn with_if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = if_not_exists;
        self
    }

    #[must_use]
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }
}

#[derive(Serialize)]
struct NamePayload<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CreateCollectionPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a CollectionDefinition>,
}

#[derive(Serialize)]
struct CreateTablePayload<'a> {
    name: &'a str,
    definition: &'a TableDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<IfNotExists>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IfNotExists {
    pub if_not_exists: bool,
}

impl IfNotExists {
    pub(crate) fn when(if_not_exists: bool) -> Option<Self> {
        if_not_exists.then_some(Self { if_not_exists })
    }
}

impl Database {
    /// Creates a handle that is not attached to a client.
    pub fn new(endpoint: impl Into<String>, options: Option<ApiOptions>) -> Self {
        Self::build(None, endpoint.into(), options)
    }

    pub(crate) fn with_client(
        client: Client,
        endpoint: String,
        options: Option<ApiOptions>,
    ) -> Self {
        Self::build(Some(client), endpoint, options)
    }

    fn build(client: Option<Client>, endpoint: String, options: Option<ApiOptions>) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                client,
                endpoint,
                options,
            }),
        }
    }

    /// The Data API endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Options set on the database.
    pub fn options(&self) -> Option<&ApiOptions> {
        self.inner.options.as_ref()
    }

    /// The owning client, if any.
    pub fn client(&self) -> Option<&Client> {
        self.inner.client.as_ref()
    }

    pub(crate) fn client_options(&self) -> Option<&ApiOptions> {
        self.client().map(Client::options)
    }

    /// Returns a handle for an existing collection.
    pub fn collection(&self, name: impl Into<String>, options: Option<ApiOptions>) -> Collection {
        Collection::new(self.clone(), name.into(), options)
    }

    /// Returns a handle for an existing table.
    pub fn table(&self, name: impl Into<String>, options: Option<ApiOptions>) -> Table {
        Table::new(self.clone(), name.into(), options)
    }

    fn command(&self, name: &str, payload: impl Serialize) -> Result<Command> {
        Ok(Command::new(Some(self.clone()), Envelope::new(name, payload)?))
    }

    /// Creates a collection and returns its handle.
    ///
    /// Warnings reach the configured warning handler only.
    pub async fn create_collection(
        &self,
        name: &str,
        definition: Option<CollectionDefinition>,
    ) -> Result<Collection> {
        let payload = CreateCollectionPayload {
            name,
            options: definition.as_ref(),
        };
        self.command("createCollection", payload)?
            .execute()
            .await
            .into_result()?;

        tracing::info!(target: TRACING_TARGET, collection = name, "Collection created");
        Ok(self.collection(name, None))
    }

    /// Drops a collection and all of its documents.
    pub async fn drop_collection(&self, name: &str) -> Result<()> {
        self.command("deleteCollection", NamePayload { name })?
            .execute()
            .await
            .into_result()?;

        tracing::info!(target: TRACING_TARGET, collection = name, "Collection dropped");
        Ok(())
    }

    /// Creates a table and returns its handle.
    pub async fn create_table(
        &self,
        name: &str,
        definition: &TableDefinition,
        options: CreateTableOptions,
    ) -> Result<Table> {
        let payload = CreateTablePayload {
            name,
            definition,
            options: IfNotExists::when(options.if_not_exists),
        };
        self.command("createTable", payload)?
            .with_keyspace(options.keyspace)
            .execute()
            .await
            .into_result()?;

        tracing::info!(target: TRACING_TARGET, table = name, "Table created");
        Ok(self.table(name, None))
    }

    /// Drops a table.
    pub async fn drop_table(&self, name: &str) -> Result<()> {
        self.command("dropTable", NamePayload { name })?
            .execute()
            .await
            .into_result()?;

        tracing::info!(target: TRACING_TARGET, table = name, "Table dropped");
        Ok(())
    }

    /// Drops a table index by name.
    ///
    /// Indexes are scoped to the keyspace, so no table is named.
    pub async fn drop_table_index(&self, name: &str) -> Result<()> {
        self.command("dropIndex", NamePayload { name })?
            .execute()
            .await
            .into_result()?;

        tracing::info!(target: TRACING_TARGET, index = name, "Table index dropped");
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("endpoint", &self.inner.endpoint)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use dataapi_core::table::{Column, SortOrder, VectorMetric};
    use serde_json::{Value, json};

    use super::*;
    use crate::transport::MockTransport;

    fn database(transport: &MockTransport) -> Database {
        Client::new(ApiOptions::new().with_transport(transport.clone().into_shared()))
            .database("https://db.example.com", Some(ApiOptions::new().with_keyspace("library")))
    }

    fn last_body(transport: &MockTransport) -> Value {
        let request = transport.last_request().unwrap();
        serde_json::from_str(request.body_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_create_collection() {
        let transport = MockTransport::new().with_json(200, json!({"status": {"ok": 1}}));
        let database = database(&transport);

        let definition = CollectionDefinition::new().with_vector(1024, VectorMetric::Cosine);
        let collection = database
            .create_collection("books", Some(definition))
            .await
            .unwrap();

        assert_eq!(collection.name(), "books");
        assert_eq!(
            last_body(&transport),
            json!({"createCollection": {
                "name": "books",
                "options": {"vector": {"dimension": 1024, "metric": "cosine"}}
            }})
        );
        assert_eq!(
            transport.last_request().unwrap().url.path(),
            "/api/json/v1/library"
        );
    }

    #[tokio::test]
    async fn test_drop_collection() {
        let transport = MockTransport::new().with_json(200, json!({"status": {"ok": 1}}));
        database(&transport).drop_collection("books").await.unwrap();
        assert_eq!(last_body(&transport), json!({"deleteCollection": {"name": "books"}}));
    }

    #[tokio::test]
    async fn test_create_table_with_keyspace_override() {
        let transport = MockTransport::new().with_json(200, json!({"status": {"ok": 1}}));
        let definition = TableDefinition::new()
            .with_column("title", Column::text())
            .with_column("rating", Column::float())
            .with_partition_by(["title"])
            .with_partition_sort("rating", SortOrder::Descending);

        let table = database(&transport)
            .create_table(
                "books",
                &definition,
                CreateTableOptions::default()
                    .with_if_not_exists(true)
                    .with_keyspace("archive"),
            )
            .await
            .unwrap();

        assert_eq!(table.name(), "books");
        let request = transport.last_request().unwrap();
        assert_eq!(request.url.path(), "/api/json/v1/archive");

        let body = last_body(&transport);
        assert_eq!(body["createTable"]["options"], json!({"ifNotExists": true}));
        assert_eq!(
            body["createTable"]["definition"]["primaryKey"],
            json!({"partitionBy": ["title"], "partitionSort": {"rating": -1}})
        );
    }

    #[tokio::test]
    async fn test_create_table_without_options() {
        let transport = MockTransport::new().with_json(200, json!({"status": {"ok": 1}}));
        let definition = TableDefinition::new()
            .with_column("id", Column::uuid())
            .with_partition_by(["id"]);

        database(&transport)
            .create_table("events", &definition, CreateTableOptions::default())
            .await
            .unwrap();

        let body = last_body(&transport);
        assert!(body["createTable"].get("options").is_none());
    }

    #[tokio::test]
    async fn test_drop_table_and_index() {
        let transport = MockTransport::new()
            .with_json(200, json!({"status": {"ok": 1}}))
            .with_json(200, json!({"status": {"ok": 1}}));
        let database = database(&transport);

        database.drop_table_index("rating_idx").await.unwrap();
        database.drop_table("books").await.unwrap();

        let requests = transport.requests();
        let bodies: Vec<Value> = requests
            .iter()
            .map(|request| serde_json::from_str(request.body_text().unwrap()).unwrap())
            .collect();
        assert_eq!(bodies[0], json!({"dropIndex": {"name": "rating_idx"}}));
        assert_eq!(bodies[1], json!({"dropTable": {"name": "books"}}));
    }

    #[tokio::test]
    async fn test_schema_error_propagates() {
        let transport = MockTransport::new().with_json(
            200,
            json!({"errors": [{
                "message": "Collection already exists",
                "errorCode": "EXISTING_COLLECTION_DIFFERENT_SETTINGS"
            }]}),
        );
        let error = database(&transport)
            .create_collection("books", None)
            .await
            .unwrap_err();

        assert!(error.is_data_api());
        assert!(
            error
                .data_api_errors()
                .unwrap()
                .contains_code("EXISTING_COLLECTION_DIFFERENT_SETTINGS")
        );
    }

    #[test]
    fn test_detached_database_has_no_client() {
        let database = Database::new("https://db.example.com", None);
        assert!(database.client().is_none());
        assert!(database.client_options().is_none());
        assert_eq!(database.endpoint(), "https://db.example.com");
    }
}
