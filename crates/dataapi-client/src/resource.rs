//! Operations shared by collections and tables.

use std::sync::Arc;

use dataapi_core::results::{InsertResponse, SingleResult};
use dataapi_core::{Cursor, Error, FilterSpec, Result};
use serde::Serialize;

use crate::command::{Command, Envelope};
use crate::database::Database;
use crate::find::{FindOptions, FindPages, FindPayload, FindTarget};
use crate::options::ApiOptions;

#[derive(Serialize)]
struct InsertOnePayload<'a, T> {
    document: &'a T,
}

#[derive(Serialize)]
struct InsertManyPayload<'a, T> {
    documents: &'a [T],
}

/// A named collection or table within a database.
#[derive(Debug, Clone)]
pub(crate) struct Resource {
    database: Database,
    name: String,
    options: Option<Arc<ApiOptions>>,
}

impl Resource {
    pub(crate) fn new(database: Database, name: String, options: Option<ApiOptions>) -> Self {
        Self {
            database,
            name,
            options: options.map(Arc::new),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn database(&self) -> &Database {
        &self.database
    }

    pub(crate) fn options(&self) -> Option<&ApiOptions> {
        self.options.as_deref()
    }

    /// Builds a command targeting this resource.
    pub(crate) fn command(
        &self,
        name: &str,
        payload: impl Serialize,
        call_options: Option<ApiOptions>,
    ) -> Result<Command> {
        Ok(Command::new(Some(self.database.clone()), Envelope::new(name, payload)?)
            .with_resource(self.name.as_str())
            .with_resource_options(self.options.clone())
            .with_call_options(call_options))
    }

    pub(crate) async fn insert_one<T: Serialize>(
        &self,
        document: &T,
        options: Option<ApiOptions>,
    ) -> Result<InsertResponse> {
        self.command("insertOne", InsertOnePayload { document }, options)?
            .execute()
            .await
            .decode()
    }

    /// `label` names the argument in the empty-input error.
    pub(crate) async fn insert_many<T: Serialize>(
        &self,
        documents: &[T],
        label: &str,
        options: Option<ApiOptions>,
    ) -> Result<InsertResponse> {
        if documents.is_empty() {
            return Err(Error::invalid_argument(format!("{label}: must be non-empty")));
        }

        self.command("insertMany", InsertManyPayload { documents }, options)?
            .with_bulk(true)
            .execute()
            .await
            .decode()
    }

    pub(crate) fn find(
        &self,
        filter: FilterSpec,
        options: FindOptions,
        target: FindTarget,
    ) -> Cursor {
        let filter = match filter.to_value() {
            Ok(filter) => filter,
            Err(error) => return Cursor::with_error(error),
        };

        let payload = FindPayload::find(filter, &options, target);
        Cursor::new(FindPages::new(self.clone(), payload, options))
    }

    pub(crate) async fn find_one(&self, filter: FilterSpec, options: FindOptions) -> SingleResult {
        let filter = match filter.to_value() {
            Ok(filter) => filter,
            Err(error) => return SingleResult::from_error(error),
        };

        let payload = FindPayload::find_one(filter, &options);
        match self.command("findOne", payload, options.api_options) {
            Ok(command) => command.execute().await.into_single(),
            Err(error) => SingleResult::from_error(error),
        }
    }
}
