#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod admin;
pub mod command;
pub mod options;
pub mod transport;

mod client;
mod collection;
mod database;
mod find;
mod resource;
mod table;

pub use admin::{Admin, DbEnvironment, FindAvailableRegionsOptions, Region, RegionType};
pub use client::Client;
pub use collection::Collection;
pub use command::{Command, Envelope, RawResponse};
pub use database::{CreateTableOptions, Database};
pub use find::FindOptions;
pub use options::{ApiOptions, TimeoutOptions, WarningHandler};
pub use table::{CreateIndexOptions, CreateVectorIndexOptions, Table};
// Re-exported so callers need a single dependency.
pub use dataapi_core::{
    Cursor, CursorState, DataApiError, DataApiErrors, Error, ErrorKind, Filter, FilterSpec, Result,
    Warning, Warnings,
};
