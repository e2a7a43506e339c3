//! Schema types for tables, indexes and collections.

mod collection;
mod column;
mod definition;
mod index;

pub use self::collection::{CollectionDefinition, VectorOptions};
pub use self::column::{Column, ColumnType, VectorService};
pub use self::definition::{PrimaryKey, SortOrder, TableDefinition};
pub use self::index::{
    IndexColumn, IndexDefinition, IndexDefinitionOptions, IndexDescriptor, VectorMetric,
};
