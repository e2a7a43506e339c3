use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::column::{Column, ColumnType};

/// Clustering order of a sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ascending => serializer.serialize_i8(1),
            Self::Descending => serializer.serialize_i8(-1),
        }
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i8::deserialize(deserializer)? {
            1 => Ok(Self::Ascending),
            -1 => Ok(Self::Descending),
            other => Err(serde::de::Error::custom(format!(
                "invalid sort order {other}, expected 1 or -1"
            ))),
        }
    }
}

/// Primary key of a table.
///
/// Serializes as a bare column name when there is exactly one partition
/// column and no clustering, and as `{"partitionBy", "partitionSort"}`
/// otherwise. Both forms are accepted when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryKey {
    pub partition_by: Vec<String>,
    pub partition_sort: BTreeMap<String, SortOrder>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompoundPrimaryKey {
    partition_by: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    partition_sort: BTreeMap<String, SortOrder>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrimaryKeyRepr {
    Single(String),
    Compound(CompoundPrimaryKey),
}

impl PrimaryKey {
    /// Single-column partition key.
    pub fn single(column: impl Into<String>) -> Self {
        Self {
            partition_by: vec![column.into()],
            partition_sort: BTreeMap::new(),
        }
    }

    /// Compound partition key.
    pub fn partition_by<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            partition_by: columns.into_iter().map(Into::into).collect(),
            partition_sort: BTreeMap::new(),
        }
    }

    /// Adds a clustering column.
    #[must_use]
    pub fn with_sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.partition_sort.insert(column.into(), order);
        self
    }
}

impl Serialize for PrimaryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let ([column], true) = (self.partition_by.as_slice(), self.partition_sort.is_empty()) {
            return serializer.serialize_str(column);
        }

        CompoundPrimaryKey {
            partition_by: self.partition_by.clone(),
            partition_sort: self.partition_sort.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PrimaryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PrimaryKeyRepr::deserialize(deserializer)? {
            PrimaryKeyRepr::Single(column) => Self::single(column),
            PrimaryKeyRepr::Compound(key) => Self {
                partition_by: key.partition_by,
                partition_sort: key.partition_sort,
            },
        })
    }
}

/// Full schema of a table: columns and primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub columns: BTreeMap<String, Column>,
    pub primary_key: PrimaryKey,
}

impl TableDefinition {
    /// Creates an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, column: impl Into<Column>) -> Self {
        self.columns.insert(name.into(), column.into());
        self
    }

    /// Adds a list column of the given element type.
    #[must_use]
    pub fn with_list_column(self, name: impl Into<String>, value_type: ColumnType) -> Self {
        self.with_column(name, Column::list(value_type.into()))
    }

    /// Adds a set column of the given element type.
    #[must_use]
    pub fn with_set_column(self, name: impl Into<String>, value_type: ColumnType) -> Self {
        self.with_column(name, Column::set(value_type.into()))
    }

    /// Adds a map column.
    #[must_use]
    pub fn with_map_column(
        self,
        name: impl Into<String>,
        key_type: ColumnType,
        value_type: ColumnType,
    ) -> Self {
        self.with_column(name, Column::map(key_type, value_type.into()))
    }

    /// Adds a vector column of the given dimension.
    #[must_use]
    pub fn with_vector_column(self, name: impl Into<String>, dimension: u32) -> Self {
        self.with_column(name, Column::vector(dimension))
    }

    /// Sets the partition columns, replacing any set before.
    #[must_use]
    pub fn with_partition_by<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.primary_key.partition_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a clustering column.
    #[must_use]
    pub fn with_partition_sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.primary_key.partition_sort.insert(column.into(), order);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_primary_key() {
        let key = PrimaryKey::single("title");
        assert_eq!(serde_json::to_value(&key).unwrap(), json!("title"));

        let parsed: PrimaryKey = serde_json::from_value(json!("title")).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_compound_primary_key() {
        let key =
            PrimaryKey::partition_by(["author"]).with_sort("published", SortOrder::Descending);
        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(
            value,
            json!({"partitionBy": ["author"], "partitionSort": {"published": -1}})
        );

        let parsed: PrimaryKey = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_multi_column_partition() {
        let key = PrimaryKey::partition_by(["a", "b"]);
        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            json!({"partitionBy": ["a", "b"]})
        );
    }

    #[test]
    fn test_definition_builder() {
        let definition = TableDefinition::new()
            .with_column("id", ColumnType::Uuid)
            .with_column("title", Column::text())
            .with_list_column("genres", ColumnType::Text)
            .with_vector_column("embedding", 3)
            .with_partition_by(["id"]);

        assert_eq!(
            serde_json::to_value(&definition).unwrap(),
            json!({
                "columns": {
                    "embedding": {"type": "vector", "dimension": 3},
                    "genres": {"type": "list", "valueType": {"type": "text"}},
                    "id": {"type": "uuid"},
                    "title": {"type": "text"}
                },
                "primaryKey": "id"
            })
        );
    }

    #[test]
    fn test_invalid_sort_order() {
        let result = serde_json::from_value::<PrimaryKey>(
            json!({"partitionBy": ["a"], "partitionSort": {"b": 2}}),
        );
        assert!(result.is_err());
    }
}
