use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Column data types supported by tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Int,
    BigInt,
    SmallInt,
    TinyInt,
    Float,
    Double,
    Decimal,
    Boolean,
    Date,
    Time,
    Timestamp,
    Uuid,
    TimeUuid,
    Blob,
    Varint,
    Inet,
    Ascii,
    Vector,
    Set,
    List,
    Map,
    #[strum(serialize = "userDefined")]
    #[serde(rename = "userDefined")]
    UserDefined,
}

/// Embedding provider used to vectorize a column or collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorService {
    /// Provider name, e.g. `openai` or `nvidia`.
    pub provider: String,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub authentication: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters: HashMap<String, String>,
}

impl VectorService {
    pub fn new(provider: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_authentication(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.authentication.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// A column's type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(rename = "type")]
    pub kind: ColumnType,
    /// Vector dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
    /// Vectorize provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<VectorService>,
    /// Element type of set, list and map columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<Box<Column>>,
    /// Key type of map columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<ColumnType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udt_name: Option<String>,
}

impl Column {
    /// Creates a scalar column of the given type.
    pub const fn new(kind: ColumnType) -> Self {
        Self {
            kind,
            dimension: None,
            service: None,
            value_type: None,
            key_type: None,
            udt_name: None,
        }
    }

    pub const fn text() -> Self {
        Self::new(ColumnType::Text)
    }

    pub const fn int() -> Self {
        Self::new(ColumnType::Int)
    }

    pub const fn big_int() -> Self {
        Self::new(ColumnType::BigInt)
    }

    pub const fn float() -> Self {
        Self::new(ColumnType::Float)
    }

    pub const fn double() -> Self {
        Self::new(ColumnType::Double)
    }

    pub const fn boolean() -> Self {
        Self::new(ColumnType::Boolean)
    }

    pub const fn date() -> Self {
        Self::new(ColumnType::Date)
    }

    pub const fn timestamp() -> Self {
        Self::new(ColumnType::Timestamp)
    }

    pub const fn uuid() -> Self {
        Self::new(ColumnType::Uuid)
    }

    /// Vector column with a fixed dimension.
    pub const fn vector(dimension: u32) -> Self {
        let mut column = Self::new(ColumnType::Vector);
        column.dimension = Some(dimension);
        column
    }

    /// Vector column populated by an embedding provider.
    ///
    /// A zero dimension lets the provider decide.
    pub fn vector_with_service(dimension: u32, service: VectorService) -> Self {
        let mut column = Self::new(ColumnType::Vector);
        column.dimension = (dimension > 0).then_some(dimension);
        column.service = Some(service);
        column
    }

    pub fn set(value_type: Column) -> Self {
        let mut column = Self::new(ColumnType::Set);
        column.value_type = Some(Box::new(value_type));
        column
    }

    pub fn list(value_type: Column) -> Self {
        let mut column = Self::new(ColumnType::List);
        column.value_type = Some(Box::new(value_type));
        column
    }

    pub fn map(key_type: ColumnType, value_type: Column) -> Self {
        let mut column = Self::new(ColumnType::Map);
        column.key_type = Some(key_type);
        column.value_type = Some(Box::new(value_type));
        column
    }

    /// Column of a user-defined type.
    pub fn user_defined(udt_name: impl Into<String>) -> Self {
        let mut column = Self::new(ColumnType::UserDefined);
        column.udt_name = Some(udt_name.into());
        column
    }
}

impl From<ColumnType> for Column {
    fn from(kind: ColumnType) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_scalar_column() {
        assert_eq!(serde_json::to_value(Column::text()).unwrap(), json!({"type": "text"}));
        assert_eq!(
            serde_json::to_value(Column::new(ColumnType::TimeUuid)).unwrap(),
            json!({"type": "timeuuid"})
        );
    }

    #[test]
    fn test_collection_columns() {
        assert_eq!(
            serde_json::to_value(Column::map(ColumnType::Text, Column::int())).unwrap(),
            json!({"type": "map", "keyType": "text", "valueType": {"type": "int"}})
        );
        assert_eq!(
            serde_json::to_value(Column::user_defined("address")).unwrap(),
            json!({"type": "userDefined", "udtName": "address"})
        );
    }

    #[test]
    fn test_vector_columns() {
        assert_eq!(
            serde_json::to_value(Column::vector(1536)).unwrap(),
            json!({"type": "vector", "dimension": 1536})
        );

        let column =
            Column::vector_with_service(0, VectorService::new("openai", "text-embedding-3-small"));
        assert_eq!(
            serde_json::to_value(column).unwrap(),
            json!({
                "type": "vector",
                "service": {"provider": "openai", "modelName": "text-embedding-3-small"}
            })
        );
    }

    #[test]
    fn test_column_type_strum() {
        assert_eq!(ColumnType::BigInt.as_ref(), "bigint");
        assert_eq!(ColumnType::UserDefined.as_ref(), "userDefined");
    }
}
