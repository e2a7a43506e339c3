use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Similarity metric used by vector indexes and vector collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VectorMetric {
    #[default]
    Cosine,
    DotProduct,
    Euclidean,
}

/// Target of a regular index.
///
/// Map columns can be indexed on their keys or values, which the wire
/// format expresses as `{"column": "$keys"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexColumn {
    Column(String),
    MapKeys(String),
    MapValues(String),
}

impl Serialize for IndexColumn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (column, selector) = match self {
            Self::Column(column) => return serializer.serialize_str(column),
            Self::MapKeys(column) => (column, "$keys"),
            Self::MapValues(column) => (column, "$values"),
        };

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(column, selector)?;
        map.end()
    }
}

impl From<&str> for IndexColumn {
    fn from(column: &str) -> Self {
        Self::Column(column.to_owned())
    }
}

impl From<String> for IndexColumn {
    fn from(column: String) -> Self {
        Self::Column(column)
    }
}

/// Options of an existing index, as reported by `listIndexes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinitionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<VectorMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascii: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

/// Indexed column and its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Column name, or a `{"column": "$keys"}` object for map indexes.
    pub column: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<IndexDefinitionOptions>,
}

/// An index on a table.
///
/// `listIndexes` returns bare names unless `explain` is requested, in which
/// case the definition and type are populated too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<IndexDefinition>,
    /// `regular` or `vector`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplainedIndex {
    name: String,
    #[serde(default)]
    definition: Option<IndexDefinition>,
    #[serde(default)]
    index_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexDescriptorRepr {
    Name(String),
    Explained(ExplainedIndex),
}

impl<'de> Deserialize<'de> for IndexDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match IndexDescriptorRepr::deserialize(deserializer)? {
            IndexDescriptorRepr::Name(name) => Self {
                name,
                ..Self::default()
            },
            IndexDescriptorRepr::Explained(index) => Self {
                name: index.name,
                definition: index.definition,
                index_type: index.index_type,
            },
        })
    }
}
