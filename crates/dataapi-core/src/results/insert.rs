use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response to `insertOne` and `insertMany`.
///
/// Expected body shape:
/// `{"status": {"insertedIds": [...], "primaryKeySchema": {...}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertResponse {
    #[serde(default)]
    pub status: InsertStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertStatus {
    /// Identifiers of the inserted documents or rows.
    ///
    /// Scalars for single-column keys, arrays for compound table keys.
    #[serde(default)]
    pub inserted_ids: Vec<Value>,
    /// Primary key layout, reported by table inserts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key_schema: Option<HashMap<String, ColumnTypeInfo>>,
}

/// Type of a single primary key column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeInfo {
    #[serde(rename = "type")]
    pub kind: String,
}

impl InsertResponse {
    /// Identifiers of the inserted documents or rows.
    pub fn inserted_ids(&self) -> &[Value] {
        &self.status.inserted_ids
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_collection_insert_response() {
        let response: InsertResponse =
            serde_json::from_str(r#"{"status":{"insertedIds":["a","b"]}}"#).unwrap();
        assert_eq!(response.inserted_ids(), &[json!("a"), json!("b")]);
        assert!(response.status.primary_key_schema.is_none());
    }

    #[test]
    fn test_table_insert_response() {
        let body = concat!(
            r#"{"status":{"primaryKeySchema":{"title":{"type":"text"}},"#,
            r#""insertedIds":[["Dune"]]}}"#
        );
        let response: InsertResponse = serde_json::from_str(body).unwrap();
        let schema = response.status.primary_key_schema.unwrap();
        assert_eq!(schema["title"].kind, "text");
    }
}
