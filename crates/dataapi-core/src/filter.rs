//! Query filters in the Data API wire encoding.
//!
//! Filters can be built with the typed [`Filter`] constructors or passed as
//! raw JSON maps. [`FilterSpec`] is what query operations accept; it is
//! validated before any request is built.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// Operators understood by the Data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
pub enum FilterOperator {
    #[strum(serialize = "$and")]
    And,
    #[strum(serialize = "$or")]
    Or,
    #[strum(serialize = "$not")]
    Not,
    #[strum(serialize = "$gt")]
    GreaterThan,
    #[strum(serialize = "$gte")]
    GreaterThanEqual,
    #[strum(serialize = "$lt")]
    LessThan,
    #[strum(serialize = "$lte")]
    LessThanEqual,
    #[strum(serialize = "$eq")]
    Equal,
    #[strum(serialize = "$ne")]
    NotEqual,
    #[strum(serialize = "$in")]
    In,
    #[strum(serialize = "$nin")]
    NotIn,
    #[strum(serialize = "$exists")]
    Exists,
    #[strum(serialize = "$all")]
    All,
    #[strum(serialize = "$size")]
    Size,
}

/// A typed filter expression.
///
/// Field comparisons encode as `{"field": {"$op": value}}`, except equality
/// which encodes as `{"field": value}`. Logical operators encode as
/// `{"$and": [...]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    op: FilterOperator,
    field: Option<String>,
    value: Value,
    children: Vec<Filter>,
}

impl Filter {
    fn field(op: FilterOperator, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op,
            field: Some(field.into()),
            value: value.into(),
            children: Vec::new(),
        }
    }

    fn logical(op: FilterOperator, children: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            op,
            field: None,
            value: Value::Null,
            children: children.into_iter().collect(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(FilterOperator::Equal, field, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(FilterOperator::NotEqual, field, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(FilterOperator::LessThan, field, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(FilterOperator::LessThanEqual, field, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(FilterOperator::GreaterThan, field, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(FilterOperator::GreaterThanEqual, field, value)
    }

    /// Matches when the field equals any of `values`.
    pub fn is_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::field(FilterOperator::In, field, values)
    }

    /// Matches when the field equals none of `values`.
    pub fn not_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::field(FilterOperator::NotIn, field, values)
    }

    pub fn exists(field: impl Into<String>, exists: bool) -> Self {
        Self::field(FilterOperator::Exists, field, exists)
    }

    /// Matches arrays containing every one of `values`.
    pub fn all<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::field(FilterOperator::All, field, values)
    }

    /// Matches arrays of exactly `size` elements.
    pub fn size(field: impl Into<String>, size: u64) -> Self {
        Self::field(FilterOperator::Size, field, size)
    }

    pub fn and(children: impl IntoIterator<Item = Filter>) -> Self {
        Self::logical(FilterOperator::And, children)
    }

    pub fn or(children: impl IntoIterator<Item = Filter>) -> Self {
        Self::logical(FilterOperator::Or, children)
    }

    /// Negates `filter`. Encodes as `{"$not": <filter>}`.
    pub fn not(filter: Filter) -> Self {
        Self::logical(FilterOperator::Not, [filter])
    }

    /// Returns the operator of this expression.
    #[must_use]
    pub fn operator(&self) -> FilterOperator {
        self.op
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let (FilterOperator::Not, [child]) = (self.op, self.children.as_slice()) {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry(self.op.as_ref(), child)?;
            return map.end();
        }

        if !self.children.is_empty() {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry(self.op.as_ref(), &self.children)?;
            return map.end();
        }

        let Some(field) = &self.field else {
            return serializer.serialize_none();
        };

        let mut map = serializer.serialize_map(Some(1))?;
        if self.op == FilterOperator::Equal {
            map.serialize_entry(field, &self.value)?;
        } else {
            let mut inner = Map::with_capacity(1);
            inner.insert(self.op.as_ref().to_owned(), self.value.clone());
            map.serialize_entry(field, &inner)?;
        }
        map.end()
    }
}

/// Filter argument accepted by query operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FilterSpec {
    /// No filter; the `filter` key is omitted from the payload.
    #[default]
    None,
    /// A typed expression.
    Expr(Filter),
    /// A JSON object in wire form, e.g. `{"title": {"$eq": "Dune"}}`.
    Map(Map<String, Value>),
    /// An arbitrary JSON value. Must be an object to pass validation.
    Raw(Value),
}

impl FilterSpec {
    /// Rejects values that cannot be sent as a filter.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Raw(Value::Object(_)) | Self::Raw(Value::Null) => Ok(()),
            Self::Raw(other) => Err(Error::invalid_argument(format!(
                "invalid filter type: {}",
                json_type_name(other)
            ))),
            Self::None | Self::Expr(_) | Self::Map(_) => Ok(()),
        }
    }

    /// Validates and converts into the payload value, `None` when absent.
    pub fn to_value(&self) -> Result<Option<Value>> {
        self.validate()?;
        let value = match self {
            Self::None | Self::Raw(Value::Null) => None,
            Self::Expr(filter) => Some(serde_json::to_value(filter)?),
            Self::Map(map) => Some(Value::Object(map.clone())),
            Self::Raw(value) => Some(value.clone()),
        };
        Ok(value)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Filter> for FilterSpec {
    fn from(filter: Filter) -> Self {
        Self::Expr(filter)
    }
}

impl From<Map<String, Value>> for FilterSpec {
    fn from(map: Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Value> for FilterSpec {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

impl From<Option<Filter>> for FilterSpec {
    fn from(filter: Option<Filter>) -> Self {
        filter.map_or(Self::None, Self::Expr)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_equality_encoding() {
        let filter = Filter::eq("_id", 1);
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!({"_id": 1}));
    }

    #[test]
    fn test_operator_encoding() {
        let filter = Filter::lt("number_of_pages", 300);
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"number_of_pages": {"$lt": 300}})
        );

        let filter = Filter::is_in("genres", ["Fantasy", "Romance"]);
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"genres": {"$in": ["Fantasy", "Romance"]}})
        );
    }

    #[test]
    fn test_nested_logical_encoding() {
        let filter = Filter::and([
            Filter::or([
                Filter::eq("is_checked_out", false),
                Filter::lt("number_of_pages", 300),
            ]),
            Filter::gte("publication_year", 2002),
        ]);

        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"$and": [
                {"$or": [
                    {"is_checked_out": false},
                    {"number_of_pages": {"$lt": 300}}
                ]},
                {"publication_year": {"$gte": 2002}}
            ]})
        );
    }

    #[test]
    fn test_not_encoding() {
        let filter = Filter::not(Filter::or([
            Filter::eq("genre", "horror"),
            Filter::exists("banned", true),
        ]));

        assert_eq!(filter.operator(), FilterOperator::Not);
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"$not": {"$or": [
                {"genre": "horror"},
                {"banned": {"$exists": true}}
            ]}})
        );
    }

    #[test]
    fn test_empty_logical_encodes_null() {
        let filter = Filter::and([]);
        assert_eq!(serde_json::to_value(&filter).unwrap(), Value::Null);
    }

    #[test]
    fn test_spec_validation() {
        assert!(FilterSpec::None.to_value().unwrap().is_none());
        assert!(FilterSpec::from(json!({"a": 1})).validate().is_ok());

        let error = FilterSpec::from(json!("title")).validate().unwrap_err();
        assert!(error.is_invalid_argument());
        assert_eq!(error.to_string(), "invalid filter type: string");
    }

    #[test]
    fn test_spec_map_passthrough() {
        let mut map = Map::new();
        map.insert("rating".into(), json!({"$gt": 4}));
        let value = FilterSpec::from(map).to_value().unwrap();
        assert_eq!(value, Some(json!({"rating": {"$gt": 4}})));
    }

    #[test]
    fn test_operator_strum() {
        assert_eq!(FilterOperator::NotIn.as_ref(), "$nin");
        assert_eq!("$exists".parse::<FilterOperator>().ok(), Some(FilterOperator::Exists));
    }
}
