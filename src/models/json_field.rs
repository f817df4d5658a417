//! Three-state JSON column value
//!
//! Nullable JSON columns distinguish between SQL NULL (field absent) and a
//! stored JSON `null` literal. `JsonField` keeps both states representable
//! so values round-trip through the database without collapsing into one.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Value of a nullable JSON column.
///
/// The column stores serialized JSON text. Three states are possible:
/// - `DbNull`: the column is SQL NULL
/// - `JsonNull`: the column holds the literal JSON `null`
/// - `Value`: the column holds any other JSON document
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonField {
    /// SQL NULL
    #[default]
    DbNull,
    /// Literal JSON `null`
    JsonNull,
    /// Any other JSON value
    Value(serde_json::Value),
}

impl JsonField {
    /// Build from the raw TEXT column value read from the database
    pub fn from_db(raw: Option<String>) -> anyhow::Result<Self> {
        match raw {
            None => Ok(JsonField::DbNull),
            Some(text) => {
                let value: serde_json::Value = serde_json::from_str(&text)?;
                if value.is_null() {
                    Ok(JsonField::JsonNull)
                } else {
                    Ok(JsonField::Value(value))
                }
            }
        }
    }

    /// Serialize to the raw TEXT column value written to the database
    pub fn to_db(&self) -> Option<String> {
        match self {
            JsonField::DbNull => None,
            JsonField::JsonNull => Some("null".to_string()),
            JsonField::Value(v) => Some(v.to_string()),
        }
    }

    /// True for either null state
    pub fn is_null(&self) -> bool {
        matches!(self, JsonField::DbNull | JsonField::JsonNull)
    }

    /// Get the inner value if present
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            JsonField::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for JsonField {
    fn from(value: serde_json::Value) -> Self {
        if value.is_null() {
            JsonField::JsonNull
        } else {
            JsonField::Value(value)
        }
    }
}

// API representation: both null states render as JSON null; an incoming
// JSON null means JsonNull. DbNull is only expressible by omitting the
// field entirely on writes.
impl Serialize for JsonField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            JsonField::DbNull | JsonField::JsonNull => serializer.serialize_none(),
            JsonField::Value(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for JsonField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(JsonField::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_db_null_column() {
        let field = JsonField::from_db(None).unwrap();
        assert_eq!(field, JsonField::DbNull);
    }

    #[test]
    fn test_from_db_json_null() {
        let field = JsonField::from_db(Some("null".to_string())).unwrap();
        assert_eq!(field, JsonField::JsonNull);
    }

    #[test]
    fn test_from_db_json_value() {
        let field = JsonField::from_db(Some(r#"{"codes":["DE"]}"#.to_string())).unwrap();
        assert_eq!(field, JsonField::Value(json!({"codes": ["DE"]})));
    }

    #[test]
    fn test_from_db_invalid_json_is_error() {
        let result = JsonField::from_db(Some("{not json".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_to_db_roundtrip_all_states() {
        for field in [
            JsonField::DbNull,
            JsonField::JsonNull,
            JsonField::Value(json!({"a": [1, 2, 3], "b": "x"})),
        ] {
            let raw = field.to_db();
            let back = JsonField::from_db(raw).unwrap();
            assert_eq!(field, back);
        }
    }

    #[test]
    fn test_db_representation() {
        assert_eq!(JsonField::DbNull.to_db(), None);
        assert_eq!(JsonField::JsonNull.to_db(), Some("null".to_string()));
        assert_eq!(
            JsonField::Value(json!(42)).to_db(),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_serialize_both_nulls_as_json_null() {
        assert_eq!(serde_json::to_string(&JsonField::DbNull).unwrap(), "null");
        assert_eq!(serde_json::to_string(&JsonField::JsonNull).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&JsonField::Value(json!([1]))).unwrap(),
            "[1]"
        );
    }

    #[test]
    fn test_deserialize_json_null_as_json_null() {
        let field: JsonField = serde_json::from_str("null").unwrap();
        assert_eq!(field, JsonField::JsonNull);

        let field: JsonField = serde_json::from_str(r#"{"k":1}"#).unwrap();
        assert_eq!(field, JsonField::Value(json!({"k": 1})));
    }

    #[test]
    fn test_is_null() {
        assert!(JsonField::DbNull.is_null());
        assert!(JsonField::JsonNull.is_null());
        assert!(!JsonField::Value(json!(false)).is_null());
    }
}
