//! Values in the native call shape

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Argument or result of a remote operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativeValue {
    Null,
    Scalar { value: Value },
    Record(RecordValue),
    List { items: Vec<NativeValue> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordValue {
    pub type_name: String,
    pub fields: IndexMap<String, NativeValue>,
}

impl RecordValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: NativeValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// A field, treating an absent field as null
    pub fn field(&self, name: &str) -> &NativeValue {
        self.fields.get(name).unwrap_or(&NativeValue::Null)
    }
}

impl NativeValue {
    pub fn scalar(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => NativeValue::Null,
            value => NativeValue::Scalar { value },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            NativeValue::Scalar { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            NativeValue::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NativeValue]> {
        match self {
            NativeValue::List { items } => Some(items),
            _ => None,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Scalar { .. } => "scalar",
            NativeValue::Record(_) => "record",
            NativeValue::List { .. } => "list",
        }
    }
}

impl From<RecordValue> for NativeValue {
    fn from(record: RecordValue) -> Self {
        NativeValue::Record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_scalar_collapses() {
        assert!(NativeValue::scalar(Value::Null).is_null());
        assert!(NativeValue::scalar(Option::<i64>::None).is_null());
        assert_eq!(
            NativeValue::scalar(7i64).as_scalar(),
            Some(&Value::Integer(7))
        );
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let user = RecordValue::new("User").with_field("name", NativeValue::scalar("Ana"));
        assert_eq!(user.field("name").as_scalar(), Some(&Value::from("Ana")));
        assert!(user.field("age").is_null());
    }
}
