//! The flat schema handed to the host

use crate::error::SchemaAmbiguityError;
use crate::location::ServiceLocation;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed enumeration of property types a host can store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// Short, token-like text
    String,
    /// Unbounded text
    Memo,
    Integer,
    /// Binary floating point
    Number,
    Decimal,
    Boolean,
    DateTime,
    Date,
    Time,
    Guid,
    Binary,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Memo => "memo",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Decimal => "decimal",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::DateTime => "datetime",
            PrimitiveKind::Date => "date",
            PrimitiveKind::Time => "time",
            PrimitiveKind::Guid => "guid",
            PrimitiveKind::Binary => "binary",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaProperty {
    pub name: String,
    pub kind: PrimitiveKind,
    pub display_name: String,
}

impl SchemaProperty {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodKind {
    /// Returns nothing
    Execute,
    /// Returns one value or one record
    Read,
    /// Returns a collection
    List,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMethod {
    pub name: String,
    pub kind: MethodKind,
    pub description: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl SchemaMethod {
    pub fn new(name: impl Into<String>, kind: MethodKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub display_name: String,
    pub description: String,
}

/// The compiled module a schema object was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSource {
    pub location: ServiceLocation,
    pub module_name: String,
    pub schema_hash: String,
}

/// Flattened representation of one remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaObject {
    pub name: String,
    pub metadata: ObjectMetadata,
    pub source: SchemaSource,
    properties: IndexMap<String, SchemaProperty>,
    methods: Vec<SchemaMethod>,
}

impl SchemaObject {
    pub fn new(name: impl Into<String>, metadata: ObjectMetadata, source: SchemaSource) -> Self {
        Self {
            name: name.into(),
            metadata,
            source,
            properties: IndexMap::new(),
            methods: Vec::new(),
        }
    }

    /// Add a property, merging it with an existing one of the same name and type
    pub fn add_property(&mut self, property: SchemaProperty) -> Result<(), SchemaAmbiguityError> {
        match self.properties.get(&property.name) {
            Some(existing) if existing.kind != property.kind => Err(SchemaAmbiguityError {
                property: property.name,
                existing: existing.kind,
                incoming: property.kind,
            }),
            Some(_) => Ok(()),
            None => {
                self.properties.insert(property.name.clone(), property);
                Ok(())
            }
        }
    }

    pub fn property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &SchemaProperty> {
        self.properties.values()
    }

    pub fn add_method(&mut self, method: SchemaMethod) {
        self.methods.push(method);
    }

    pub fn method(&self, name: &str) -> Option<&SchemaMethod> {
        self.methods.iter().find(|method| method.name == name)
    }

    pub fn methods(&self) -> &[SchemaMethod] {
        &self.methods
    }

    /// Method property references that do not name a property of this object
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        self.methods
            .iter()
            .flat_map(|method| {
                method
                    .inputs
                    .iter()
                    .chain(method.outputs.iter())
                    .filter(|name| !self.properties.contains_key(name.as_str()))
                    .map(|name| (method.name.clone(), name.clone()))
            })
            .collect()
    }
}

/// Input values keyed by property name
pub type PropertyValues = IndexMap<String, Value>;

/// One output record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow(IndexMap<String, Value>);

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for ResultRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
