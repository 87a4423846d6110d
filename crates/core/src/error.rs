//! Error types shared by every crate of the bridge

use crate::schema::PrimitiveKind;
use thiserror::Error;

/// A service location could not be parsed or normalized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Service location cannot be empty")]
    Empty,

    #[error("Invalid service location '{location}': {reason}")]
    Invalid { location: String, reason: String },

    #[error("Service location must use http or https: {0}")]
    UnsupportedScheme(String),
}

/// A native type has no representation in the flat schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Type {type_name} cannot be mapped to a schema property type")]
pub struct ClassificationError {
    pub type_name: String,
}

/// Two properties share a name but not a type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Property '{property}' is declared as {existing} and as {incoming}; a flat schema cannot hold both"
)]
pub struct SchemaAmbiguityError {
    pub property: String,
    pub existing: PrimitiveKind,
    pub incoming: PrimitiveKind,
}

/// A value could not be converted to the type it is bound to
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot convert value of property '{property}' to {target}: {reason}")]
pub struct ValueConversionError {
    pub property: String,
    pub target: String,
    pub reason: String,
}

impl ValueConversionError {
    pub fn new(
        property: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Attach the property name once it is known further up the call
    pub fn for_property(mut self, property: &str) -> Self {
        self.property = property.to_string();
        self
    }
}
