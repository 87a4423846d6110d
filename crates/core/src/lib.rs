//! Core model of the dynamic web service bridge.
//!
//! Everything here is pure data and pure rules: the native type model that a parsed
//! interface description produces, the classifier that decides which native types can
//! surface as flat schema properties, the lossless [`Value`] representation used at call
//! time, and the flat [`SchemaObject`] handed to the host.

pub mod auth;
pub mod classify;
pub mod error;
pub mod location;
pub mod native;
pub mod schema;
pub mod types;
pub mod value;

pub use auth::{Credential, CredentialSource};
pub use classify::{is_simple_mappable, to_schema_primitive};
pub use error::{ClassificationError, LocationError, SchemaAmbiguityError, ValueConversionError};
pub use location::ServiceLocation;
pub use native::{NativeValue, RecordValue};
pub use schema::{
    MethodKind, ObjectMetadata, PrimitiveKind, PropertyValues, ResultRow, SchemaMethod,
    SchemaObject, SchemaProperty, SchemaSource,
};
pub use types::{
    ArrayType, Field, NativeType, OpaqueType, OperationDescriptor, Parameter, RecordType,
    ReturnShape, ScalarType, TypeOrigin,
};
pub use value::{Decimal, Value};
