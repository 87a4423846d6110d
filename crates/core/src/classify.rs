//! Type classifier
//!
//! Decides which native types can surface as flat schema properties and which
//! [`PrimitiveKind`] they surface as. Both functions are pure.

use crate::error::ClassificationError;
use crate::schema::PrimitiveKind;
use crate::types::{NativeType, ScalarType};

impl ScalarType {
    /// The schema primitive a scalar surfaces as
    pub fn primitive(&self) -> PrimitiveKind {
        match self {
            ScalarType::String => PrimitiveKind::Memo,
            ScalarType::NormalizedString
            | ScalarType::Token
            | ScalarType::AnyUri
            | ScalarType::QName
            | ScalarType::Duration => PrimitiveKind::String,
            ScalarType::Boolean => PrimitiveKind::Boolean,
            ScalarType::Byte
            | ScalarType::UnsignedByte
            | ScalarType::Short
            | ScalarType::UnsignedShort
            | ScalarType::Int
            | ScalarType::UnsignedInt
            | ScalarType::Long => PrimitiveKind::Integer,
            ScalarType::UnsignedLong | ScalarType::Integer | ScalarType::Decimal => {
                PrimitiveKind::Decimal
            }
            ScalarType::Float | ScalarType::Double => PrimitiveKind::Number,
            ScalarType::DateTime => PrimitiveKind::DateTime,
            ScalarType::Date => PrimitiveKind::Date,
            ScalarType::Time => PrimitiveKind::Time,
            ScalarType::Base64Binary | ScalarType::HexBinary => PrimitiveKind::Binary,
            ScalarType::Guid => PrimitiveKind::Guid,
        }
    }
}

/// Whether a native type can be a single schema property
///
/// Scalars and their nullable form are simple; `guid` and the date/time types are scalars
/// already. Records, arrays and opaque types never are, whichever namespace they come from.
pub fn is_simple_mappable(ty: &NativeType) -> bool {
    ty.scalar().is_some()
}

/// Map a simple-mappable native type to its schema primitive
pub fn to_schema_primitive(ty: &NativeType) -> Result<PrimitiveKind, ClassificationError> {
    ty.scalar()
        .map(|scalar| scalar.primitive())
        .ok_or_else(|| ClassificationError {
            type_name: ty.type_name(),
        })
}
