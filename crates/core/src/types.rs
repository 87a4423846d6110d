//! Native type model of a compiled service module
//!
//! These types describe operations the way the interface description declares them,
//! before any flattening. Every record and opaque type carries a [`TypeOrigin`] computed
//! once when the description is parsed, so later stages never have to guess whether a
//! type belongs to the remote module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// XML Schema built-in scalars understood by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarType {
    String,
    NormalizedString,
    Token,
    AnyUri,
    QName,
    Duration,
    Boolean,
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Integer,
    Decimal,
    Float,
    Double,
    DateTime,
    Date,
    Time,
    Base64Binary,
    HexBinary,
    Guid,
}

impl ScalarType {
    pub const XSD_NAMESPACE: &'static str = "http://www.w3.org/2001/XMLSchema";
    /// Namespace of the serialization helper types emitted by .NET services (`guid`, `char`)
    pub const MS_TYPES_NAMESPACE: &'static str = "http://microsoft.com/wsdl/types/";

    /// Look up a built-in scalar by its qualified XML name
    pub fn from_qualified(namespace: &str, local: &str) -> Option<Self> {
        if namespace == Self::MS_TYPES_NAMESPACE {
            return match local {
                "guid" => Some(ScalarType::Guid),
                _ => None,
            };
        }
        if namespace != Self::XSD_NAMESPACE {
            return None;
        }

        let scalar = match local {
            "string" | "anySimpleType" => ScalarType::String,
            "normalizedString" => ScalarType::NormalizedString,
            "token" | "language" | "Name" | "NCName" | "NMTOKEN" | "NMTOKENS" | "ID"
            | "IDREF" | "IDREFS" | "ENTITY" | "ENTITIES" | "NOTATION" | "gYear"
            | "gYearMonth" | "gMonth" | "gMonthDay" | "gDay" => ScalarType::Token,
            "anyURI" => ScalarType::AnyUri,
            "QName" => ScalarType::QName,
            "duration" => ScalarType::Duration,
            "boolean" => ScalarType::Boolean,
            "byte" => ScalarType::Byte,
            "unsignedByte" => ScalarType::UnsignedByte,
            "short" => ScalarType::Short,
            "unsignedShort" => ScalarType::UnsignedShort,
            "int" => ScalarType::Int,
            "unsignedInt" => ScalarType::UnsignedInt,
            "long" => ScalarType::Long,
            "unsignedLong" => ScalarType::UnsignedLong,
            "integer" | "nonNegativeInteger" | "nonPositiveInteger" | "positiveInteger"
            | "negativeInteger" => ScalarType::Integer,
            "decimal" => ScalarType::Decimal,
            "float" => ScalarType::Float,
            "double" => ScalarType::Double,
            "dateTime" => ScalarType::DateTime,
            "date" => ScalarType::Date,
            "time" => ScalarType::Time,
            "base64Binary" => ScalarType::Base64Binary,
            "hexBinary" => ScalarType::HexBinary,
            _ => return None,
        };
        Some(scalar)
    }

    /// Local XML name of the type, also used to name scalar output properties
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::NormalizedString => "normalizedString",
            ScalarType::Token => "token",
            ScalarType::AnyUri => "anyURI",
            ScalarType::QName => "QName",
            ScalarType::Duration => "duration",
            ScalarType::Boolean => "boolean",
            ScalarType::Byte => "byte",
            ScalarType::UnsignedByte => "unsignedByte",
            ScalarType::Short => "short",
            ScalarType::UnsignedShort => "unsignedShort",
            ScalarType::Int => "int",
            ScalarType::UnsignedInt => "unsignedInt",
            ScalarType::Long => "long",
            ScalarType::UnsignedLong => "unsignedLong",
            ScalarType::Integer => "integer",
            ScalarType::Decimal => "decimal",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::DateTime => "dateTime",
            ScalarType::Date => "date",
            ScalarType::Time => "time",
            ScalarType::Base64Binary => "base64Binary",
            ScalarType::HexBinary => "hexBinary",
            ScalarType::Guid => "guid",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            ScalarType::Guid => Self::MS_TYPES_NAMESPACE,
            _ => Self::XSD_NAMESPACE,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a type was defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOrigin {
    /// Defined by XML Schema or the SOAP runtime
    Builtin,
    /// Defined by the remote module's own description
    Module,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NativeType {
    Scalar(ScalarType),
    Nullable(ScalarType),
    Array(ArrayType),
    Record(Arc<RecordType>),
    Opaque(OpaqueType),
}

/// Repeated values
///
/// `item_name` is `None` when the values repeat in place (`maxOccurs > 1` on the element
/// itself) and names the item element when they are wrapped in a container element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub element: Box<NativeType>,
    pub item_name: Option<String>,
}

/// A structured type with named fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub namespace: String,
    pub origin: TypeOrigin,
    /// Child elements are namespace-qualified (`elementFormDefault="qualified"`)
    pub qualified: bool,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: NativeType,
    /// Carried as an XML attribute rather than a child element
    #[serde(default)]
    pub attribute: bool,
}

/// A type the bridge can name but not represent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueType {
    pub name: String,
    pub origin: TypeOrigin,
}

impl NativeType {
    pub fn array(element: NativeType, item_name: Option<String>) -> Self {
        NativeType::Array(ArrayType {
            element: Box::new(element),
            item_name,
        })
    }

    pub fn record(record: RecordType) -> Self {
        NativeType::Record(Arc::new(record))
    }

    pub fn opaque(name: impl Into<String>, origin: TypeOrigin) -> Self {
        NativeType::Opaque(OpaqueType {
            name: name.into(),
            origin,
        })
    }

    pub fn origin(&self) -> TypeOrigin {
        match self {
            NativeType::Scalar(_) | NativeType::Nullable(_) => TypeOrigin::Builtin,
            NativeType::Array(array) => array.element.origin(),
            NativeType::Record(record) => record.origin,
            NativeType::Opaque(opaque) => opaque.origin,
        }
    }

    /// A non-array type declared by the remote module itself
    pub fn is_module_type(&self) -> bool {
        !self.is_array() && self.origin() == TypeOrigin::Module
    }

    pub fn is_array(&self) -> bool {
        matches!(self, NativeType::Array(_))
    }

    /// The scalar behind a plain or nullable scalar
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            NativeType::Scalar(scalar) | NativeType::Nullable(scalar) => Some(*scalar),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            NativeType::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            NativeType::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Short human readable name
    pub fn type_name(&self) -> String {
        match self {
            NativeType::Scalar(scalar) => scalar.name().to_string(),
            NativeType::Nullable(scalar) => format!("{}?", scalar.name()),
            NativeType::Array(array) => format!("{}[]", array.element.type_name()),
            NativeType::Record(record) => record.name.clone(),
            NativeType::Opaque(opaque) => opaque.name.clone(),
        }
    }

    /// Structural signature, records expanded field by field
    pub fn canonical(&self) -> String {
        match self {
            NativeType::Record(record) => {
                let fields: Vec<String> = record
                    .fields
                    .iter()
                    .map(|field| format!("{}:{}", field.name, field.ty.canonical()))
                    .collect();
                format!("{}{{{}}}", record.name, fields.join(","))
            }
            NativeType::Array(array) => format!("{}[]", array.element.canonical()),
            other => other.type_name(),
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: NativeType,
}

/// What an operation gives back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Void,
    Scalar,
    Record,
    ScalarCollection,
    RecordCollection,
    Other,
}

/// One remote operation as declared by the compiled module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub name: String,
    pub documentation: Option<String>,
    pub parameters: Vec<Parameter>,
    /// `None` for operations that return nothing
    pub returns: Option<NativeType>,
}

impl OperationDescriptor {
    pub fn return_shape(&self) -> ReturnShape {
        match &self.returns {
            None => ReturnShape::Void,
            Some(NativeType::Scalar(_) | NativeType::Nullable(_)) => ReturnShape::Scalar,
            Some(NativeType::Record(_)) => ReturnShape::Record,
            Some(NativeType::Array(array)) => match array.element.as_ref() {
                NativeType::Scalar(_) | NativeType::Nullable(_) => ReturnShape::ScalarCollection,
                NativeType::Record(_) => ReturnShape::RecordCollection,
                _ => ReturnShape::Other,
            },
            Some(NativeType::Opaque(_)) => ReturnShape::Other,
        }
    }

    /// Canonical signature, stable across compilations of the same description
    pub fn signature(&self) -> String {
        let parameters: Vec<String> = self
            .parameters
            .iter()
            .map(|parameter| format!("{}:{}", parameter.name, parameter.ty.canonical()))
            .collect();
        let returns = self
            .returns
            .as_ref()
            .map(NativeType::canonical)
            .unwrap_or_else(|| "void".to_string());
        format!("{}({})->{}", self.name, parameters.join(","), returns)
    }
}
