//! Service description collaborator
//!
//! Fetches WSDL 1.1 documents over HTTP, reads them into a namespace-aware element tree
//! and lowers their XML Schema types into the native type model of `dws-core`.

pub mod description;
pub mod error;
pub mod fetch;
pub mod wsdl;
pub mod xml;
pub mod xsd;

pub use description::{ServiceDescription, load_description};
pub use error::{DescriptionError, FetchError, ParseError, ParseResult, UnresolvedReference};
pub use fetch::{DescriptionFetcher, HttpFetcher};
pub use wsdl::{
    Binding, BindingOperation, BindingStyle, BodyBinding, BodyUse, Definitions, Message, Part,
    Port, PortOperation, PortType, Service, SoapBinding, SoapVersion,
};
pub use xml::{XmlElement, XmlName, parse_document};
pub use xsd::{ElementDecl, ExternalSchema, Schema, SchemaSet, TypeResolver, WrapperContent};
