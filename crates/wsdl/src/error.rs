//! Error types for fetching and parsing service descriptions

use crate::xml::XmlName;
use std::time::Duration;
use thiserror::Error;

/// The description or one of its schemas could not be retrieved
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Invalid document location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },
}

/// A retrieved document is not a usable XML, WSDL or XML Schema document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Document has no root element")]
    Empty,

    #[error("Undeclared namespace prefix '{0}'")]
    UnboundPrefix(String),

    #[error("Expected a {expected} document but the root element is {found}")]
    UnexpectedRoot { expected: String, found: String },

    #[error("Element {element} is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },
}

/// Failure while loading a description together with its external schemas
#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("Cannot parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },
}

/// A qualified name used by the description is not declared anywhere
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unresolved {kind} reference {name}")]
pub struct UnresolvedReference {
    pub kind: &'static str,
    pub name: XmlName,
}

pub type ParseResult<T> = Result<T, ParseError>;
