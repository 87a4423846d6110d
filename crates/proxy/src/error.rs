//! Error types for compiling and calling client modules

use crate::builder::Diagnostic;
use crate::envelope::SoapFault;
use crate::generate::ImportWarning;
use crate::transport::TransportError;
use dws_core::{ServiceLocation, ValueConversionError};
use dws_wsdl::{DescriptionError, FetchError, ParseError};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A client module could not be produced or found
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Cannot fetch the description of {location}: {source}")]
    Fetch {
        location: ServiceLocation,
        #[source]
        source: FetchError,
    },

    #[error("Cannot parse the description of {location} ({url}): {source}")]
    Parse {
        location: ServiceLocation,
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("The description of {location} imports with warnings: {}", join(.warnings))]
    Unsupported {
        location: ServiceLocation,
        warnings: Vec<ImportWarning>,
    },

    #[error("Module {module} failed to build: {}", join(.diagnostics))]
    Compilation {
        module: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("No client module can be resolved for {location}: {reason}")]
    Resolution {
        location: ServiceLocation,
        reason: String,
    },
}

impl ProxyError {
    pub(crate) fn from_description(location: &ServiceLocation, error: DescriptionError) -> Self {
        match error {
            DescriptionError::Fetch(source) => ProxyError::Fetch {
                location: location.clone(),
                source,
            },
            DescriptionError::Parse { url, source } => ProxyError::Parse {
                location: location.clone(),
                url,
                source,
            },
        }
    }
}

/// A remote call failed
#[derive(Error, Debug)]
pub enum CallError {
    #[error("Call to {operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote fault: {0}")]
    Fault(#[from] SoapFault),

    #[error("Cannot encode the request of {operation}: {reason}")]
    Encode { operation: String, reason: String },

    #[error("Cannot decode the response of {operation}: {reason}")]
    Decode { operation: String, reason: String },

    #[error("Module has no operation named {0}")]
    UnknownOperation(String),

    #[error("{operation} takes {expected} argument(s) but {actual} were supplied")]
    Arity {
        operation: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Conversion(#[from] ValueConversionError),
}

pub type ProxyResult<T> = Result<T, ProxyError>;
pub type CallResult<T> = Result<T, CallError>;
