use dws_core::{SchemaAmbiguityError, ValueConversionError};
use dws_proxy::{CallError, ProxyError};
use std::sync::Arc;
use thiserror::Error;

/// Member of the failure taxonomy an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DescriptionFetch,
    DescriptionUnsupported,
    Compilation,
    SchemaAmbiguity,
    UnsupportedOperationShape,
    ValueConversion,
    ProxyResolution,
    RemoteCallTimeout,
    RemoteFault,
    Transport,
    Protocol,
    ResultShape,
    InconsistentSchema,
    UnknownMethod,
    Config,
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Proxy(#[from] Arc<ProxyError>),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Ambiguity(#[from] SchemaAmbiguityError),

    #[error(transparent)]
    Conversion(#[from] ValueConversionError),

    #[error("Operation {operation} is not supported: {reason}")]
    UnsupportedOperationShape { operation: String, reason: String },

    #[error("Method {method} does not match its operation: {reason}")]
    InconsistentSchema { method: String, reason: String },

    #[error("Result of {method} does not match its output properties: {reason}")]
    ResultShape { method: String, reason: String },

    #[error("{object} has no method named {method}")]
    UnknownMethod { object: String, method: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ProxyError> for BridgeError {
    fn from(error: ProxyError) -> Self {
        BridgeError::Proxy(Arc::new(error))
    }
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Proxy(error) => match error.as_ref() {
                ProxyError::Fetch { .. } | ProxyError::Parse { .. } => ErrorKind::DescriptionFetch,
                ProxyError::Unsupported { .. } => ErrorKind::DescriptionUnsupported,
                ProxyError::Compilation { .. } => ErrorKind::Compilation,
                ProxyError::Resolution { .. } => ErrorKind::ProxyResolution,
            },
            BridgeError::Call(error) => match error {
                CallError::Timeout { .. } => ErrorKind::RemoteCallTimeout,
                CallError::Fault(_) => ErrorKind::RemoteFault,
                CallError::Transport(_) => ErrorKind::Transport,
                CallError::Conversion(_) => ErrorKind::ValueConversion,
                CallError::UnknownOperation(_) | CallError::Arity { .. } => {
                    ErrorKind::InconsistentSchema
                }
                CallError::Encode { .. } | CallError::Decode { .. } => ErrorKind::Protocol,
            },
            BridgeError::Ambiguity(_) => ErrorKind::SchemaAmbiguity,
            BridgeError::Conversion(_) => ErrorKind::ValueConversion,
            BridgeError::UnsupportedOperationShape { .. } => ErrorKind::UnsupportedOperationShape,
            BridgeError::InconsistentSchema { .. } => ErrorKind::InconsistentSchema,
            BridgeError::ResultShape { .. } => ErrorKind::ResultShape,
            BridgeError::UnknownMethod { .. } => ErrorKind::UnknownMethod,
            BridgeError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn unsupported(operation: &str, reason: impl Into<String>) -> Self {
        BridgeError::UnsupportedOperationShape {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
