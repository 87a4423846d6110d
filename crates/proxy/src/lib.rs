//! Client modules for SOAP services
//!
//! A [`ProxyCompiler`] turns a [`ServiceLocation`](dws_core::ServiceLocation) into a
//! [`CompiledModule`]: the description is loaded, lowered into operation stubs and built
//! into a module bound to a SOAP transport. [`ProxyCache`] keeps one module per location
//! and makes sure concurrent requests share a single compilation.

pub mod builder;
pub mod cache;
pub mod compiler;
pub mod envelope;
pub mod error;
pub mod generate;
pub mod module;
pub mod transport;

pub use builder::{DEFAULT_REFERENCES, Diagnostic, Library, LinkingBuilder, ModuleBuilder};
pub use cache::{ProxyCache, SharedResult};
pub use compiler::{ProxyCompiler, WsdlCompiler};
pub use envelope::SoapFault;
pub use error::{CallError, CallResult, ProxyError, ProxyResult};
pub use generate::{BodyLayout, ClientSource, ImportWarning, OperationStub, PartLayout, generate};
pub use module::{CallContext, CompiledModule, schema_hash};
pub use transport::{HttpTransport, SoapRequest, SoapResponse, SoapTransport, TransportError};
