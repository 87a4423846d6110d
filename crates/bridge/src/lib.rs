//! Dynamic web service bridge
//!
//! Exposes a SOAP service to a host as one flat [`SchemaObject`](dws_core::SchemaObject):
//! [`SchemaBuilder`] flattens the operations of a compiled client module into scalar
//! properties and methods, and [`InvocationEngine`] runs those methods and returns rows.
//! [`ServiceBroker`] ties both to a shared [`ProxyCache`](dws_proxy::ProxyCache) and
//! reports failures to the host.

pub mod broker;
pub mod config;
pub mod error;
pub mod invoke;
pub mod report;
pub mod schema;

pub use broker::ServiceBroker;
pub use config::{BrokerConfig, CONFIG_KEYS, ConfigKey};
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use invoke::InvocationEngine;
pub use report::{MessageSink, Severity, TracingSink, describe_report, execute_report};
pub use schema::{DYNAMIC_URL_PROPERTY, SchemaBuilder, SchemaOptions, build_from_module, method_kind};
