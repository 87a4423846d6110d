use crate::config::{BrokerConfig, CONFIG_KEYS, ConfigKey};
use crate::error::BridgeResult;
use crate::invoke::InvocationEngine;
use crate::report::{MessageSink, Severity, describe_report, execute_report};
use crate::schema::{SchemaBuilder, SchemaOptions};
use dws_core::{Credential, PropertyValues, ResultRow, SchemaObject, ServiceLocation};
use dws_proxy::{CallContext, ProxyCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Entry point for a host: describes services and executes their methods
///
/// Every failure is reported to the message sink before it is returned.
pub struct ServiceBroker {
    cache: Arc<ProxyCache>,
    schemas: SchemaBuilder,
    engine: InvocationEngine,
    sink: Arc<dyn MessageSink>,
}

impl ServiceBroker {
    pub fn new(cache: Arc<ProxyCache>, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            schemas: SchemaBuilder::new(Arc::clone(&cache)),
            engine: InvocationEngine::new(Arc::clone(&cache)),
            cache,
            sink,
        }
    }

    /// Keys of the configuration section, with their defaults
    pub fn config_section() -> &'static [ConfigKey] {
        &CONFIG_KEYS
    }

    pub fn cache(&self) -> &Arc<ProxyCache> {
        &self.cache
    }

    pub async fn describe_schema(
        &self,
        location: &ServiceLocation,
        options: SchemaOptions,
    ) -> BridgeResult<SchemaObject> {
        self.schemas
            .build_schema(location, options)
            .await
            .inspect_err(|e| self.sink.report(Severity::Error, &describe_report(e)))
    }

    /// Describe the service a configuration section points at
    pub async fn describe_configured(&self, config: &BrokerConfig) -> BridgeResult<SchemaObject> {
        self.describe_schema(config.location(), config.schema_options())
            .await
    }

    /// Execute a method of a schema object
    ///
    /// The schema object must come from [`describe_schema`](Self::describe_schema) on this
    /// broker; a module evicted since then is not recompiled.
    pub async fn execute(
        &self,
        schema: &SchemaObject,
        method: &str,
        values: &PropertyValues,
        credential: Credential,
        timeout: Duration,
    ) -> BridgeResult<Vec<ResultRow>> {
        debug!(object = %schema.name, method, ?timeout, "Executing method");
        let context = CallContext::new(credential, timeout);
        self.engine
            .invoke(schema, method, values, context)
            .await
            .inspect_err(|e| self.sink.report(Severity::Error, &execute_report(e)))
    }
}
