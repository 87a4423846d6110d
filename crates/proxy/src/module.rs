//! Compiled client modules

use crate::envelope::{decode_response, encode_request};
use crate::error::{CallError, CallResult};
use crate::generate::OperationStub;
use crate::transport::{SoapRequest, SoapTransport};
use dws_core::{Credential, NativeValue, OperationDescriptor, ServiceLocation};
use dws_wsdl::SoapVersion;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Per-call settings
#[derive(Debug, Clone)]
pub struct CallContext {
    pub credential: Credential,
    pub timeout: Duration,
    /// Replaces the endpoint of the description
    pub endpoint: Option<Url>,
}

impl CallContext {
    pub fn new(credential: Credential, timeout: Duration) -> Self {
        Self {
            credential,
            timeout,
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

/// A client for one service, ready to be invoked
///
/// Modules are immutable once built and are shared as `Arc<CompiledModule>` between
/// every caller of the same location.
pub struct CompiledModule {
    pub(crate) name: String,
    pub(crate) location: ServiceLocation,
    pub(crate) service_name: String,
    pub(crate) documentation: Option<String>,
    pub(crate) version: SoapVersion,
    pub(crate) endpoint: Url,
    pub(crate) operations: Vec<OperationStub>,
    pub(crate) schema_hash: String,
    pub(crate) transport: Arc<dyn SoapTransport>,
}

impl fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledModule")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("service_name", &self.service_name)
            .field("version", &self.version)
            .field("endpoint", &self.endpoint.as_str())
            .field("operations", &self.operations.len())
            .field("schema_hash", &self.schema_hash)
            .finish()
    }
}

/// Hash of the operation signatures a module exposes
pub fn schema_hash<'a>(operations: impl IntoIterator<Item = &'a OperationDescriptor>) -> String {
    let signatures: Vec<String> = operations
        .into_iter()
        .map(OperationDescriptor::signature)
        .collect();
    blake3::hash(signatures.join("\n").as_bytes())
        .to_hex()
        .to_string()
}

impl CompiledModule {
    /// Unique module name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &ServiceLocation {
        &self.location
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    /// Endpoint calls go to unless the call context overrides it
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Identifies the callable surface; equal hashes mean equal signatures
    pub fn schema_hash(&self) -> &str {
        &self.schema_hash
    }

    pub fn operations(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter().map(|stub| &stub.descriptor)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.stub(name).map(|stub| &stub.descriptor)
    }

    pub(crate) fn stub(&self, name: &str) -> Option<&OperationStub> {
        self.operations
            .iter()
            .find(|stub| stub.descriptor.name == name)
    }

    /// Call a remote operation with arguments in declaration order
    pub async fn invoke(
        &self,
        operation: &str,
        arguments: Vec<NativeValue>,
        context: &CallContext,
    ) -> CallResult<NativeValue> {
        let stub = self
            .stub(operation)
            .ok_or_else(|| CallError::UnknownOperation(operation.to_string()))?;
        let expected = stub.descriptor.parameters.len();
        if arguments.len() != expected {
            return Err(CallError::Arity {
                operation: operation.to_string(),
                expected,
                actual: arguments.len(),
            });
        }

        let body = encode_request(operation, self.version, &stub.request, &arguments)?;
        let endpoint = context
            .endpoint
            .clone()
            .unwrap_or_else(|| self.endpoint.clone());
        let request = SoapRequest {
            endpoint: endpoint.clone(),
            version: self.version,
            action: stub.soap_action.clone(),
            body,
            credential: context.credential.clone(),
        };

        info!(module = %self.name, operation, %endpoint, "Invoking remote operation");
        let response = tokio::time::timeout(context.timeout, self.transport.send(request))
            .await
            .map_err(|_| CallError::Timeout {
                operation: operation.to_string(),
                timeout: context.timeout,
            })??;
        debug!(operation, status = response.status, bytes = response.body.len(), "Response received");

        decode_response(
            operation,
            &endpoint,
            &stub.response,
            stub.descriptor.returns.as_ref(),
            &response,
        )
    }
}
