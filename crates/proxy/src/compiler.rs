use crate::builder::{DEFAULT_REFERENCES, Library, LinkingBuilder, ModuleBuilder};
use crate::error::{ProxyError, ProxyResult};
use crate::generate::generate;
use crate::module::CompiledModule;
use crate::transport::{HttpTransport, SoapTransport};
use async_trait::async_trait;
use dws_core::{CredentialSource, ServiceLocation};
use dws_wsdl::{DescriptionFetcher, HttpFetcher, load_description};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Produces a client module for a location
#[async_trait]
pub trait ProxyCompiler: Send + Sync {
    async fn compile(&self, location: &ServiceLocation) -> ProxyResult<CompiledModule>;
}

/// Fetches the description, generates the client and builds it
pub struct WsdlCompiler {
    fetcher: Arc<dyn DescriptionFetcher>,
    builder: Arc<dyn ModuleBuilder>,
    credentials: Arc<dyn CredentialSource>,
    references: Vec<Library>,
}

impl WsdlCompiler {
    pub fn new(
        fetcher: Arc<dyn DescriptionFetcher>,
        builder: Arc<dyn ModuleBuilder>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            fetcher,
            builder,
            credentials,
            references: DEFAULT_REFERENCES.to_vec(),
        }
    }

    /// Compiler talking HTTP for both the description and the calls
    pub fn http(fetch_timeout: Duration, credentials: Arc<dyn CredentialSource>) -> Self {
        let transport: Arc<dyn SoapTransport> = Arc::new(HttpTransport::new());
        Self::new(
            Arc::new(HttpFetcher::new(fetch_timeout)),
            Arc::new(LinkingBuilder::new(transport)),
            credentials,
        )
    }

    pub fn with_references(mut self, references: Vec<Library>) -> Self {
        self.references = references;
        self
    }
}

#[async_trait]
impl ProxyCompiler for WsdlCompiler {
    async fn compile(&self, location: &ServiceLocation) -> ProxyResult<CompiledModule> {
        let credential = self.credentials.credential_for(location);
        let description = load_description(self.fetcher.as_ref(), location, &credential)
            .await
            .map_err(|e| ProxyError::from_description(location, e))?;

        let source = generate(&description, location).map_err(|warnings| {
            for warning in &warnings {
                warn!(%location, %warning, "Description imported with warning");
            }
            ProxyError::Unsupported {
                location: location.clone(),
                warnings,
            }
        })?;

        let module_name = source.module_name.clone();
        info!(%location, module = %module_name, operations = source.operations.len(), "Building client module");
        let module = self
            .builder
            .build(source, &self.references)
            .map_err(|diagnostics| ProxyError::Compilation {
                module: module_name,
                diagnostics,
            })?;

        info!(%location, module = %module.name(), "Client module built");
        Ok(module)
    }
}
