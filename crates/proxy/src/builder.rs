//! Building client modules from generated source

use crate::generate::ClientSource;
use crate::module::{CompiledModule, schema_hash};
use crate::transport::SoapTransport;
use dws_wsdl::SoapVersion;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Runtime libraries a module can be linked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Library {
    Soap11,
    Soap12,
    XmlSchema,
}

impl Library {
    pub fn for_version(version: SoapVersion) -> Self {
        match version {
            SoapVersion::Soap11 => Library::Soap11,
            SoapVersion::Soap12 => Library::Soap12,
        }
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Library::Soap11 => f.write_str("soap-1.1"),
            Library::Soap12 => f.write_str("soap-1.2"),
            Library::XmlSchema => f.write_str("xml-schema"),
        }
    }
}

/// Libraries every module is built with
pub const DEFAULT_REFERENCES: &[Library] = &[Library::Soap11, Library::Soap12, Library::XmlSchema];

/// One problem found while building a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Turns generated source into a callable module
///
/// Every problem is reported, not just the first.
pub trait ModuleBuilder: Send + Sync {
    fn build(
        &self,
        source: ClientSource,
        references: &[Library],
    ) -> Result<CompiledModule, Vec<Diagnostic>>;
}

/// Checks the generated source and binds it to a transport
pub struct LinkingBuilder {
    transport: Arc<dyn SoapTransport>,
}

impl LinkingBuilder {
    pub fn new(transport: Arc<dyn SoapTransport>) -> Self {
        Self { transport }
    }
}

impl ModuleBuilder for LinkingBuilder {
    fn build(
        &self,
        source: ClientSource,
        references: &[Library],
    ) -> Result<CompiledModule, Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();

        let required = Library::for_version(source.version);
        if !references.contains(&required) {
            diagnostics.push(Diagnostic::new(
                "E0001",
                format!("{} requires the {} library", source.version, required),
            ));
        }

        let mut seen = HashSet::new();
        for operation in &source.operations {
            let name = operation.descriptor.name.as_str();
            if name.is_empty() {
                diagnostics.push(Diagnostic::new("E0002", "an operation has no name"));
            } else if !seen.insert(name) {
                diagnostics.push(Diagnostic::new(
                    "E0003",
                    format!("operation {} is defined more than once", name),
                ));
            }

            let mut parameters = HashSet::new();
            for parameter in &operation.descriptor.parameters {
                if !parameters.insert(parameter.name.as_str()) {
                    diagnostics.push(Diagnostic::new(
                        "E0004",
                        format!("{} has two parameters named {}", name, parameter.name),
                    ));
                }
            }
        }

        let endpoint = match source.endpoint.as_deref() {
            None => {
                diagnostics.push(Diagnostic::new("E0005", "the service has no endpoint address"));
                None
            }
            Some(address) => match Url::parse(address) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
                Ok(url) => {
                    diagnostics.push(Diagnostic::new(
                        "E0006",
                        format!("endpoint scheme '{}' is not supported", url.scheme()),
                    ));
                    None
                }
                Err(e) => {
                    diagnostics.push(Diagnostic::new(
                        "E0006",
                        format!("endpoint '{}' is not an absolute URL: {}", address, e),
                    ));
                    None
                }
            },
        };

        match endpoint {
            Some(endpoint) if diagnostics.is_empty() => {
                let schema_hash = schema_hash(source.operations.iter().map(|stub| &stub.descriptor));
                Ok(CompiledModule {
                    name: source.module_name,
                    location: source.location,
                    service_name: source.service_name,
                    documentation: source.documentation,
                    version: source.version,
                    endpoint,
                    operations: source.operations,
                    schema_hash,
                    transport: self.transport.clone(),
                })
            }
            _ => Err(diagnostics),
        }
    }
}
