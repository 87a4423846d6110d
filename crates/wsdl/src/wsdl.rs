//! WSDL 1.1 document model
//!
//! [`Definitions::parse`] reads the parts of a description the bridge acts on: messages,
//! port types, SOAP 1.1 and 1.2 bindings, services and the inline schemas. Everything is
//! kept as declared; deciding what is supported happens during generation.

use crate::error::{ParseError, ParseResult};
use crate::xml::{XmlElement, XmlName};

pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";
pub const SOAP11_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const SOAP12_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// SOAP protocol version of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    pub fn from_binding_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            SOAP11_BINDING_NAMESPACE => Some(SoapVersion::Soap11),
            SOAP12_BINDING_NAMESPACE => Some(SoapVersion::Soap12),
            _ => None,
        }
    }

    pub fn binding_namespace(&self) -> &'static str {
        match self {
            SoapVersion::Soap11 => SOAP11_BINDING_NAMESPACE,
            SoapVersion::Soap12 => SOAP12_BINDING_NAMESPACE,
        }
    }

    /// Namespace of the envelope on the wire
    pub fn envelope_namespace(&self) -> &'static str {
        match self {
            SoapVersion::Soap11 => "http://schemas.xmlsoap.org/soap/envelope/",
            SoapVersion::Soap12 => "http://www.w3.org/2003/05/soap-envelope",
        }
    }
}

impl std::fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoapVersion::Soap11 => f.write_str("SOAP 1.1"),
            SoapVersion::Soap12 => f.write_str("SOAP 1.2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStyle {
    Document,
    Rpc,
}

impl BindingStyle {
    fn parse(value: Option<&str>) -> Option<Self> {
        match value {
            Some("rpc") => Some(BindingStyle::Rpc),
            Some("document") => Some(BindingStyle::Document),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyUse {
    Literal,
    Encoded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub element: Option<XmlName>,
    pub type_name: Option<XmlName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: XmlName,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortOperation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: Option<XmlName>,
    pub output: Option<XmlName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortType {
    pub name: XmlName,
    pub operations: Vec<PortOperation>,
}

/// `soap:body` of one direction of a bound operation
#[derive(Debug, Clone, PartialEq)]
pub struct BodyBinding {
    pub body_use: BodyUse,
    /// Wrapper namespace for rpc style
    pub namespace: Option<String>,
    /// Restricts the body to these message parts
    pub parts: Option<Vec<String>>,
    pub has_headers: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingOperation {
    pub name: String,
    pub soap_action: Option<String>,
    pub style: Option<BindingStyle>,
    pub input: Option<BodyBinding>,
    pub output: Option<BodyBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoapBinding {
    pub version: SoapVersion,
    pub style: BindingStyle,
    pub transport: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: XmlName,
    pub port_type: XmlName,
    /// `None` for HTTP GET/POST and other non-SOAP bindings
    pub soap: Option<SoapBinding>,
    pub operations: Vec<BindingOperation>,
}

impl Binding {
    pub fn operation(&self, name: &str) -> Option<&BindingOperation> {
        self.operations.iter().find(|operation| operation.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub name: String,
    pub binding: XmlName,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub documentation: Option<String>,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definitions {
    pub name: Option<String>,
    pub target_namespace: String,
    pub documentation: Option<String>,
    /// Locations of `wsdl:import` elements
    pub imports: Vec<String>,
    /// Inline `xsd:schema` elements of `wsdl:types`
    pub schemas: Vec<XmlElement>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

impl Definitions {
    /// Read a `wsdl:definitions` document
    pub fn parse(root: &XmlElement) -> ParseResult<Self> {
        if !root.is(WSDL_NAMESPACE, "definitions") {
            return Err(ParseError::UnexpectedRoot {
                expected: "WSDL 1.1".to_string(),
                found: root.name.to_string(),
            });
        }

        let target_namespace = root.attr("targetNamespace").unwrap_or_default().to_string();
        let qualify = |name: &str| XmlName::new(target_namespace.as_str(), name);

        let imports = root
            .children_named(WSDL_NAMESPACE, "import")
            .map(|import| {
                import
                    .attr("location")
                    .or_else(|| import.attr("namespace"))
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();

        let schemas = root
            .children_named(WSDL_NAMESPACE, "types")
            .flat_map(|types| types.children_named(XSD_NAMESPACE, "schema"))
            .cloned()
            .collect();

        let mut messages = Vec::new();
        for message in root.children_named(WSDL_NAMESPACE, "message") {
            let mut parts = Vec::new();
            for part in message.children_named(WSDL_NAMESPACE, "part") {
                parts.push(Part {
                    name: part.required_attr("name")?.to_string(),
                    element: part.qname_attr("element")?,
                    type_name: part.qname_attr("type")?,
                });
            }
            messages.push(Message {
                name: qualify(message.required_attr("name")?),
                parts,
            });
        }

        let mut port_types = Vec::new();
        for port_type in root.children_named(WSDL_NAMESPACE, "portType") {
            let mut operations = Vec::new();
            for operation in port_type.children_named(WSDL_NAMESPACE, "operation") {
                operations.push(PortOperation {
                    name: operation.required_attr("name")?.to_string(),
                    documentation: documentation(operation),
                    input: message_ref(operation, "input")?,
                    output: message_ref(operation, "output")?,
                });
            }
            port_types.push(PortType {
                name: qualify(port_type.required_attr("name")?),
                operations,
            });
        }

        let mut bindings = Vec::new();
        for binding in root.children_named(WSDL_NAMESPACE, "binding") {
            bindings.push(parse_binding(binding, &target_namespace)?);
        }

        let mut services = Vec::new();
        for service in root.children_named(WSDL_NAMESPACE, "service") {
            let mut ports = Vec::new();
            for port in service.children_named(WSDL_NAMESPACE, "port") {
                let address = port
                    .children
                    .iter()
                    .find(|child| {
                        child.name.local == "address"
                            && SoapVersion::from_binding_namespace(&child.name.namespace).is_some()
                    })
                    .and_then(|address| address.attr("location"))
                    .map(str::to_string);
                ports.push(Port {
                    name: port.required_attr("name")?.to_string(),
                    binding: port.resolve_qname(port.required_attr("binding")?)?,
                    address,
                });
            }
            services.push(Service {
                name: service.required_attr("name")?.to_string(),
                documentation: documentation(service),
                ports,
            });
        }

        Ok(Self {
            name: root.attr("name").map(str::to_string),
            target_namespace: target_namespace.clone(),
            documentation: documentation(root),
            imports,
            schemas,
            messages,
            port_types,
            bindings,
            services,
        })
    }

    pub fn message(&self, name: &XmlName) -> Option<&Message> {
        self.messages.iter().find(|message| &message.name == name)
    }

    pub fn port_type(&self, name: &XmlName) -> Option<&PortType> {
        self.port_types.iter().find(|port_type| &port_type.name == name)
    }

    pub fn binding(&self, name: &XmlName) -> Option<&Binding> {
        self.bindings.iter().find(|binding| &binding.name == name)
    }
}

fn documentation(element: &XmlElement) -> Option<String> {
    element
        .child(WSDL_NAMESPACE, "documentation")
        .map(|doc| doc.text().trim().to_string())
        .filter(|doc| !doc.is_empty())
}

fn message_ref(operation: &XmlElement, direction: &str) -> ParseResult<Option<XmlName>> {
    match operation.child(WSDL_NAMESPACE, direction) {
        Some(element) => element.qname_attr("message"),
        None => Ok(None),
    }
}

/// The SOAP extension element of a binding construct, in either SOAP namespace
fn soap_extension<'a>(element: &'a XmlElement, local: &str) -> Option<(SoapVersion, &'a XmlElement)> {
    element.children.iter().find_map(|child| {
        if child.name.local != local {
            return None;
        }
        SoapVersion::from_binding_namespace(&child.name.namespace).map(|version| (version, child))
    })
}

fn parse_binding(binding: &XmlElement, target_namespace: &str) -> ParseResult<Binding> {
    let soap = soap_extension(binding, "binding").map(|(version, element)| SoapBinding {
        version,
        style: BindingStyle::parse(element.attr("style")).unwrap_or(BindingStyle::Document),
        transport: element.attr("transport").map(str::to_string),
    });

    let mut operations = Vec::new();
    for operation in binding.children_named(WSDL_NAMESPACE, "operation") {
        let soap_operation = soap_extension(operation, "operation").map(|(_, element)| element);
        operations.push(BindingOperation {
            name: operation.required_attr("name")?.to_string(),
            soap_action: soap_operation
                .and_then(|element| element.attr("soapAction"))
                .map(str::to_string),
            style: BindingStyle::parse(soap_operation.and_then(|element| element.attr("style"))),
            input: operation
                .child(WSDL_NAMESPACE, "input")
                .and_then(body_binding),
            output: operation
                .child(WSDL_NAMESPACE, "output")
                .and_then(body_binding),
        });
    }

    Ok(Binding {
        name: XmlName::new(target_namespace, binding.required_attr("name")?),
        port_type: binding.resolve_qname(binding.required_attr("type")?)?,
        soap,
        operations,
    })
}

fn body_binding(direction: &XmlElement) -> Option<BodyBinding> {
    let (_, body) = soap_extension(direction, "body")?;
    Some(BodyBinding {
        body_use: match body.attr("use") {
            Some("encoded") => BodyUse::Encoded,
            _ => BodyUse::Literal,
        },
        namespace: body.attr("namespace").map(str::to_string),
        parts: body
            .attr("parts")
            .map(|parts| parts.split_whitespace().map(str::to_string).collect()),
        has_headers: soap_extension(direction, "header").is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    const WSDL: &str = r#"<?xml version="1.0"?>
<wsdl:definitions name="Users" targetNamespace="urn:users"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
    xmlns:http="http://schemas.xmlsoap.org/wsdl/http/"
    xmlns:s="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:users">
  <wsdl:documentation>User directory</wsdl:documentation>
  <wsdl:types><s:schema targetNamespace="urn:users"/></wsdl:types>
  <wsdl:message name="PingIn"><wsdl:part name="text" type="s:string"/></wsdl:message>
  <wsdl:message name="PingOut"><wsdl:part name="return" type="s:string"/></wsdl:message>
  <wsdl:portType name="UsersPort">
    <wsdl:operation name="Ping">
      <wsdl:documentation>Echo</wsdl:documentation>
      <wsdl:input message="tns:PingIn"/>
      <wsdl:output message="tns:PingOut"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="UsersSoap" type="tns:UsersPort">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" style="rpc"/>
    <wsdl:operation name="Ping">
      <soap:operation soapAction="urn:users#Ping"/>
      <wsdl:input><soap:body use="literal" namespace="urn:users"/></wsdl:input>
      <wsdl:output><soap:body use="encoded" parts="return"/><soap:header message="tns:PingIn" part="text"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:binding name="UsersSoap12" type="tns:UsersPort">
    <soap12:binding transport="http://schemas.xmlsoap.org/soap/http"/>
  </wsdl:binding>
  <wsdl:binding name="UsersHttpGet" type="tns:UsersPort">
    <http:binding verb="GET"/>
  </wsdl:binding>
  <wsdl:service name="Users">
    <wsdl:port name="UsersSoap" binding="tns:UsersSoap">
      <soap:address location="http://example.com/users"/>
    </wsdl:port>
    <wsdl:port name="UsersHttpGet" binding="tns:UsersHttpGet">
      <http:address location="http://example.com/users/get"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    fn definitions() -> Definitions {
        Definitions::parse(&parse_document(WSDL.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_messages_and_port_types() {
        let definitions = definitions();
        assert_eq!(definitions.name.as_deref(), Some("Users"));
        assert_eq!(definitions.documentation.as_deref(), Some("User directory"));
        assert_eq!(definitions.schemas.len(), 1);

        let message = definitions.message(&XmlName::new("urn:users", "PingIn")).unwrap();
        assert_eq!(
            message.parts[0].type_name,
            Some(XmlName::new(XSD_NAMESPACE, "string"))
        );

        let port_type = definitions
            .port_type(&XmlName::new("urn:users", "UsersPort"))
            .unwrap();
        let operation = &port_type.operations[0];
        assert_eq!(operation.documentation.as_deref(), Some("Echo"));
        assert_eq!(operation.output, Some(XmlName::new("urn:users", "PingOut")));
    }

    #[test]
    fn test_bindings() {
        let definitions = definitions();
        assert_eq!(definitions.bindings.len(), 3);

        let soap11 = &definitions.bindings[0];
        let soap = soap11.soap.as_ref().unwrap();
        assert_eq!(soap.version, SoapVersion::Soap11);
        assert_eq!(soap.style, BindingStyle::Rpc);

        let ping = soap11.operation("Ping").unwrap();
        assert_eq!(ping.soap_action.as_deref(), Some("urn:users#Ping"));
        let input = ping.input.as_ref().unwrap();
        assert_eq!(input.body_use, BodyUse::Literal);
        assert_eq!(input.namespace.as_deref(), Some("urn:users"));
        let output = ping.output.as_ref().unwrap();
        assert_eq!(output.body_use, BodyUse::Encoded);
        assert_eq!(output.parts, Some(vec!["return".to_string()]));
        assert!(output.has_headers);

        let soap12 = definitions.bindings[1].soap.as_ref().unwrap();
        assert_eq!(soap12.version, SoapVersion::Soap12);
        assert_eq!(soap12.style, BindingStyle::Document);

        assert!(definitions.bindings[2].soap.is_none());
    }

    #[test]
    fn test_service_ports() {
        let definitions = definitions();
        let ports = &definitions.services[0].ports;
        assert_eq!(ports[0].address.as_deref(), Some("http://example.com/users"));
        assert_eq!(ports[1].address, None);
    }

    #[test]
    fn test_rejects_other_documents() {
        let root = parse_document(b"<html/>").unwrap();
        assert!(matches!(
            Definitions::parse(&root),
            Err(ParseError::UnexpectedRoot { .. })
        ));
    }
}
