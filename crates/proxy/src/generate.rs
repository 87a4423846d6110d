//! Client source generation
//!
//! Lowers a parsed description into a [`ClientSource`]: one [`OperationStub`] per bound
//! operation, holding the operation's descriptor and the layout of its request and
//! response bodies. Anything the runtime cannot call faithfully is reported as an
//! [`ImportWarning`]; a description with any warning does not generate at all.

use chrono::Utc;
use dws_core::{
    Field, NativeType, OperationDescriptor, Parameter, RecordType, ServiceLocation, TypeOrigin,
};
use dws_wsdl::{
    Binding, BindingStyle, BodyBinding, BodyUse, Definitions, Message, Part, PortOperation,
    Service, ServiceDescription, SoapVersion, TypeResolver, UnresolvedReference, WrapperContent,
    XmlName,
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// A reason the description cannot be turned into a client module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportWarning {
    #[error("the description has no SOAP 1.1 or SOAP 1.2 binding")]
    NoSoapBinding,

    #[error("the description defines no operations")]
    NoOperations,

    #[error("wsdl:import of '{location}' is not supported")]
    WsdlImport { location: String },

    #[error("operation {operation} uses SOAP encoding")]
    EncodedBody { operation: String },

    #[error("operation {operation} has no binding")]
    MissingBinding { operation: String },

    #[error("{context}: {reference}")]
    Unresolved {
        context: String,
        reference: UnresolvedReference,
    },

    #[error("operation {operation}: part '{part}' {reason}")]
    UnsupportedPart {
        operation: String,
        part: String,
        reason: &'static str,
    },
}

/// One element of a message body
#[derive(Debug, Clone, PartialEq)]
pub struct PartLayout {
    pub name: XmlName,
    pub ty: NativeType,
}

/// Shape of a request or response body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyLayout {
    /// Element enclosing the parts, for wrapped and rpc operations
    pub wrapper: Option<XmlName>,
    pub parts: Vec<PartLayout>,
}

/// A callable remote operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationStub {
    pub descriptor: OperationDescriptor,
    pub soap_action: Option<String>,
    pub style: BindingStyle,
    pub request: BodyLayout,
    /// A single part is the return value; several parts form the returned record
    pub response: BodyLayout,
}

/// Everything needed to build a client module for one service
#[derive(Debug, Clone)]
pub struct ClientSource {
    pub module_name: String,
    pub location: ServiceLocation,
    pub service_name: String,
    pub documentation: Option<String>,
    pub version: SoapVersion,
    pub endpoint: Option<String>,
    pub operations: Vec<OperationStub>,
}

/// Unique module name: `DWS_<yyyyMMdd-HHmmss>_<uuid>`
pub fn module_name() -> String {
    format!(
        "DWS_{}_{}",
        Utc::now().format("%Y%m%d-%H%M%S"),
        Uuid::new_v4().simple()
    )
}

/// Generate the client source of a loaded description
pub fn generate(
    description: &ServiceDescription,
    location: &ServiceLocation,
) -> Result<ClientSource, Vec<ImportWarning>> {
    let definitions = &description.definitions;
    let mut generator = Generator {
        definitions,
        resolver: TypeResolver::new(&description.schemas),
        warnings: definitions
            .imports
            .iter()
            .map(|location| ImportWarning::WsdlImport {
                location: location.clone(),
            })
            .collect(),
    };

    let Some(selected) = select_binding(definitions) else {
        generator.warnings.push(ImportWarning::NoSoapBinding);
        return Err(generator.warnings);
    };
    let binding = selected.binding;

    let Some(port_type) = definitions.port_type(&binding.port_type) else {
        generator.warnings.push(ImportWarning::Unresolved {
            context: format!("binding {}", binding.name.local),
            reference: UnresolvedReference {
                kind: "port type",
                name: binding.port_type.clone(),
            },
        });
        return Err(generator.warnings);
    };
    if port_type.operations.is_empty() {
        generator.warnings.push(ImportWarning::NoOperations);
    }

    let operations: Vec<OperationStub> = port_type
        .operations
        .iter()
        .filter_map(|operation| generator.operation(binding, selected.style, operation))
        .collect();

    if !generator.warnings.is_empty() {
        return Err(generator.warnings);
    }

    let service_name = selected
        .service
        .map(|service| service.name.clone())
        .or_else(|| definitions.name.clone())
        .unwrap_or_else(|| "Service".to_string());
    let documentation = selected
        .service
        .and_then(|service| service.documentation.clone())
        .or_else(|| definitions.documentation.clone());

    Ok(ClientSource {
        module_name: module_name(),
        location: location.clone(),
        service_name,
        documentation,
        version: selected.version,
        endpoint: selected.address.map(str::to_string),
        operations,
    })
}

struct SelectedBinding<'a> {
    binding: &'a Binding,
    version: SoapVersion,
    style: BindingStyle,
    address: Option<&'a str>,
    service: Option<&'a Service>,
}

/// The SOAP binding to generate from, SOAP 1.1 first
fn select_binding(definitions: &Definitions) -> Option<SelectedBinding<'_>> {
    let mut candidates: Vec<SelectedBinding<'_>> = Vec::new();
    for service in &definitions.services {
        for port in &service.ports {
            let Some(binding) = definitions.binding(&port.binding) else {
                continue;
            };
            if let Some(soap) = &binding.soap {
                candidates.push(SelectedBinding {
                    binding,
                    version: soap.version,
                    style: soap.style,
                    address: port.address.as_deref(),
                    service: Some(service),
                });
            }
        }
    }

    if candidates.is_empty() {
        for binding in &definitions.bindings {
            if let Some(soap) = &binding.soap {
                candidates.push(SelectedBinding {
                    binding,
                    version: soap.version,
                    style: soap.style,
                    address: None,
                    service: None,
                });
            }
        }
    }

    candidates.into_iter().min_by_key(|candidate| candidate.version)
}

/// Result of lowering one operation's messages
struct Lowered {
    parameters: Vec<Parameter>,
    request: BodyLayout,
    returns: Option<NativeType>,
    response: BodyLayout,
}

struct Generator<'a> {
    definitions: &'a Definitions,
    resolver: TypeResolver<'a>,
    warnings: Vec<ImportWarning>,
}

impl<'a> Generator<'a> {
    fn operation(
        &mut self,
        binding: &Binding,
        default_style: BindingStyle,
        operation: &PortOperation,
    ) -> Option<OperationStub> {
        let name = operation.name.clone();
        let Some(bound) = binding.operation(&operation.name) else {
            self.warnings
                .push(ImportWarning::MissingBinding { operation: name });
            return None;
        };

        let bodies = [bound.input.as_ref(), bound.output.as_ref()];
        if bodies
            .iter()
            .flatten()
            .any(|body| body.body_use == BodyUse::Encoded)
        {
            self.warnings
                .push(ImportWarning::EncodedBody { operation: name });
            return None;
        }
        if bodies.iter().flatten().any(|body| body.has_headers) {
            debug!(operation = %name, "Ignoring SOAP header bindings");
        }

        let input = self.message(&name, operation.input.as_ref())?;
        let output = self.message(&name, operation.output.as_ref())?;
        let input_parts = body_parts(input, bound.input.as_ref());
        let output_parts = body_parts(output, bound.output.as_ref());

        let style = bound.style.unwrap_or(default_style);
        let lowered = match style {
            BindingStyle::Document => self.document(&name, &input_parts, &output_parts),
            BindingStyle::Rpc => self.rpc(
                &name,
                (&input_parts, bound.input.as_ref()),
                output.map(|_| (output_parts.as_slice(), bound.output.as_ref())),
            ),
        };

        match lowered {
            Ok(lowered) => Some(OperationStub {
                descriptor: OperationDescriptor {
                    name,
                    documentation: operation.documentation.clone(),
                    parameters: lowered.parameters,
                    returns: lowered.returns,
                },
                soap_action: bound.soap_action.clone(),
                style,
                request: lowered.request,
                response: lowered.response,
            }),
            Err(warning) => {
                self.warnings.push(warning);
                None
            }
        }
    }

    /// Look up a referenced message; `Some(None)` when the operation has no such direction
    fn message(&mut self, operation: &str, name: Option<&XmlName>) -> Option<Option<&'a Message>> {
        let Some(name) = name else {
            return Some(None);
        };
        match self.definitions.message(name) {
            Some(message) => Some(Some(message)),
            None => {
                self.warnings.push(ImportWarning::Unresolved {
                    context: format!("operation {}", operation),
                    reference: UnresolvedReference {
                        kind: "message",
                        name: name.clone(),
                    },
                });
                None
            }
        }
    }

    fn document(
        &mut self,
        operation: &str,
        input: &[&Part],
        output: &[&Part],
    ) -> Result<Lowered, ImportWarning> {
        if let Some((wrapper, content)) = self.wrapper(operation, input, |local| local == operation)? {
            let parameters = content
                .fields
                .iter()
                .map(|field| Parameter {
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                })
                .collect();
            let request = wrapped_layout(wrapper, &content);

            let response_name = format!("{}Response", operation);
            let (returns, response) =
                match self.wrapper(operation, output, |local| local == response_name)? {
                    Some((wrapper, content)) => {
                        let response = wrapped_layout(wrapper, &content);
                        let returns =
                            combined_return(operation, &content.namespace, content.qualified, &response.parts);
                        (returns, response)
                    }
                    None => self.bare_response(operation, output)?,
                };

            return Ok(Lowered {
                parameters,
                request,
                returns,
                response,
            });
        }

        let parts = self.element_parts(operation, input)?;
        let parameters = parts
            .iter()
            .map(|part| Parameter {
                name: part.name.local.clone(),
                ty: part.ty.clone(),
            })
            .collect();
        let (returns, response) = self.bare_response(operation, output)?;

        Ok(Lowered {
            parameters,
            request: BodyLayout {
                wrapper: None,
                parts,
            },
            returns,
            response,
        })
    }

    /// A single element part acting as a document/literal wrapper
    fn wrapper(
        &mut self,
        operation: &str,
        parts: &[&Part],
        accepts: impl Fn(&str) -> bool,
    ) -> Result<Option<(XmlName, WrapperContent)>, ImportWarning> {
        let [part] = parts else {
            return Ok(None);
        };
        let Some(element) = part.element.as_ref().filter(|element| accepts(&element.local)) else {
            return Ok(None);
        };

        let content = self
            .resolver
            .wrapper_content(element)
            .map_err(|reference| unresolved(operation, reference))?;
        Ok(content.map(|content| (element.clone(), content)))
    }

    fn bare_response(
        &mut self,
        operation: &str,
        output: &[&Part],
    ) -> Result<(Option<NativeType>, BodyLayout), ImportWarning> {
        let parts = self.element_parts(operation, output)?;
        let namespace = parts
            .first()
            .map(|part| part.name.namespace.clone())
            .unwrap_or_default();
        let returns = combined_return(operation, &namespace, true, &parts);
        Ok((
            returns,
            BodyLayout {
                wrapper: None,
                parts,
            },
        ))
    }

    fn element_parts(
        &mut self,
        operation: &str,
        parts: &[&Part],
    ) -> Result<Vec<PartLayout>, ImportWarning> {
        parts
            .iter()
            .map(|part| match (&part.element, &part.type_name) {
                (Some(element), _) => {
                    let declaration = self
                        .resolver
                        .resolve_element(element)
                        .map_err(|reference| unresolved(operation, reference))?;
                    Ok(PartLayout {
                        name: element.clone(),
                        ty: declaration.ty,
                    })
                }
                (None, Some(_)) => Err(ImportWarning::UnsupportedPart {
                    operation: operation.to_string(),
                    part: part.name.clone(),
                    reason: "is typed but document style requires an element",
                }),
                (None, None) => Err(missing_type(operation, part)),
            })
            .collect()
    }

    fn rpc(
        &mut self,
        operation: &str,
        input: (&[&Part], Option<&BodyBinding>),
        output: Option<(&[&Part], Option<&BodyBinding>)>,
    ) -> Result<Lowered, ImportWarning> {
        let definitions = self.definitions;
        let default_namespace = &definitions.target_namespace;
        let namespace = |body: Option<&BodyBinding>| {
            body.and_then(|body| body.namespace.clone())
                .unwrap_or_else(|| default_namespace.clone())
        };

        let request_parts = self.typed_parts(operation, input.0)?;
        let parameters = request_parts
            .iter()
            .map(|part| Parameter {
                name: part.name.local.clone(),
                ty: part.ty.clone(),
            })
            .collect();
        let request = BodyLayout {
            wrapper: Some(XmlName::new(namespace(input.1), operation)),
            parts: request_parts,
        };

        let (returns, response) = match output {
            Some((parts, body)) => {
                let response_namespace = namespace(body);
                let parts = self.typed_parts(operation, parts)?;
                let returns = combined_return(operation, &response_namespace, false, &parts);
                let response = BodyLayout {
                    wrapper: Some(XmlName::new(
                        response_namespace,
                        format!("{}Response", operation),
                    )),
                    parts,
                };
                (returns, response)
            }
            None => (None, BodyLayout::default()),
        };

        Ok(Lowered {
            parameters,
            request,
            returns,
            response,
        })
    }

    /// Rpc parts are unqualified accessors named after the part
    fn typed_parts(
        &mut self,
        operation: &str,
        parts: &[&Part],
    ) -> Result<Vec<PartLayout>, ImportWarning> {
        parts
            .iter()
            .map(|part| {
                let ty = match (&part.type_name, &part.element) {
                    (Some(type_name), _) => self.resolver.resolve_type(type_name),
                    (None, Some(element)) => self
                        .resolver
                        .resolve_element(element)
                        .map(|declaration| declaration.ty),
                    (None, None) => return Err(missing_type(operation, part)),
                }
                .map_err(|reference| unresolved(operation, reference))?;

                Ok(PartLayout {
                    name: XmlName::unqualified(part.name.clone()),
                    ty,
                })
            })
            .collect()
    }
}

fn body_parts<'m>(message: Option<&'m Message>, body: Option<&BodyBinding>) -> Vec<&'m Part> {
    let Some(message) = message else {
        return Vec::new();
    };
    let selected = body.and_then(|body| body.parts.as_ref());
    message
        .parts
        .iter()
        .filter(|part| selected.map(|names| names.contains(&part.name)).unwrap_or(true))
        .collect()
}

fn wrapped_layout(wrapper: XmlName, content: &WrapperContent) -> BodyLayout {
    let namespace = if content.qualified {
        content.namespace.as_str()
    } else {
        ""
    };
    BodyLayout {
        wrapper: Some(wrapper),
        parts: content
            .fields
            .iter()
            .map(|field| PartLayout {
                name: XmlName::new(namespace, field.name.as_str()),
                ty: field.ty.clone(),
            })
            .collect(),
    }
}

/// Return type of a response: nothing, its only part, or a record of all parts
fn combined_return(
    operation: &str,
    namespace: &str,
    qualified: bool,
    parts: &[PartLayout],
) -> Option<NativeType> {
    match parts {
        [] => None,
        [single] => Some(single.ty.clone()),
        many => Some(NativeType::record(RecordType {
            name: format!("{}Result", operation),
            namespace: namespace.to_string(),
            origin: TypeOrigin::Module,
            qualified,
            fields: many
                .iter()
                .map(|part| Field {
                    name: part.name.local.clone(),
                    ty: part.ty.clone(),
                    attribute: false,
                })
                .collect(),
        })),
    }
}

fn unresolved(operation: &str, reference: UnresolvedReference) -> ImportWarning {
    ImportWarning::Unresolved {
        context: format!("operation {}", operation),
        reference,
    }
}

fn missing_type(operation: &str, part: &Part) -> ImportWarning {
    ImportWarning::UnsupportedPart {
        operation: operation.to_string(),
        part: part.name.clone(),
        reason: "has neither an element nor a type",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dws_core::{ReturnShape, ScalarType};
    use dws_wsdl::{SchemaSet, parse_document};
    use url::Url;

    const HEAD: &str = r#"<wsdl:definitions name="Users" targetNamespace="urn:users"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
    xmlns:s="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:users">"#;

    const TYPES: &str = r#"
  <wsdl:types>
    <s:schema targetNamespace="urn:users" elementFormDefault="qualified">
      <s:complexType name="User">
        <s:sequence>
          <s:element name="name" type="s:string"/>
          <s:element name="age" type="s:int"/>
        </s:sequence>
      </s:complexType>
      <s:element name="GetUser">
        <s:complexType><s:sequence><s:element name="id" type="s:int"/></s:sequence></s:complexType>
      </s:element>
      <s:element name="GetUserResponse">
        <s:complexType><s:sequence><s:element name="GetUserResult" type="tns:User"/></s:sequence></s:complexType>
      </s:element>
      <s:element name="Ping"><s:complexType/></s:element>
      <s:element name="PingResponse"><s:complexType/></s:element>
    </s:schema>
  </wsdl:types>
  <wsdl:message name="GetUserSoapIn"><wsdl:part name="parameters" element="tns:GetUser"/></wsdl:message>
  <wsdl:message name="GetUserSoapOut"><wsdl:part name="parameters" element="tns:GetUserResponse"/></wsdl:message>
  <wsdl:message name="PingSoapIn"><wsdl:part name="parameters" element="tns:Ping"/></wsdl:message>
  <wsdl:message name="PingSoapOut"><wsdl:part name="parameters" element="tns:PingResponse"/></wsdl:message>
  <wsdl:portType name="UsersSoap">
    <wsdl:operation name="GetUser">
      <wsdl:documentation>Look up one user</wsdl:documentation>
      <wsdl:input message="tns:GetUserSoapIn"/>
      <wsdl:output message="tns:GetUserSoapOut"/>
    </wsdl:operation>
    <wsdl:operation name="Ping">
      <wsdl:input message="tns:PingSoapIn"/>
      <wsdl:output message="tns:PingSoapOut"/>
    </wsdl:operation>
  </wsdl:portType>"#;

    fn binding(prefix: &str, name: &str, use_: &str) -> String {
        format!(
            r#"
  <wsdl:binding name="{name}" type="tns:UsersSoap">
    <{prefix}:binding transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="GetUser">
      <{prefix}:operation soapAction="urn:users/GetUser" style="document"/>
      <wsdl:input><{prefix}:body use="{use_}"/></wsdl:input>
      <wsdl:output><{prefix}:body use="{use_}"/></wsdl:output>
    </wsdl:operation>
    <wsdl:operation name="Ping">
      <{prefix}:operation soapAction="urn:users/Ping" style="document"/>
      <wsdl:input><{prefix}:body use="literal"/></wsdl:input>
      <wsdl:output><{prefix}:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>"#
        )
    }

    const SERVICE: &str = r#"
  <wsdl:service name="UserService">
    <wsdl:documentation>Directory of users</wsdl:documentation>
    <wsdl:port name="UsersSoap12" binding="tns:UsersSoap12">
      <soap12:address location="http://example.com/users12.asmx"/>
    </wsdl:port>
    <wsdl:port name="UsersSoap" binding="tns:UsersSoap">
      <soap:address location="http://example.com/users.asmx"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    fn describe(document: &str) -> ServiceDescription {
        let root = parse_document(document.as_bytes()).unwrap();
        let definitions = Definitions::parse(&root).unwrap();
        let mut schemas = SchemaSet::default();
        for schema in &definitions.schemas {
            schemas.add(schema.clone(), None).unwrap();
        }
        ServiceDescription {
            url: Url::parse("http://example.com/users.asmx?wsdl").unwrap(),
            definitions,
            schemas,
        }
    }

    fn location() -> ServiceLocation {
        "http://example.com/users.asmx".parse().unwrap()
    }

    fn users_wsdl(use_: &str) -> String {
        format!(
            "{HEAD}{TYPES}{}{}{SERVICE}",
            binding("soap12", "UsersSoap12", "literal"),
            binding("soap", "UsersSoap", use_)
        )
    }

    #[test]
    fn test_wrapped_document_literal() {
        let source = generate(&describe(&users_wsdl("literal")), &location()).unwrap();
        assert_eq!(source.service_name, "UserService");
        assert_eq!(source.documentation.as_deref(), Some("Directory of users"));
        assert_eq!(source.version, SoapVersion::Soap11);
        assert_eq!(source.endpoint.as_deref(), Some("http://example.com/users.asmx"));
        assert!(source.module_name.starts_with("DWS_"));

        let get_user = &source.operations[0];
        assert_eq!(
            get_user.descriptor.signature(),
            "GetUser(id:int)->User{name:string,age:int}"
        );
        assert_eq!(get_user.descriptor.documentation.as_deref(), Some("Look up one user"));
        assert_eq!(get_user.soap_action.as_deref(), Some("urn:users/GetUser"));
        assert_eq!(
            get_user.request.wrapper,
            Some(XmlName::new("urn:users", "GetUser"))
        );
        assert_eq!(get_user.request.parts[0].name, XmlName::new("urn:users", "id"));
        assert_eq!(
            get_user.response.parts[0].name,
            XmlName::new("urn:users", "GetUserResult")
        );

        let ping = &source.operations[1];
        assert_eq!(ping.descriptor.return_shape(), ReturnShape::Void);
        assert!(ping.descriptor.parameters.is_empty());
    }

    #[test]
    fn test_encoded_use_is_fatal() {
        let warnings = generate(&describe(&users_wsdl("encoded")), &location()).unwrap_err();
        assert_eq!(
            warnings,
            vec![ImportWarning::EncodedBody {
                operation: "GetUser".to_string()
            }]
        );
    }

    #[test]
    fn test_soap12_only_description() {
        let document = format!("{HEAD}{TYPES}{}</wsdl:definitions>", binding("soap12", "UsersSoap12", "literal"));
        let source = generate(&describe(&document), &location()).unwrap();
        assert_eq!(source.version, SoapVersion::Soap12);
        assert_eq!(source.endpoint, None);
        assert_eq!(source.service_name, "Users");
    }

    #[test]
    fn test_no_soap_binding() {
        let document = format!("{HEAD}{TYPES}</wsdl:definitions>");
        let warnings = generate(&describe(&document), &location()).unwrap_err();
        assert_eq!(warnings, vec![ImportWarning::NoSoapBinding]);
    }

    #[test]
    fn test_wsdl_import_and_missing_binding() {
        let document = format!(
            r#"{HEAD}<wsdl:import namespace="urn:other" location="http://example.com/other.wsdl"/>{TYPES}
  <wsdl:binding name="UsersSoap" type="tns:UsersSoap">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="Ping">
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
</wsdl:definitions>"#
        );
        let warnings = generate(&describe(&document), &location()).unwrap_err();
        assert_eq!(
            warnings,
            vec![
                ImportWarning::WsdlImport {
                    location: "http://example.com/other.wsdl".to_string()
                },
                ImportWarning::MissingBinding {
                    operation: "GetUser".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_rpc_literal() {
        let document = format!(
            r#"{HEAD}
  <wsdl:message name="AddIn">
    <wsdl:part name="a" type="s:int"/>
    <wsdl:part name="b" type="s:int"/>
  </wsdl:message>
  <wsdl:message name="AddOut"><wsdl:part name="sum" type="s:long"/></wsdl:message>
  <wsdl:message name="SplitOut">
    <wsdl:part name="low" type="s:int"/>
    <wsdl:part name="high" type="s:int"/>
  </wsdl:message>
  <wsdl:portType name="UsersSoap">
    <wsdl:operation name="Add"><wsdl:input message="tns:AddIn"/><wsdl:output message="tns:AddOut"/></wsdl:operation>
    <wsdl:operation name="Split"><wsdl:input message="tns:AddIn"/><wsdl:output message="tns:SplitOut"/></wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="UsersSoap" type="tns:UsersSoap">
    <soap:binding style="rpc" transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="Add">
      <wsdl:input><soap:body use="literal" namespace="urn:math"/></wsdl:input>
      <wsdl:output><soap:body use="literal" namespace="urn:math"/></wsdl:output>
    </wsdl:operation>
    <wsdl:operation name="Split">
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
</wsdl:definitions>"#
        );
        let source = generate(&describe(&document), &location()).unwrap();

        let add = &source.operations[0];
        assert_eq!(add.style, BindingStyle::Rpc);
        assert_eq!(add.descriptor.signature(), "Add(a:int,b:int)->long");
        assert_eq!(add.request.wrapper, Some(XmlName::new("urn:math", "Add")));
        assert_eq!(add.request.parts[0].name, XmlName::unqualified("a"));
        assert_eq!(
            add.response.wrapper,
            Some(XmlName::new("urn:math", "AddResponse"))
        );

        let split = &source.operations[1];
        assert_eq!(
            split.descriptor.signature(),
            "Split(a:int,b:int)->SplitResult{low:int,high:int}"
        );
        assert_eq!(
            split.request.wrapper,
            Some(XmlName::new("urn:users", "Split"))
        );
        assert_eq!(
            split.descriptor.returns.as_ref().and_then(NativeType::as_record).map(|r| r.origin),
            Some(TypeOrigin::Module)
        );
        assert_eq!(
            add.descriptor.parameters[0].ty,
            NativeType::Scalar(ScalarType::Int)
        );
    }

    #[test]
    fn test_unresolved_element() {
        let document = format!(
            r#"{HEAD}
  <wsdl:message name="In"><wsdl:part name="parameters" element="tns:Missing"/></wsdl:message>
  <wsdl:portType name="UsersSoap">
    <wsdl:operation name="Lost"><wsdl:input message="tns:In"/></wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="UsersSoap" type="tns:UsersSoap">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="Lost"><wsdl:input><soap:body use="literal"/></wsdl:input></wsdl:operation>
  </wsdl:binding>
</wsdl:definitions>"#
        );
        let warnings = generate(&describe(&document), &location()).unwrap_err();
        assert!(matches!(
            &warnings[..],
            [ImportWarning::Unresolved { reference, .. }] if reference.kind == "element"
        ));
    }
}
