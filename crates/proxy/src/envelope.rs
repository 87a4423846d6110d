//! SOAP envelopes
//!
//! Requests are written without element prefixes: every element that changes namespace
//! declares it as the default namespace. Responses are read through the namespace-aware
//! tree of `dws-wsdl` and matched to the expected layout by local name.

use crate::error::{CallError, CallResult};
use crate::generate::BodyLayout;
use crate::transport::{SoapResponse, TransportError};
use dws_core::{NativeType, NativeValue, RecordType, RecordValue, ScalarType, Value};
use dws_wsdl::{SoapVersion, XmlElement, XmlName, parse_document};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;
use url::Url;

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// A `soap:Fault` returned by the service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {reason}")]
pub struct SoapFault {
    pub code: String,
    pub reason: String,
    pub detail: Option<String>,
}

impl SoapFault {
    fn parse(fault: &XmlElement) -> Self {
        let namespace = fault.name.namespace.as_str();
        let local_text = |parent: &XmlElement, name: &str| {
            parent
                .children
                .iter()
                .find(|child| child.name.local == name)
                .map(|child| child.text().trim().to_string())
        };

        // SOAP 1.2 nests the code and reason text one level deeper
        let code = fault
            .child(namespace, "Code")
            .and_then(|code| local_text(code, "Value"))
            .or_else(|| local_text(fault, "faultcode"))
            .unwrap_or_default();
        let reason = fault
            .child(namespace, "Reason")
            .and_then(|reason| local_text(reason, "Text"))
            .or_else(|| local_text(fault, "faultstring"))
            .unwrap_or_default();
        let detail = fault
            .children
            .iter()
            .find(|child| child.name.local == "detail" || child.name.local == "Detail")
            .map(flatten_text)
            .filter(|detail| !detail.is_empty());

        Self {
            code,
            reason,
            detail,
        }
    }
}

/// All text below an element, whitespace-separated
fn flatten_text(element: &XmlElement) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    parts.join(" ")
}

fn collect_text<'a>(element: &'a XmlElement, parts: &mut Vec<&'a str>) {
    let text = element.text().trim();
    if !text.is_empty() {
        parts.push(text);
    }
    for child in &element.children {
        collect_text(child, parts);
    }
}

/// Write the request envelope of an operation
pub fn encode_request(
    operation: &str,
    version: SoapVersion,
    layout: &BodyLayout,
    arguments: &[NativeValue],
) -> CallResult<Vec<u8>> {
    let mut encoder = Encoder {
        operation,
        writer: Writer::new(Vec::new()),
    };
    encoder.envelope(version, layout, arguments)?;
    Ok(encoder.writer.into_inner())
}

struct Encoder<'a> {
    operation: &'a str,
    writer: Writer<Vec<u8>>,
}

impl Encoder<'_> {
    fn envelope(
        &mut self,
        version: SoapVersion,
        layout: &BodyLayout,
        arguments: &[NativeValue],
    ) -> CallResult<()> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut envelope = BytesStart::new("soap:Envelope");
        envelope.push_attribute(("xmlns:soap", version.envelope_namespace()));
        envelope.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        envelope.push_attribute(("xmlns:xsd", XSD_NAMESPACE));
        self.write(Event::Start(envelope))?;
        self.write(Event::Start(BytesStart::new("soap:Body")))?;

        let scope = match &layout.wrapper {
            Some(wrapper) => {
                let start = self.start(wrapper, "");
                self.write(Event::Start(start))?;
                wrapper.namespace.as_str()
            }
            None => "",
        };
        for (part, argument) in layout.parts.iter().zip(arguments) {
            self.element(&part.name, scope, &part.ty, argument, &part.name.local)?;
        }
        if let Some(wrapper) = &layout.wrapper {
            self.write(Event::End(BytesEnd::new(wrapper.local.as_str())))?;
        }

        self.write(Event::End(BytesEnd::new("soap:Body")))?;
        self.write(Event::End(BytesEnd::new("soap:Envelope")))
    }

    fn element(
        &mut self,
        name: &XmlName,
        scope: &str,
        ty: &NativeType,
        value: &NativeValue,
        path: &str,
    ) -> CallResult<()> {
        match (ty, value) {
            (NativeType::Nullable(_), NativeValue::Null) => {
                let mut start = self.start(name, scope);
                start.push_attribute(("xsi:nil", "true"));
                self.write(Event::Empty(start))
            }
            (_, NativeValue::Null) => Ok(()),
            (NativeType::Scalar(scalar) | NativeType::Nullable(scalar), NativeValue::Scalar { value }) => {
                let text = lexical(value, *scalar, path)?;
                let start = self.start(name, scope);
                self.write(Event::Start(start))?;
                self.write(Event::Text(BytesText::new(&text)))?;
                self.write(Event::End(BytesEnd::new(name.local.as_str())))
            }
            (NativeType::Record(record), NativeValue::Record(fields)) => {
                self.record(name, scope, record, fields, path)
            }
            (NativeType::Array(array), NativeValue::List { items }) => match &array.item_name {
                Some(item_name) => {
                    let start = self.start(name, scope);
                    self.write(Event::Start(start))?;
                    let item = XmlName::new(name.namespace.as_str(), item_name.as_str());
                    for (index, value) in items.iter().enumerate() {
                        let path = format!("{}[{}]", path, index);
                        self.element(&item, &name.namespace, &array.element, value, &path)?;
                    }
                    self.write(Event::End(BytesEnd::new(name.local.as_str())))
                }
                None => {
                    for (index, value) in items.iter().enumerate() {
                        let path = format!("{}[{}]", path, index);
                        self.element(name, scope, &array.element, value, &path)?;
                    }
                    Ok(())
                }
            },
            (NativeType::Opaque(opaque), _) => Err(self.encode_error(format!(
                "{} has type {} which cannot be sent",
                path, opaque.name
            ))),
            (ty, value) => Err(self.encode_error(format!(
                "{} expects {} but got a {} value",
                path,
                ty.type_name(),
                value.shape()
            ))),
        }
    }

    fn record(
        &mut self,
        name: &XmlName,
        scope: &str,
        record: &RecordType,
        value: &RecordValue,
        path: &str,
    ) -> CallResult<()> {
        let mut start = self.start(name, scope);
        let mut attributes = Vec::new();
        for field in record.fields.iter().filter(|field| field.attribute) {
            let field_path = format!("{}.{}", path, field.name);
            match (value.field(&field.name), field.ty.scalar()) {
                (NativeValue::Null, _) => {}
                (NativeValue::Scalar { value }, Some(scalar)) => {
                    attributes.push((field.name.as_str(), lexical(value, scalar, &field_path)?));
                }
                (other, _) => {
                    return Err(self.encode_error(format!(
                        "attribute {} cannot carry a {} value",
                        field_path,
                        other.shape()
                    )));
                }
            }
        }
        for (key, text) in &attributes {
            start.push_attribute((*key, text.as_str()));
        }
        self.write(Event::Start(start))?;

        let child_namespace = if record.qualified {
            record.namespace.as_str()
        } else {
            ""
        };
        for field in record.fields.iter().filter(|field| !field.attribute) {
            let child = XmlName::new(child_namespace, field.name.as_str());
            let field_path = format!("{}.{}", path, field.name);
            self.element(
                &child,
                &name.namespace,
                &field.ty,
                value.field(&field.name),
                &field_path,
            )?;
        }
        self.write(Event::End(BytesEnd::new(name.local.as_str())))
    }

    /// Start tag, declaring the namespace when it differs from the enclosing default
    fn start<'n>(&self, name: &'n XmlName, scope: &str) -> BytesStart<'n> {
        let mut start = BytesStart::new(name.local.as_str());
        if name.namespace != scope {
            start.push_attribute(("xmlns", name.namespace.as_str()));
        }
        start
    }

    fn write(&mut self, event: Event<'_>) -> CallResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| self.encode_error(e.to_string()))
    }

    fn encode_error(&self, reason: String) -> CallError {
        CallError::Encode {
            operation: self.operation.to_string(),
            reason,
        }
    }
}

fn lexical(value: &Value, scalar: ScalarType, path: &str) -> CallResult<String> {
    let native = value
        .clone()
        .to_native(scalar)
        .map_err(|e| e.for_property(path))?;
    Ok(native.to_lexical(scalar))
}

/// Read the response envelope of an operation
///
/// A fault always wins over the HTTP status. A non-success status without a fault is a
/// transport failure. `returns` names the record built when the response has several parts.
pub fn decode_response(
    operation: &str,
    endpoint: &Url,
    layout: &BodyLayout,
    returns: Option<&NativeType>,
    response: &SoapResponse,
) -> CallResult<NativeValue> {
    let success = (200..300).contains(&response.status);
    let decode_error = |reason: String| -> CallError {
        if success {
            CallError::Decode {
                operation: operation.to_string(),
                reason,
            }
        } else {
            TransportError::new(endpoint, format!("HTTP status {}", response.status)).into()
        }
    };

    // One-way operations may be answered with an empty 202
    if success && layout.parts.is_empty() && response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NativeValue::Null);
    }

    let root = parse_document(&response.body).map_err(|e| decode_error(e.to_string()))?;
    if root.name.local != "Envelope" || !is_envelope_namespace(&root.name.namespace) {
        return Err(decode_error(format!("unexpected root element {}", root.name)));
    }
    let body = root
        .child(&root.name.namespace, "Body")
        .ok_or_else(|| decode_error("the envelope has no body".to_string()))?;

    if let Some(fault) = body.child(&root.name.namespace, "Fault") {
        return Err(SoapFault::parse(fault).into());
    }
    if !success {
        return Err(decode_error(String::new()));
    }
    if layout.parts.is_empty() {
        return Ok(NativeValue::Null);
    }

    let container = match &layout.wrapper {
        Some(wrapper) => body
            .children
            .iter()
            .find(|child| child.name.local == wrapper.local)
            .or_else(|| body.children.first())
            .ok_or_else(|| decode_error(format!("the body has no {} element", wrapper.local)))?,
        None => body,
    };

    let mut values = Vec::with_capacity(layout.parts.len());
    for part in &layout.parts {
        let occurrences = children_named(container, &part.name.local);
        let value = decode_occurrences(&occurrences, &part.ty, &part.name.local).map_err(|e| {
            CallError::Decode {
                operation: operation.to_string(),
                reason: e,
            }
        })?;
        values.push((part.name.local.clone(), value));
    }

    if values.len() == 1 {
        return Ok(values.remove(0).1);
    }
    let type_name = returns
        .map(NativeType::type_name)
        .unwrap_or_else(|| format!("{}Result", operation));
    let mut record = RecordValue::new(type_name);
    for (name, value) in values {
        record.fields.insert(name, value);
    }
    Ok(record.into())
}

fn is_envelope_namespace(namespace: &str) -> bool {
    namespace == SoapVersion::Soap11.envelope_namespace()
        || namespace == SoapVersion::Soap12.envelope_namespace()
}

fn children_named<'a>(parent: &'a XmlElement, local: &str) -> Vec<&'a XmlElement> {
    parent
        .children
        .iter()
        .filter(|child| child.name.local == local)
        .collect()
}

fn decode_occurrences(
    elements: &[&XmlElement],
    ty: &NativeType,
    path: &str,
) -> Result<NativeValue, String> {
    match ty {
        NativeType::Array(array) if array.item_name.is_none() => elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                decode_element(element, &array.element, &format!("{}[{}]", path, index))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|items| NativeValue::List { items }),
        _ => match elements.first() {
            Some(element) => decode_element(element, ty, path),
            None => Ok(NativeValue::Null),
        },
    }
}

fn decode_element(element: &XmlElement, ty: &NativeType, path: &str) -> Result<NativeValue, String> {
    if element.attr_ns(XSI_NAMESPACE, "nil") == Some("true") {
        return Ok(NativeValue::Null);
    }

    match ty {
        NativeType::Scalar(scalar) | NativeType::Nullable(scalar) => {
            decode_scalar(element.text(), *scalar, path)
        }
        NativeType::Record(record) => {
            let mut value = RecordValue::new(record.name.as_str());
            for field in &record.fields {
                let field_path = format!("{}.{}", path, field.name);
                let field_value = match (field.attribute, field.ty.scalar()) {
                    (true, Some(scalar)) => match element.attr(&field.name) {
                        Some(text) => decode_scalar(text, scalar, &field_path)?,
                        None => NativeValue::Null,
                    },
                    (true, None) => NativeValue::Null,
                    (false, _) => decode_occurrences(
                        &children_named(element, &field.name),
                        &field.ty,
                        &field_path,
                    )?,
                };
                value.fields.insert(field.name.clone(), field_value);
            }
            Ok(value.into())
        }
        NativeType::Array(array) => {
            let items = match &array.item_name {
                Some(item_name) => children_named(element, item_name),
                None => vec![element],
            };
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    decode_element(item, &array.element, &format!("{}[{}]", path, index))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|items| NativeValue::List { items })
        }
        NativeType::Opaque(opaque) => Err(format!(
            "{} has type {} which cannot be read",
            path, opaque.name
        )),
    }
}

fn decode_scalar(text: &str, scalar: ScalarType, path: &str) -> Result<NativeValue, String> {
    let text_like = matches!(
        scalar,
        ScalarType::String | ScalarType::NormalizedString | ScalarType::Token | ScalarType::AnyUri
    );
    if text.trim().is_empty() && !text_like {
        return Ok(NativeValue::Null);
    }
    Value::from_lexical(scalar, text)
        .map(NativeValue::scalar)
        .map_err(|e| e.for_property(path).to_string())
}
