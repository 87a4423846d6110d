//! Namespace-aware XML element tree
//!
//! Description documents are small, and every later stage needs random access to them
//! (resolving references between messages, bindings and schema types), so the whole
//! document is read into an [`XmlElement`] tree. Each element keeps the namespace
//! bindings in scope at its position, which is what resolving QName-valued attributes
//! such as `type="tns:User"` requires.

use crate::error::{ParseError, ParseResult};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fmt;
use std::sync::Arc;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An expanded XML name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XmlName {
    pub namespace: String,
    pub local: String,
}

impl XmlName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// A name in no namespace
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }
}

impl fmt::Display for XmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// Prefix bindings in scope, innermost last
type Scope = Arc<Vec<(String, String)>>;

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: XmlName,
    pub attributes: Vec<(XmlName, String)>,
    pub children: Vec<XmlElement>,
    text: String,
    scope: Scope,
}

impl XmlElement {
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    /// Value of an unqualified attribute
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attr_ns("", local)
    }

    pub fn attr_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.is(namespace, local))
            .map(|(_, value)| value.as_str())
    }

    pub fn required_attr(&self, local: &str) -> ParseResult<&str> {
        self.attr(local).ok_or_else(|| ParseError::MissingAttribute {
            element: self.name.to_string(),
            attribute: local.to_string(),
        })
    }

    /// Character data directly inside this element
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn child(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.is(namespace, local))
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.is(namespace, local))
    }

    /// Namespace bound to a prefix at this element; the empty prefix is the default namespace
    pub fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.scope
            .iter()
            .rev()
            .find(|(bound, _)| bound == prefix)
            .map(|(_, namespace)| namespace.as_str())
    }

    /// Resolve a `prefix:local` value against the bindings in scope
    ///
    /// An unprefixed value takes the default namespace, or no namespace if none is declared.
    pub fn resolve_qname(&self, value: &str) -> ParseResult<XmlName> {
        let value = value.trim();
        match value.split_once(':') {
            Some((prefix, local)) => self
                .lookup_namespace(prefix)
                .map(|namespace| XmlName::new(namespace, local))
                .ok_or_else(|| ParseError::UnboundPrefix(prefix.to_string())),
            None => Ok(XmlName::new(
                self.lookup_namespace("").unwrap_or_default(),
                value,
            )),
        }
    }

    /// Resolve a QName-valued attribute, if present
    pub fn qname_attr(&self, local: &str) -> ParseResult<Option<XmlName>> {
        self.attr(local).map(|value| self.resolve_qname(value)).transpose()
    }
}

/// Parse a complete document into its root element
pub fn parse_document(bytes: &[u8]) -> ParseResult<XmlElement> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let source = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding(e.to_string()))?;
    let mut reader = Reader::from_str(source);

    let root_scope: Scope = Arc::new(Vec::new());
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    let xml_error = |reader: &Reader<&[u8]>, e: quick_xml::Error| ParseError::Xml {
        position: reader.buffer_position() as u64,
        message: e.to_string(),
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let scope = stack.last().map(|parent| &parent.scope).unwrap_or(&root_scope);
                let element = open_element(e, scope)?;
                stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let scope = stack.last().map(|parent| &parent.scope).unwrap_or(&root_scope);
                let element = open_element(e, scope)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|e| xml_error(&reader, e))?;
                if let Some(parent) = stack.last_mut() {
                    parent.text.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(&reader, e)),
        }
    }

    if let Some(unclosed) = stack.last() {
        return Err(ParseError::Xml {
            position: reader.buffer_position() as u64,
            message: format!("element {} is never closed", unclosed.name),
        });
    }
    root.ok_or(ParseError::Empty)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn open_element(start: &BytesStart<'_>, parent_scope: &Scope) -> ParseResult<XmlElement> {
    let qname = start.name();
    let raw_name = utf8(qname.as_ref())?;

    let mut declarations = Vec::new();
    let mut raw_attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ParseError::Xml {
            position: 0,
            message: format!("invalid attribute on {}: {}", raw_name, e),
        })?;
        let key = utf8(attribute.key.as_ref())?;
        let value = attribute
            .unescape_value()
            .map_err(|e| ParseError::Xml {
                position: 0,
                message: format!("invalid value of {} on {}: {}", key, raw_name, e),
            })?
            .into_owned();

        if key == "xmlns" {
            declarations.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((prefix.to_string(), value));
        } else {
            raw_attributes.push((key.to_string(), value));
        }
    }

    let scope = if declarations.is_empty() {
        Arc::clone(parent_scope)
    } else {
        let mut bindings = parent_scope.as_ref().clone();
        bindings.extend(declarations);
        Arc::new(bindings)
    };

    let mut element = XmlElement {
        name: XmlName::unqualified(""),
        attributes: Vec::with_capacity(raw_attributes.len()),
        children: Vec::new(),
        text: String::new(),
        scope,
    };

    element.name = element.resolve_qname(raw_name)?;
    for (key, value) in raw_attributes {
        // Unprefixed attributes are in no namespace, whatever the default namespace is
        let name = match key.split_once(':') {
            Some(_) => element.resolve_qname(&key)?,
            None => XmlName::unqualified(key),
        };
        element.attributes.push((name, value));
    }
    Ok(element)
}

fn utf8(bytes: &[u8]) -> ParseResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root xmlns="urn:default" xmlns:t="urn:types" t:flag="yes" plain="1">
  <t:item type="t:User">Ana &amp; Bo</t:item>
  <inner xmlns="urn:inner"><leaf type="Local"/></inner>
  <reset xmlns=""><bare/></reset>
  <![CDATA[<raw>]]>
</root>"#;

    #[test]
    fn test_names_resolve_against_scope() {
        let root = parse_document(DOC.as_bytes()).unwrap();
        assert!(root.is("urn:default", "root"));
        assert_eq!(root.attr("plain"), Some("1"));
        assert_eq!(root.attr_ns("urn:types", "flag"), Some("yes"));

        let item = root.child("urn:types", "item").unwrap();
        assert_eq!(item.text(), "Ana & Bo");
        assert_eq!(
            item.qname_attr("type").unwrap(),
            Some(XmlName::new("urn:types", "User"))
        );

        let leaf = &root.child("urn:inner", "inner").unwrap().children[0];
        assert!(leaf.is("urn:inner", "leaf"));
        assert_eq!(
            leaf.resolve_qname("Local").unwrap(),
            XmlName::new("urn:inner", "Local")
        );

        let bare = &root.child("", "reset").unwrap().children[0];
        assert!(bare.is("", "bare"));
    }

    #[test]
    fn test_cdata_is_text() {
        let root = parse_document(DOC.as_bytes()).unwrap();
        assert!(root.text().contains("<raw>"));
    }

    #[test]
    fn test_unbound_prefix() {
        let err = parse_document(b"<x:root/>").unwrap_err();
        assert_eq!(err, ParseError::UnboundPrefix("x".to_string()));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            parse_document(b"<a><b></a>"),
            Err(ParseError::Xml { .. })
        ));
        assert_eq!(parse_document(b"   ").unwrap_err(), ParseError::Empty);
        assert!(matches!(
            parse_document(b"<a>"),
            Err(ParseError::Xml { .. })
        ));
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(b"<root/>");
        assert!(parse_document(&bytes).unwrap().is("", "root"));
    }
}
