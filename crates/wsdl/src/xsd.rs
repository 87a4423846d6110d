//! XML Schema type resolution
//!
//! A [`SchemaSet`] holds every schema document of a description, inline or fetched. The
//! [`TypeResolver`] lowers named types and global elements into the native type model,
//! tagging every type defined by these schemas as [`TypeOrigin::Module`].
//!
//! Lowering rules:
//!
//! * `maxOccurs > 1` makes an array; a complex type whose only particle is one repeated
//!   element becomes an array named after that element (`ArrayOfUser` holding `User`)
//! * nillable scalar elements become nullable scalars
//! * `complexContent/extension` yields the base fields followed by the type's own
//! * attributes become record fields
//! * simple type restrictions collapse to their base type, unions to `string`, lists are opaque
//! * `choice`, `any`, `group`, `simpleContent` and recursive references make the enclosing
//!   type opaque

use crate::error::{ParseError, ParseResult, UnresolvedReference};
use crate::wsdl::XSD_NAMESPACE;
use crate::xml::{XmlElement, XmlName};
use dws_core::{Field, NativeType, RecordType, ScalarType, TypeOrigin};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const SOAP_ENCODING_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// One schema document
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub target_namespace: String,
    /// `elementFormDefault="qualified"`
    pub qualified: bool,
    root: XmlElement,
}

/// A schema document referenced by `schemaLocation`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSchema {
    pub location: String,
    /// Namespace an included schema without its own target namespace takes on
    pub include_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSet {
    schemas: Vec<Schema>,
}

impl SchemaSet {
    /// Add an `xsd:schema` document, returning its index
    pub fn add(&mut self, root: XmlElement, include_namespace: Option<&str>) -> ParseResult<usize> {
        if !root.is(XSD_NAMESPACE, "schema") {
            return Err(ParseError::UnexpectedRoot {
                expected: "XML Schema".to_string(),
                found: root.name.to_string(),
            });
        }

        let target_namespace = root
            .attr("targetNamespace")
            .or(include_namespace)
            .unwrap_or_default()
            .to_string();
        let qualified = root.attr("elementFormDefault") == Some("qualified");
        self.schemas.push(Schema {
            target_namespace,
            qualified,
            root,
        });
        Ok(self.schemas.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Imports and includes of one schema that name a document to fetch
    pub fn external_references(&self, index: usize) -> Vec<ExternalSchema> {
        let Some(schema) = self.schemas.get(index) else {
            return Vec::new();
        };

        schema
            .root
            .children
            .iter()
            .filter(|child| child.name.namespace == XSD_NAMESPACE)
            .filter_map(|child| {
                let location = child.attr("schemaLocation")?.to_string();
                match child.name.local.as_str() {
                    "import" => Some(ExternalSchema {
                        location,
                        include_namespace: None,
                    }),
                    "include" | "redefine" => Some(ExternalSchema {
                        location,
                        include_namespace: Some(schema.target_namespace.clone()),
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    fn global<'s>(
        &'s self,
        kind: &'s str,
        name: &XmlName,
    ) -> Option<(&'s Schema, &'s XmlElement)> {
        self.schemas
            .iter()
            .filter(|schema| schema.target_namespace == name.namespace)
            .find_map(move |schema| {
                schema
                    .root
                    .children_named(XSD_NAMESPACE, kind)
                    .find(|declaration| declaration.attr("name") == Some(name.local.as_str()))
                    .map(|declaration| (schema, declaration))
            })
    }
}

/// A global element declaration lowered to its type
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    pub name: XmlName,
    pub ty: NativeType,
}

/// The child elements of a wrapper element, as declared
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperContent {
    /// Namespace of the schema declaring the children
    pub namespace: String,
    pub qualified: bool,
    pub fields: Vec<Field>,
}

/// Lowers schema declarations into native types, memoizing named types
pub struct TypeResolver<'a> {
    schemas: &'a SchemaSet,
    types: HashMap<XmlName, NativeType>,
    resolving_types: HashSet<XmlName>,
    resolving_elements: HashSet<XmlName>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(schemas: &'a SchemaSet) -> Self {
        Self {
            schemas,
            types: HashMap::new(),
            resolving_types: HashSet::new(),
            resolving_elements: HashSet::new(),
        }
    }

    pub fn resolve_type(&mut self, name: &XmlName) -> Result<NativeType, UnresolvedReference> {
        if let Some(scalar) = ScalarType::from_qualified(&name.namespace, &name.local) {
            return Ok(NativeType::Scalar(scalar));
        }
        if name.namespace == XSD_NAMESPACE {
            return Ok(NativeType::opaque(name.local.clone(), TypeOrigin::Builtin));
        }
        if let Some(ty) = self.types.get(name) {
            return Ok(ty.clone());
        }
        if self.resolving_types.contains(name) {
            debug!(type_name = %name, "Recursive type reference");
            return Ok(NativeType::opaque(name.local.clone(), TypeOrigin::Module));
        }

        let schemas = self.schemas;
        let declaration = schemas
            .global("complexType", name)
            .map(|found| (true, found))
            .or_else(|| schemas.global("simpleType", name).map(|found| (false, found)));

        let Some((complex, (schema, declaration))) = declaration else {
            if is_runtime_namespace(&name.namespace) {
                return Ok(NativeType::opaque(name.local.clone(), TypeOrigin::Builtin));
            }
            return Err(UnresolvedReference {
                kind: "type",
                name: name.clone(),
            });
        };

        self.resolving_types.insert(name.clone());
        let resolved = if complex {
            self.complex_type(schema, declaration, &name.local)
        } else {
            self.simple_type(declaration, &name.local)
        };
        self.resolving_types.remove(name);

        let ty = resolved?;
        self.types.insert(name.clone(), ty.clone());
        Ok(ty)
    }

    pub fn resolve_element(&mut self, name: &XmlName) -> Result<ElementDecl, UnresolvedReference> {
        let schemas = self.schemas;
        let (schema, declaration) =
            schemas
                .global("element", name)
                .ok_or_else(|| UnresolvedReference {
                    kind: "element",
                    name: name.clone(),
                })?;

        if !self.resolving_elements.insert(name.clone()) {
            return Ok(ElementDecl {
                name: name.clone(),
                ty: NativeType::opaque(name.local.clone(), TypeOrigin::Module),
            });
        }
        let resolved = self.element_type(schema, declaration, &name.local);
        self.resolving_elements.remove(name);

        Ok(ElementDecl {
            name: name.clone(),
            ty: resolved?,
        })
    }

    /// Child elements of a global element whose type is a plain sequence
    ///
    /// Returns `None` when the element's type is a scalar or has anything besides child
    /// elements, so it cannot act as a document/literal wrapper.
    pub fn wrapper_content(
        &mut self,
        name: &XmlName,
    ) -> Result<Option<WrapperContent>, UnresolvedReference> {
        let schemas = self.schemas;
        let (element_schema, declaration) =
            schemas
                .global("element", name)
                .ok_or_else(|| UnresolvedReference {
                    kind: "element",
                    name: name.clone(),
                })?;

        let (schema, complex) = if let Some(inline) = declaration.child(XSD_NAMESPACE, "complexType")
        {
            (element_schema, inline)
        } else if let Some(type_name) = declaration.attr("type") {
            let type_name = qualified(declaration, type_name, "type")?;
            match schemas.global("complexType", &type_name) {
                Some(found) => found,
                None => return Ok(None),
            }
        } else {
            return Ok(None);
        };

        let has_other_content = complex.children.iter().any(|child| {
            child.name.namespace == XSD_NAMESPACE
                && matches!(
                    child.name.local.as_str(),
                    "complexContent" | "simpleContent" | "attribute" | "attributeGroup"
                )
        });
        if has_other_content {
            return Ok(None);
        }

        let mut fields = Vec::new();
        if !self.particle(schema, complex, &mut fields)? {
            return Ok(None);
        }
        Ok(Some(WrapperContent {
            namespace: schema.target_namespace.clone(),
            qualified: schema.qualified,
            fields,
        }))
    }

    fn element_type(
        &mut self,
        schema: &Schema,
        declaration: &XmlElement,
        name: &str,
    ) -> Result<NativeType, UnresolvedReference> {
        let ty = if let Some(type_name) = declaration.attr("type") {
            let type_name = qualified(declaration, type_name, "type")?;
            self.resolve_type(&type_name)?
        } else if let Some(inline) = declaration.child(XSD_NAMESPACE, "complexType") {
            self.complex_type(schema, inline, name)?
        } else if let Some(inline) = declaration.child(XSD_NAMESPACE, "simpleType") {
            self.simple_type(inline, name)?
        } else {
            NativeType::opaque("anyType", TypeOrigin::Builtin)
        };

        Ok(match ty {
            NativeType::Scalar(scalar) if declaration.attr("nillable") == Some("true") => {
                NativeType::Nullable(scalar)
            }
            ty => ty,
        })
    }

    fn complex_type(
        &mut self,
        schema: &Schema,
        declaration: &XmlElement,
        name: &str,
    ) -> Result<NativeType, UnresolvedReference> {
        let opaque = || NativeType::opaque(name, TypeOrigin::Module);
        if declaration.child(XSD_NAMESPACE, "simpleContent").is_some()
            || declaration.attr("mixed") == Some("true")
        {
            return Ok(opaque());
        }

        let mut fields = Vec::new();
        let mut derived = false;
        let body = match declaration.child(XSD_NAMESPACE, "complexContent") {
            Some(content) => {
                derived = true;
                if let Some(extension) = content.child(XSD_NAMESPACE, "extension") {
                    if let Some(base) = extension.attr("base") {
                        let base = qualified(extension, base, "type")?;
                        match self.resolve_type(&base)? {
                            NativeType::Record(record) => fields.extend(record.fields.iter().cloned()),
                            NativeType::Opaque(base) if base.origin == TypeOrigin::Builtin => {}
                            _ => return Ok(opaque()),
                        }
                    }
                    extension
                } else if let Some(restriction) = content.child(XSD_NAMESPACE, "restriction") {
                    let base = restriction.attr("base").map(|base| qualified(restriction, base, "type"));
                    if let Some(base) = base.transpose()? {
                        if base.namespace == SOAP_ENCODING_NAMESPACE {
                            return Ok(opaque());
                        }
                    }
                    restriction
                } else {
                    return Ok(opaque());
                }
            }
            None => declaration,
        };

        if !self.particle(schema, body, &mut fields)? {
            return Ok(opaque());
        }
        let element_fields = fields.len();
        self.attributes(body, &mut fields)?;

        if !derived && element_fields == 1 && fields.len() == 1 {
            if let NativeType::Array(array) = &fields[0].ty {
                if array.item_name.is_none() {
                    return Ok(NativeType::array(
                        array.element.as_ref().clone(),
                        Some(fields[0].name.clone()),
                    ));
                }
            }
        }

        Ok(NativeType::record(RecordType {
            name: name.to_string(),
            namespace: schema.target_namespace.clone(),
            origin: TypeOrigin::Module,
            qualified: schema.qualified,
            fields,
        }))
    }

    fn simple_type(
        &mut self,
        declaration: &XmlElement,
        name: &str,
    ) -> Result<NativeType, UnresolvedReference> {
        if let Some(restriction) = declaration.child(XSD_NAMESPACE, "restriction") {
            if let Some(base) = restriction.attr("base") {
                let base = qualified(restriction, base, "type")?;
                return self.resolve_type(&base);
            }
            if let Some(inline) = restriction.child(XSD_NAMESPACE, "simpleType") {
                return self.simple_type(inline, name);
            }
        }
        if declaration.child(XSD_NAMESPACE, "union").is_some() {
            return Ok(NativeType::Scalar(ScalarType::String));
        }
        Ok(NativeType::opaque(name, TypeOrigin::Module))
    }

    /// Collect the element particles of a content model
    ///
    /// Returns `false` when the model has a construct a record cannot express.
    fn particle(
        &mut self,
        schema: &Schema,
        container: &XmlElement,
        fields: &mut Vec<Field>,
    ) -> Result<bool, UnresolvedReference> {
        for child in &container.children {
            if child.name.namespace != XSD_NAMESPACE {
                continue;
            }
            match child.name.local.as_str() {
                "element" => fields.push(self.element_field(schema, child)?),
                "sequence" | "all" => {
                    if is_repeated(child) || !self.particle(schema, child, fields)? {
                        return Ok(false);
                    }
                }
                "choice" | "any" | "group" => return Ok(false),
                _ => {}
            }
        }
        Ok(true)
    }

    fn element_field(
        &mut self,
        schema: &Schema,
        particle: &XmlElement,
    ) -> Result<Field, UnresolvedReference> {
        let (name, ty) = match particle.attr("ref") {
            Some(reference) => {
                let reference = qualified(particle, reference, "element")?;
                let declaration = self.resolve_element(&reference)?;
                (reference.local, declaration.ty)
            }
            None => {
                let name = particle.attr("name").unwrap_or_default().to_string();
                let ty = self.element_type(schema, particle, &name)?;
                (name, ty)
            }
        };

        Ok(Field {
            name,
            ty: if is_repeated(particle) {
                NativeType::array(ty, None)
            } else {
                ty
            },
            attribute: false,
        })
    }

    fn attributes(
        &mut self,
        container: &XmlElement,
        fields: &mut Vec<Field>,
    ) -> Result<(), UnresolvedReference> {
        for attribute in container.children_named(XSD_NAMESPACE, "attribute") {
            let Some(name) = attribute.attr("name") else {
                debug!("Skipping attribute reference");
                continue;
            };
            if attribute.attr("use") == Some("prohibited") {
                continue;
            }

            let ty = if let Some(type_name) = attribute.attr("type") {
                let type_name = qualified(attribute, type_name, "type")?;
                self.resolve_type(&type_name)?
            } else if let Some(inline) = attribute.child(XSD_NAMESPACE, "simpleType") {
                self.simple_type(inline, name)?
            } else {
                NativeType::Scalar(ScalarType::String)
            };
            fields.push(Field {
                name: name.to_string(),
                ty,
                attribute: true,
            });
        }
        Ok(())
    }
}

fn qualified(
    element: &XmlElement,
    value: &str,
    kind: &'static str,
) -> Result<XmlName, UnresolvedReference> {
    element
        .resolve_qname(value)
        .map_err(|_| UnresolvedReference {
            kind,
            name: XmlName::unqualified(value),
        })
}

fn is_repeated(particle: &XmlElement) -> bool {
    match particle.attr("maxOccurs") {
        Some("unbounded") => true,
        Some(count) => count.trim().parse::<u64>().map(|n| n > 1).unwrap_or(false),
        None => false,
    }
}

/// Namespaces of SOAP runtime types that are never declared by the service itself
fn is_runtime_namespace(namespace: &str) -> bool {
    namespace == SOAP_ENCODING_NAMESPACE || namespace == ScalarType::MS_TYPES_NAMESPACE
}
