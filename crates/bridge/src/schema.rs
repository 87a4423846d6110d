//! Schema discovery
//!
//! Flattens the operations of a compiled module into one [`SchemaObject`]: a method per
//! supported operation, every parameter and result field surfacing as a scalar property.

use crate::error::{BridgeError, BridgeResult};
use dws_core::{
    MethodKind, NativeType, ObjectMetadata, OperationDescriptor, PrimitiveKind, RecordType,
    SchemaMethod, SchemaObject, SchemaProperty, SchemaSource, ServiceLocation, TypeOrigin,
    is_simple_mappable, to_schema_primitive,
};
use dws_proxy::{CompiledModule, ProxyCache};
use std::sync::Arc;
use tracing::{info, warn};

/// Reserved input property redirecting a call to another endpoint
pub const DYNAMIC_URL_PROPERTY: &str = "_DynamicWebServiceUrl";

const OBJECT_DESCRIPTION: &str =
    "Provides the capabilities required to interface with a web service.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Leave out operations that cannot be flattened instead of failing
    pub skip_unsupported: bool,
    /// Add the reserved endpoint override input to every method
    pub dynamic_url: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            skip_unsupported: true,
            dynamic_url: false,
        }
    }
}

pub struct SchemaBuilder {
    cache: Arc<ProxyCache>,
}

impl SchemaBuilder {
    pub fn new(cache: Arc<ProxyCache>) -> Self {
        Self { cache }
    }

    /// Compile the location afresh and flatten its module
    pub async fn build_schema(
        &self,
        location: &ServiceLocation,
        options: SchemaOptions,
    ) -> BridgeResult<SchemaObject> {
        self.cache.invalidate(location);
        let module = self.cache.get_or_compile(location).await?;
        let object = build_from_module(&module, options)?;
        info!(
            %location,
            module = %module.name(),
            methods = object.methods().len(),
            "Schema described"
        );
        Ok(object)
    }
}

/// Flatten the operations of a module, in declaration order
pub fn build_from_module(
    module: &CompiledModule,
    options: SchemaOptions,
) -> BridgeResult<SchemaObject> {
    let mut object = SchemaObject::new(
        module.service_name(),
        ObjectMetadata {
            display_name: format!("Dynamic Web Service: {}", module.location()),
            description: OBJECT_DESCRIPTION.to_string(),
        },
        SchemaSource {
            location: module.location().clone(),
            module_name: module.name().to_string(),
            schema_hash: module.schema_hash().to_string(),
        },
    );

    for operation in module.operations() {
        let (mut method, properties) = match flatten_operation(operation) {
            Ok(flattened) => flattened,
            Err(BridgeError::UnsupportedOperationShape { operation, reason })
                if options.skip_unsupported =>
            {
                warn!(%operation, %reason, "Skipping unsupported operation");
                continue;
            }
            Err(e) => return Err(e),
        };

        for property in properties {
            object.add_property(property)?;
        }
        if options.dynamic_url {
            object.add_property(SchemaProperty::new(DYNAMIC_URL_PROPERTY, PrimitiveKind::String))?;
            method.inputs.push(DYNAMIC_URL_PROPERTY.to_string());
        }
        object.add_method(method);
    }

    Ok(object)
}

/// Method kind of a return type
pub fn method_kind(returns: Option<&NativeType>) -> MethodKind {
    match returns {
        None => MethodKind::Execute,
        Some(NativeType::Array(_)) => MethodKind::List,
        Some(_) => MethodKind::Read,
    }
}

/// A record type declared by the service itself
pub(crate) fn request_object(ty: &NativeType) -> Option<&RecordType> {
    ty.as_record()
        .filter(|record| record.origin == TypeOrigin::Module)
}

fn flatten_operation(
    operation: &OperationDescriptor,
) -> BridgeResult<(SchemaMethod, Vec<SchemaProperty>)> {
    let kind = method_kind(operation.returns.as_ref());
    let description = operation
        .documentation
        .clone()
        .unwrap_or_else(|| format!("Webservice method {}", operation.name));
    let mut method = SchemaMethod::new(operation.name.as_str(), kind, description);

    let inputs = input_properties(operation)?;
    let outputs = output_properties(operation, kind)?;
    method.inputs = inputs.iter().map(|property| property.name.clone()).collect();
    method.outputs = outputs.iter().map(|property| property.name.clone()).collect();

    Ok((method, inputs.into_iter().chain(outputs).collect()))
}

fn input_properties(operation: &OperationDescriptor) -> BridgeResult<Vec<SchemaProperty>> {
    let parameters = &operation.parameters;
    let has_request_object = parameters
        .iter()
        .any(|parameter| request_object(&parameter.ty).is_some());

    if has_request_object {
        let [parameter] = parameters.as_slice() else {
            return Err(BridgeError::unsupported(
                &operation.name,
                "a request object must be the only parameter",
            ));
        };
        let Some(record) = request_object(&parameter.ty) else {
            return Err(BridgeError::unsupported(&operation.name, "unexpected parameter shape"));
        };
        return record_properties(record).map_err(|field| {
            BridgeError::unsupported(
                &operation.name,
                format!(
                    "property {} of request object {} is not a scalar",
                    field, record.name
                ),
            )
        });
    }

    parameters
        .iter()
        .map(|parameter| {
            if parameter.ty.is_array() {
                return Err(BridgeError::unsupported(
                    &operation.name,
                    format!("parameter {} is a collection", parameter.name),
                ));
            }
            match to_schema_primitive(&parameter.ty) {
                Ok(kind) => Ok(SchemaProperty::new(parameter.name.as_str(), kind)),
                Err(e) => Err(BridgeError::unsupported(
                    &operation.name,
                    format!("parameter {}: {}", parameter.name, e),
                )),
            }
        })
        .collect()
}

fn output_properties(
    operation: &OperationDescriptor,
    kind: MethodKind,
) -> BridgeResult<Vec<SchemaProperty>> {
    let Some(returns) = operation.returns.as_ref() else {
        return Ok(Vec::new());
    };
    if kind == MethodKind::Execute {
        return Ok(Vec::new());
    }

    if let Some(property) = scalar_property(returns) {
        return Ok(vec![property]);
    }

    match returns {
        NativeType::Array(array) => {
            if kind != MethodKind::List {
                return Err(BridgeError::InconsistentSchema {
                    method: operation.name.clone(),
                    reason: format!("{} returns a collection", kind),
                });
            }
            if let Some(property) = scalar_property(&array.element) {
                return Ok(vec![property]);
            }
            match request_object(&array.element) {
                Some(record) => record_properties(record).map_err(|field| {
                    BridgeError::unsupported(
                        &operation.name,
                        format!(
                            "collection element {} has a property {} that is not a scalar",
                            record.name, field
                        ),
                    )
                }),
                None => Err(BridgeError::unsupported(
                    &operation.name,
                    format!("returns a collection of {}", array.element.type_name()),
                )),
            }
        }
        NativeType::Record(record) if record.origin == TypeOrigin::Module => {
            record_properties(record).map_err(|field| {
                BridgeError::unsupported(
                    &operation.name,
                    format!(
                        "return type {} has a property {} that is not a scalar",
                        record.name, field
                    ),
                )
            })
        }
        other => Err(BridgeError::unsupported(
            &operation.name,
            format!("return type {} is not supported", other.type_name()),
        )),
    }
}

/// A scalar result surfaces as one property named after its type
fn scalar_property(ty: &NativeType) -> Option<SchemaProperty> {
    let scalar = ty.scalar()?;
    Some(SchemaProperty::new(scalar.name(), scalar.primitive()))
}

/// One property per record field; the first non-scalar field name on failure
fn record_properties(record: &RecordType) -> Result<Vec<SchemaProperty>, String> {
    record
        .fields
        .iter()
        .map(|field| {
            if !is_simple_mappable(&field.ty) {
                return Err(field.name.clone());
            }
            to_schema_primitive(&field.ty)
                .map(|kind| SchemaProperty::new(field.name.as_str(), kind))
                .map_err(|_| field.name.clone())
        })
        .collect()
}
