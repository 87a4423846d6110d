//! Invocation engine
//!
//! Runs a schema method against the module its schema object was built from: input property
//! values become native arguments, and the native result is normalized into rows keyed by the
//! method's output properties.

use crate::error::{BridgeError, BridgeResult};
use crate::schema::{DYNAMIC_URL_PROPERTY, request_object};
use dws_core::{
    MethodKind, NativeType, NativeValue, OperationDescriptor, PrimitiveKind, PropertyValues,
    RecordValue, ResultRow, SchemaMethod, SchemaObject, ScalarType, Value, ValueConversionError,
};
use dws_proxy::{CallContext, CompiledModule, ProxyCache, ProxyError};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

pub struct InvocationEngine {
    cache: Arc<ProxyCache>,
}

impl InvocationEngine {
    pub fn new(cache: Arc<ProxyCache>) -> Self {
        Self { cache }
    }

    /// Invoke a method of a schema object
    ///
    /// The module is resolved from the cache and never recompiled. A module whose schema
    /// hash differs from the one recorded in the schema object is treated as missing.
    pub async fn invoke(
        &self,
        schema: &SchemaObject,
        method_name: &str,
        values: &PropertyValues,
        mut context: CallContext,
    ) -> BridgeResult<Vec<ResultRow>> {
        let method = schema
            .method(method_name)
            .ok_or_else(|| BridgeError::UnknownMethod {
                object: schema.name.clone(),
                method: method_name.to_string(),
            })?;

        let module = self.cache.resolve(&schema.source.location).await?;
        if module.schema_hash() != schema.source.schema_hash {
            return Err(ProxyError::Resolution {
                location: schema.source.location.clone(),
                reason: format!(
                    "module {} no longer matches the schema of {}",
                    module.name(),
                    schema.name
                ),
            }
            .into());
        }
        let operation = operation_for(&module, method)?;

        if let Some(endpoint) = dynamic_endpoint(method, values)? {
            debug!(method = %method.name, %endpoint, "Endpoint overridden for this call");
            context = context.with_endpoint(endpoint);
        }

        let arguments = build_arguments(schema, operation, values)?;
        let result = module.invoke(&operation.name, arguments, &context).await?;
        let rows = normalize(schema, method, operation, result)?;

        info!(
            object = %schema.name,
            method = %method.name,
            rows = rows.len(),
            "Method executed"
        );
        Ok(rows)
    }
}

fn operation_for<'m>(
    module: &'m CompiledModule,
    method: &SchemaMethod,
) -> BridgeResult<&'m OperationDescriptor> {
    let operation = module
        .operation(&method.name)
        .ok_or_else(|| BridgeError::InconsistentSchema {
            method: method.name.clone(),
            reason: format!("module {} has no such operation", module.name()),
        })?;

    let expected = crate::schema::method_kind(operation.returns.as_ref());
    if expected != method.kind {
        return Err(BridgeError::InconsistentSchema {
            method: method.name.clone(),
            reason: format!("declared as {} but the operation is {}", method.kind, expected),
        });
    }
    Ok(operation)
}

fn dynamic_endpoint(method: &SchemaMethod, values: &PropertyValues) -> BridgeResult<Option<Url>> {
    if !method.inputs.iter().any(|input| input == DYNAMIC_URL_PROPERTY) {
        return Ok(None);
    }
    let text = match values.get(DYNAMIC_URL_PROPERTY) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::Text(text)) => text.trim(),
        Some(other) => {
            return Err(ValueConversionError::new(
                DYNAMIC_URL_PROPERTY,
                "url",
                format!("'{}' is not text", other),
            )
            .into());
        }
    };
    Url::parse(text)
        .map(Some)
        .map_err(|e| ValueConversionError::new(DYNAMIC_URL_PROPERTY, "url", e.to_string()).into())
}

/// Native arguments in declaration order
fn build_arguments(
    schema: &SchemaObject,
    operation: &OperationDescriptor,
    values: &PropertyValues,
) -> BridgeResult<Vec<NativeValue>> {
    let request = match operation.parameters.as_slice() {
        [parameter] => request_object(&parameter.ty),
        _ => None,
    };
    if let Some(record) = request {
        let mut argument = RecordValue::new(record.name.as_str());
        for field in &record.fields {
            let value = native_argument(schema, operation, &field.name, &field.ty, values)?;
            argument.fields.insert(field.name.clone(), value);
        }
        return Ok(vec![argument.into()]);
    }

    operation
        .parameters
        .iter()
        .map(|parameter| native_argument(schema, operation, &parameter.name, &parameter.ty, values))
        .collect()
}

fn native_argument(
    schema: &SchemaObject,
    operation: &OperationDescriptor,
    property: &str,
    ty: &NativeType,
    values: &PropertyValues,
) -> BridgeResult<NativeValue> {
    let scalar = ty.scalar().ok_or_else(|| BridgeError::InconsistentSchema {
        method: operation.name.clone(),
        reason: format!("input {} has type {}", property, ty.type_name()),
    })?;
    let kind = declared_kind(schema, operation, property, scalar)?;

    let value = match values.get(property) {
        None => return Ok(NativeValue::Null),
        Some(value) => value.clone(),
    };
    let value = value
        .coerce(kind)
        .and_then(|value| value.to_native(scalar))
        .map_err(|e| e.for_property(property))?;
    Ok(NativeValue::scalar(value))
}

fn declared_kind(
    schema: &SchemaObject,
    operation: &OperationDescriptor,
    property: &str,
    scalar: ScalarType,
) -> BridgeResult<PrimitiveKind> {
    match schema.property(property) {
        Some(declared) => Ok(declared.kind),
        None => Err(BridgeError::InconsistentSchema {
            method: operation.name.clone(),
            reason: format!("no property {} of type {}", property, scalar.name()),
        }),
    }
}

/// Rows of a native result
///
/// Either every row is produced or the call fails; null elements of a collection are
/// skipped.
fn normalize(
    schema: &SchemaObject,
    method: &SchemaMethod,
    operation: &OperationDescriptor,
    result: NativeValue,
) -> BridgeResult<Vec<ResultRow>> {
    let returns = match (method.kind, operation.returns.as_ref(), &result) {
        (MethodKind::Execute, _, _) | (_, None, _) | (_, _, NativeValue::Null) => {
            return Ok(Vec::new());
        }
        (_, Some(returns), _) => returns,
    };
    let shape_error = |reason: String| BridgeError::ResultShape {
        method: method.name.clone(),
        reason,
    };

    match method.kind {
        MethodKind::Read => Ok(vec![row_of(schema, method, returns, &result, &shape_error)?]),
        MethodKind::List => {
            let element = returns
                .as_array()
                .map(|array| array.element.as_ref())
                .ok_or_else(|| shape_error(format!("{} is not a collection", returns)))?;
            let items = result
                .as_list()
                .ok_or_else(|| shape_error(format!("expected a list, got a {}", result.shape())))?;
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| row_of(schema, method, element, item, &shape_error))
                .collect()
        }
        MethodKind::Execute => Ok(Vec::new()),
    }
}

fn row_of(
    schema: &SchemaObject,
    method: &SchemaMethod,
    ty: &NativeType,
    value: &NativeValue,
    shape_error: &dyn Fn(String) -> BridgeError,
) -> BridgeResult<ResultRow> {
    let mut row = ResultRow::new();

    if ty.scalar().is_some() {
        let [output] = method.outputs.as_slice() else {
            return Err(shape_error(format!(
                "a scalar result needs one output property, found {}",
                method.outputs.len()
            )));
        };
        let scalar = value
            .as_scalar()
            .ok_or_else(|| shape_error(format!("expected a scalar, got a {}", value.shape())))?;
        row.insert(output.as_str(), output_value(schema, output, scalar.clone())?);
        return Ok(row);
    }

    let record = value
        .as_record()
        .ok_or_else(|| shape_error(format!("expected a record, got a {}", value.shape())))?;
    for output in &method.outputs {
        let field = match record.fields.get(output.as_str()) {
            None => {
                debug!(
                    method = %method.name,
                    record = %record.type_name,
                    property = %output,
                    "Result record has no field for output property, reading null"
                );
                Value::Null
            }
            Some(NativeValue::Null) => Value::Null,
            Some(NativeValue::Scalar { value }) => value.clone(),
            Some(other) => {
                return Err(shape_error(format!(
                    "field {} of {} is a {}",
                    output,
                    record.type_name,
                    other.shape()
                )));
            }
        };
        row.insert(output.as_str(), output_value(schema, output, field)?);
    }
    Ok(row)
}

fn output_value(schema: &SchemaObject, output: &str, value: Value) -> BridgeResult<Value> {
    match schema.property(output) {
        Some(property) => Ok(value
            .coerce(property.kind)
            .map_err(|e| e.for_property(output))?),
        None => Ok(value),
    }
}
