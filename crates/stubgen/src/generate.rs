use crate::error::{StubError, StubResult};
use crate::ident::{rust_ident, unique_ident};
use convert_case::Case;
use dws_core::{NativeType, OperationDescriptor, PrimitiveKind, RecordType, ScalarType, TypeOrigin};
use dws_proxy::CompiledModule;
use indexmap::IndexMap;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use std::collections::HashSet;
use tracing::{info, warn};

/// Methods every generated client already has
const CLIENT_METHODS: [&str; 3] = ["new", "module", "with_context"];

/// What a stub is generated from
#[derive(Debug, Clone)]
pub struct StubSource {
    pub service_name: String,
    pub location: String,
    pub schema_hash: String,
    pub operations: Vec<OperationDescriptor>,
}

impl StubSource {
    pub fn from_module(module: &CompiledModule) -> Self {
        Self {
            service_name: module.service_name().to_string(),
            location: module.location().to_string(),
            schema_hash: module.schema_hash().to_string(),
            operations: module.operations().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOperation {
    pub operation: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct GeneratedStub {
    /// Rust source of the client module
    pub code: String,
    /// Name of the generated client type
    pub client: String,
    pub skipped: Vec<SkippedOperation>,
}

enum ParamShape<'a> {
    Scalar { scalar: ScalarType, nullable: bool },
    Record(&'a RecordType),
}

enum ResultShape<'a> {
    Void,
    Scalar(ScalarType),
    Record(&'a RecordType),
    ScalarList(ScalarType),
    RecordList(&'a RecordType),
}

/// Generates a typed client for the operations of one module
///
/// The client checks the schema hash of the module it is handed, so a stub can only drive
/// the service shape it was generated from.
#[derive(Default)]
pub struct StubGenerator {
    records: IndexMap<String, TokenStream>,
    methods: Vec<TokenStream>,
    method_names: HashSet<String>,
    skipped: Vec<SkippedOperation>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn generate(mut self, source: &StubSource) -> StubResult<GeneratedStub> {
        self.method_names = CLIENT_METHODS.iter().map(|name| name.to_string()).collect();

        for operation in &source.operations {
            match self.shapes(operation) {
                Ok((params, result)) => {
                    let method = self.generate_method(operation, params, result);
                    self.methods.push(method);
                }
                Err(reason) => {
                    warn!(operation = %operation.name, %reason, "No stub method for operation");
                    self.skipped.push(SkippedOperation {
                        operation: operation.name.clone(),
                        reason,
                    });
                }
            }
        }

        if self.methods.is_empty() {
            return Err(StubError::Empty {
                service: source.service_name.clone(),
            });
        }

        let client = format_ident!("{}Client", rust_ident(&source.service_name, Case::Pascal));
        let tokens = self.generate_module(source, &client);
        syn::parse2::<syn::File>(tokens.clone()).map_err(|source_error| StubError::Syntax {
            service: source.service_name.clone(),
            source: source_error,
        })?;

        info!(
            service = %source.service_name,
            methods = self.methods.len(),
            skipped = self.skipped.len(),
            "Client stub generated"
        );
        Ok(GeneratedStub {
            code: format!(
                "// Client for {} generated by `dws stubgen`. Do not edit.\n{}\n",
                source.location, tokens
            ),
            client: client.to_string(),
            skipped: self.skipped,
        })
    }

    fn shapes<'a>(
        &self,
        operation: &'a OperationDescriptor,
    ) -> Result<(Vec<(&'a str, ParamShape<'a>)>, ResultShape<'a>), String> {
        let mut params = Vec::with_capacity(operation.parameters.len());
        for parameter in &operation.parameters {
            let shape = match &parameter.ty {
                NativeType::Scalar(scalar) => ParamShape::Scalar {
                    scalar: *scalar,
                    nullable: false,
                },
                NativeType::Nullable(scalar) => ParamShape::Scalar {
                    scalar: *scalar,
                    nullable: true,
                },
                NativeType::Record(record) => ParamShape::Record(flat_record(record)?),
                other => {
                    return Err(format!(
                        "parameter {} has type {}",
                        parameter.name,
                        other.type_name()
                    ));
                }
            };
            params.push((parameter.name.as_str(), shape));
        }

        let result = match operation.returns.as_ref() {
            None => ResultShape::Void,
            Some(returns) => match returns {
                NativeType::Scalar(scalar) | NativeType::Nullable(scalar) => {
                    ResultShape::Scalar(*scalar)
                }
                NativeType::Record(record) => ResultShape::Record(flat_record(record)?),
                NativeType::Array(array) => match array.element.as_ref() {
                    NativeType::Scalar(scalar) | NativeType::Nullable(scalar) => {
                        ResultShape::ScalarList(*scalar)
                    }
                    NativeType::Record(record) => {
                        ResultShape::RecordList(flat_record(record)?)
                    }
                    other => return Err(format!("returns a collection of {}", other.type_name())),
                },
                NativeType::Opaque(opaque) => return Err(format!("returns {}", opaque.name)),
            },
        };
        Ok((params, result))
    }

    fn register(&mut self, record: &RecordType) {
        if !self.records.contains_key(&record.name) {
            self.records
                .insert(record.name.clone(), generate_record(record));
        }
    }

    fn generate_method(
        &mut self,
        operation: &OperationDescriptor,
        params: Vec<(&str, ParamShape<'_>)>,
        result: ResultShape<'_>,
    ) -> TokenStream {
        let method_name = unique_ident(&operation.name, Case::Snake, &mut self.method_names);
        let name = operation.name.as_str();
        let doc = match &operation.documentation {
            Some(documentation) => format!(" {}", documentation),
            None => format!(" Calls `{}`", operation.signature()),
        };

        let mut param_names = HashSet::new();
        let mut args = Vec::new();
        let mut arguments = Vec::new();
        for (param, shape) in params {
            let ident = unique_ident(param, Case::Snake, &mut param_names);
            match shape {
                ParamShape::Scalar { scalar, nullable } => {
                    let (ty, variant) = scalar_tokens(scalar);
                    if nullable {
                        args.push(quote!(#ident: Option<#ty>));
                        arguments.push(quote! {
                            match #ident {
                                Some(value) => dws_core::NativeValue::scalar(dws_core::Value::#variant(value)),
                                None => dws_core::NativeValue::Null,
                            }
                        });
                    } else {
                        args.push(quote!(#ident: #ty));
                        arguments.push(quote! {
                            dws_core::NativeValue::scalar(dws_core::Value::#variant(#ident))
                        });
                    }
                }
                ParamShape::Record(record) => {
                    self.register(record);
                    let ty = rust_ident(&record.name, Case::Pascal);
                    args.push(quote!(#ident: &#ty));
                    arguments.push(quote!(#ident.to_native()));
                }
            }
        }

        let call = quote! {
            let arguments = vec![#(#arguments),*];
            let result = self.module.invoke(#name, arguments, &self.context).await?;
        };

        match result {
            ResultShape::Void => quote! {
                #[doc = #doc]
                pub async fn #method_name(&self, #(#args),*) -> Result<(), dws_proxy::CallError> {
                    #call
                    let _ = result;
                    Ok(())
                }
            },
            ResultShape::Scalar(scalar) => {
                let (ty, variant) = scalar_tokens(scalar);
                quote! {
                    #[doc = #doc]
                    pub async fn #method_name(&self, #(#args),*) -> Result<Option<#ty>, dws_proxy::CallError> {
                        #call
                        match result {
                            dws_core::NativeValue::Null => Ok(None),
                            dws_core::NativeValue::Scalar { value: dws_core::Value::#variant(value) } => Ok(Some(value)),
                            other => Err(mismatch(#name, "result", &other)),
                        }
                    }
                }
            }
            ResultShape::Record(record) => {
                self.register(record);
                let ty = rust_ident(&record.name, Case::Pascal);
                quote! {
                    #[doc = #doc]
                    pub async fn #method_name(&self, #(#args),*) -> Result<Option<#ty>, dws_proxy::CallError> {
                        #call
                        if result.is_null() {
                            return Ok(None);
                        }
                        #ty::from_native(#name, &result).map(Some)
                    }
                }
            }
            ResultShape::ScalarList(scalar) => {
                let (ty, variant) = scalar_tokens(scalar);
                quote! {
                    #[doc = #doc]
                    pub async fn #method_name(&self, #(#args),*) -> Result<Vec<#ty>, dws_proxy::CallError> {
                        #call
                        match result {
                            dws_core::NativeValue::Null => Ok(Vec::new()),
                            dws_core::NativeValue::List { items } => items
                                .into_iter()
                                .filter(|item| !item.is_null())
                                .map(|item| match item {
                                    dws_core::NativeValue::Scalar { value: dws_core::Value::#variant(value) } => Ok(value),
                                    other => Err(mismatch(#name, "item", &other)),
                                })
                                .collect(),
                            other => Err(mismatch(#name, "result", &other)),
                        }
                    }
                }
            }
            ResultShape::RecordList(record) => {
                self.register(record);
                let ty = rust_ident(&record.name, Case::Pascal);
                quote! {
                    #[doc = #doc]
                    pub async fn #method_name(&self, #(#args),*) -> Result<Vec<#ty>, dws_proxy::CallError> {
                        #call
                        match result {
                            dws_core::NativeValue::Null => Ok(Vec::new()),
                            dws_core::NativeValue::List { items } => items
                                .iter()
                                .filter(|item| !item.is_null())
                                .map(|item| #ty::from_native(#name, item))
                                .collect(),
                            other => Err(mismatch(#name, "result", &other)),
                        }
                    }
                }
            }
        }
    }

    fn generate_module(&self, source: &StubSource, client: &Ident) -> TokenStream {
        let schema_hash = source.schema_hash.as_str();
        let location = source.location.as_str();
        let client_doc = format!(" Typed client for {} at {}", source.service_name, location);
        let records = self.records.values();
        let methods = &self.methods;

        quote! {
            /// Schema hash of the module this client was generated from
            pub const SCHEMA_HASH: &str = #schema_hash;

            /// Location the client was generated from
            pub const LOCATION: &str = #location;

            #[allow(dead_code)]
            fn mismatch(operation: &str, path: &str, value: &dws_core::NativeValue) -> dws_proxy::CallError {
                dws_proxy::CallError::Decode {
                    operation: operation.to_string(),
                    reason: format!("{} is an unexpected {}", path, value.shape()),
                }
            }

            #(#records)*

            #[doc = #client_doc]
            #[derive(Clone)]
            pub struct #client {
                module: std::sync::Arc<dws_proxy::CompiledModule>,
                context: dws_proxy::CallContext,
            }

            #[allow(dead_code)]
            impl #client {
                /// Bind the client to a module with the same schema hash
                pub fn new(
                    module: std::sync::Arc<dws_proxy::CompiledModule>,
                    context: dws_proxy::CallContext,
                ) -> Result<Self, dws_proxy::ProxyError> {
                    if module.schema_hash() != SCHEMA_HASH {
                        return Err(dws_proxy::ProxyError::Resolution {
                            location: module.location().clone(),
                            reason: format!(
                                "module {} has schema {}, the client expects {}",
                                module.name(),
                                module.schema_hash(),
                                SCHEMA_HASH
                            ),
                        });
                    }
                    Ok(Self { module, context })
                }

                pub fn module(&self) -> &std::sync::Arc<dws_proxy::CompiledModule> {
                    &self.module
                }

                pub fn with_context(mut self, context: dws_proxy::CallContext) -> Self {
                    self.context = context;
                    self
                }

                #(#methods)*
            }
        }
    }
}

/// A record declared by the service whose fields are all scalars
fn flat_record(record: &RecordType) -> Result<&RecordType, String> {
    if record.origin != TypeOrigin::Module {
        return Err(format!("{} is not declared by the service", record.name));
    }
    if let Some(field) = record.fields.iter().find(|field| field.ty.scalar().is_none()) {
        return Err(format!(
            "field {} of {} has type {}",
            field.name,
            record.name,
            field.ty.type_name()
        ));
    }
    Ok(record)
}

fn generate_record(record: &RecordType) -> TokenStream {
    let ident = rust_ident(&record.name, Case::Pascal);
    let type_name = record.name.as_str();
    let doc = format!(" `{}` record of {}", record.name, record.namespace);

    let mut field_names = HashSet::new();
    let mut idents = Vec::new();
    let mut names = Vec::new();
    let mut types = Vec::new();
    let mut variants = Vec::new();
    for field in &record.fields {
        let Some(scalar) = field.ty.scalar() else {
            continue;
        };
        let (ty, variant) = scalar_tokens(scalar);
        idents.push(unique_ident(&field.name, Case::Snake, &mut field_names));
        names.push(field.name.as_str());
        types.push(ty);
        variants.push(variant);
    }

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct #ident {
            #(pub #idents: Option<#types>,)*
        }

        #[allow(dead_code, clippy::clone_on_copy)]
        impl #ident {
            fn to_native(&self) -> dws_core::NativeValue {
                let mut record = dws_core::RecordValue::new(#type_name);
                #(
                    record.fields.insert(
                        #names.to_string(),
                        match &self.#idents {
                            Some(value) => dws_core::NativeValue::scalar(dws_core::Value::#variants(value.clone())),
                            None => dws_core::NativeValue::Null,
                        },
                    );
                )*
                dws_core::NativeValue::Record(record)
            }

            fn from_native(operation: &str, value: &dws_core::NativeValue) -> Result<Self, dws_proxy::CallError> {
                let Some(record) = value.as_record() else {
                    return Err(mismatch(operation, #type_name, value));
                };
                Ok(Self {
                    #(
                        #idents: match record.field(#names) {
                            dws_core::NativeValue::Null => None,
                            dws_core::NativeValue::Scalar { value: dws_core::Value::#variants(value) } => Some(value.clone()),
                            other => return Err(mismatch(operation, #names, other)),
                        },
                    )*
                })
            }
        }
    }
}

/// Rust type of a scalar and the `Value` variant carrying it
fn scalar_tokens(scalar: ScalarType) -> (TokenStream, Ident) {
    let (ty, variant) = match scalar.primitive() {
        PrimitiveKind::String | PrimitiveKind::Memo => (quote!(String), "Text"),
        PrimitiveKind::Integer => (quote!(i64), "Integer"),
        PrimitiveKind::Number => (quote!(f64), "Number"),
        PrimitiveKind::Decimal => (quote!(dws_core::Decimal), "Decimal"),
        PrimitiveKind::Boolean => (quote!(bool), "Boolean"),
        PrimitiveKind::DateTime => (quote!(chrono::DateTime<chrono::FixedOffset>), "DateTime"),
        PrimitiveKind::Date => (quote!(chrono::NaiveDate), "Date"),
        PrimitiveKind::Time => (quote!(chrono::NaiveTime), "Time"),
        PrimitiveKind::Guid => (quote!(uuid::Uuid), "Guid"),
        PrimitiveKind::Binary => (quote!(Vec<u8>), "Binary"),
    };
    (ty, format_ident!("{}", variant))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_tokens() {
        let (ty, variant) = scalar_tokens(ScalarType::Int);
        assert_eq!(ty.to_string(), "i64");
        assert_eq!(variant, "Integer");

        let (ty, variant) = scalar_tokens(ScalarType::Token);
        assert_eq!(ty.to_string(), "String");
        assert_eq!(variant, "Text");

        let (_, variant) = scalar_tokens(ScalarType::UnsignedLong);
        assert_eq!(variant, "Decimal");
    }
}
