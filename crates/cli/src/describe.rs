use crate::ServiceArgs;
use crate::context::broker;
use dws_bridge::SchemaOptions;
use dws_core::SchemaObject;
use miette::{IntoDiagnostic, Result};

/// Handle the describe command
pub async fn handle_describe_command(
    service: &ServiceArgs,
    skip_unsupported: bool,
    dynamic_url: bool,
    json: bool,
) -> Result<()> {
    let location = service.location()?;
    let options = SchemaOptions {
        skip_unsupported,
        dynamic_url,
    };
    let schema = broker(service)
        .describe_schema(location, options)
        .await
        .into_diagnostic()?;

    if json {
        let text = serde_json::to_string_pretty(&schema).into_diagnostic()?;
        println!("{}", text);
    } else {
        print_schema(&schema);
    }
    Ok(())
}

fn print_schema(schema: &SchemaObject) {
    println!("{}", schema.metadata.display_name);
    println!("  Object: {}", schema.name);
    println!("  Module: {} ({})", schema.source.module_name, schema.source.schema_hash);

    println!("\nProperties:");
    for property in schema.properties() {
        println!("  {:<32} {}", property.name, property.kind);
    }

    println!("\nMethods:");
    for method in schema.methods() {
        println!("  {} [{}]", method.name, method.kind);
        println!("    {}", method.description);
        if !method.inputs.is_empty() {
            println!("    in:  {}", method.inputs.join(", "));
        }
        if !method.outputs.is_empty() {
            println!("    out: {}", method.outputs.join(", "));
        }
    }
}
