use crate::ServiceArgs;
use crate::context::broker;
use dws_bridge::SchemaOptions;
use dws_core::{PropertyValues, ResultRow, Value};
use miette::{IntoDiagnostic, Result};
use std::time::Duration;

/// Parse a `name=value` input
pub fn parse_param(text: &str) -> std::result::Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", text)),
    }
}

/// Handle the call command
pub async fn handle_call_command(
    service: &ServiceArgs,
    method: &str,
    params: Vec<(String, String)>,
    timeout: u64,
    json: bool,
) -> Result<()> {
    let location = service.location()?;
    let broker = broker(service);
    let options = SchemaOptions {
        skip_unsupported: true,
        dynamic_url: true,
    };
    let schema = broker
        .describe_schema(location, options)
        .await
        .into_diagnostic()?;

    // Values stay text; each one is parsed as the kind of its property
    let values: PropertyValues = params
        .into_iter()
        .map(|(name, value)| (name, Value::Text(value)))
        .collect();
    let rows = broker
        .execute(
            &schema,
            method,
            &values,
            service.credential(),
            Duration::from_secs(timeout),
        )
        .await
        .into_diagnostic()?;

    if json {
        let text = serde_json::to_string_pretty(&rows).into_diagnostic()?;
        println!("{}", text);
    } else {
        print_rows(&rows);
    }
    Ok(())
}

fn print_rows(rows: &[ResultRow]) {
    for (index, row) in rows.iter().enumerate() {
        println!("[{}]", index);
        for (name, value) in row.iter() {
            println!("  {} = {}", name, value);
        }
    }
    println!("\n{} row(s)", rows.len());
}
