use crate::ServiceArgs;
use crate::context::broker;
use dws_stubgen::{StubGenerator, StubSource};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::warn;

/// Handle the stubgen command
pub async fn handle_stubgen_command(service: &ServiceArgs, out: Option<PathBuf>) -> Result<()> {
    let location = service.location()?;
    let broker = broker(service);
    let module = broker
        .cache()
        .get_or_compile(location)
        .await
        .into_diagnostic()?;

    let stub = StubGenerator::new()
        .generate(&StubSource::from_module(&module))
        .into_diagnostic()?;
    for skipped in &stub.skipped {
        warn!(operation = %skipped.operation, "Skipped: {}", skipped.reason);
    }

    match out {
        Some(path) => {
            std::fs::write(&path, &stub.code).into_diagnostic()?;
            eprintln!("Wrote {} to {}", stub.client, path.display());
        }
        None => print!("{}", stub.code),
    }
    Ok(())
}
