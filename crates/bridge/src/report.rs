//! Failure messages for the host's message sink

use std::error::Error;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Information,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Where the broker reports failures
pub trait MessageSink: Send + Sync {
    fn report(&self, severity: Severity, message: &str);
}

/// Forwards reports to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => error!(%message, "Broker failure"),
            Severity::Warning => warn!(%message, "Broker warning"),
            Severity::Information => info!(%message, "Broker message"),
        }
    }
}

/// Message for a failed discovery: the error and its direct cause
pub fn describe_report(error: &(dyn Error + 'static)) -> String {
    let mut message = format!("Exception: {}", error);
    if let Some(source) = error.source() {
        message.push_str(&format!(" InnerException: {}", source));
    }
    message
}

/// Message for a failed call: the error and every nested cause, numbered from zero
pub fn execute_report(error: &(dyn Error + 'static)) -> String {
    let mut lines = vec![format!("Exception.Message: {}", error)];
    let mut source = error.source();
    let mut level = 0;
    while let Some(cause) = source {
        lines.push(format!("{} InnerException.Message: {}", level, cause));
        source = cause.source();
        level += 1;
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Error, Debug)]
    #[error("connection reset")]
    struct Reset;

    #[derive(Error, Debug)]
    #[error("request failed")]
    struct Request(#[source] Reset);

    #[derive(Error, Debug)]
    #[error("GetUser failed")]
    struct Call(#[source] Request);

    #[test]
    fn test_describe_report() {
        assert_eq!(describe_report(&Reset), "Exception: connection reset");
        assert_eq!(
            describe_report(&Call(Request(Reset))),
            "Exception: GetUser failed InnerException: request failed"
        );
    }

    #[test]
    fn test_execute_report_numbers_every_cause() {
        assert_eq!(
            execute_report(&Call(Request(Reset))),
            "Exception.Message: GetUser failed\n\
             0 InnerException.Message: request failed\n\
             1 InnerException.Message: connection reset"
        );
        assert_eq!(execute_report(&Reset), "Exception.Message: connection reset");
    }
}
