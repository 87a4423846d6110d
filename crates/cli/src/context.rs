use crate::ServiceArgs;
use dws_bridge::{ServiceBroker, TracingSink};
use dws_proxy::{ProxyCache, WsdlCompiler};
use std::sync::Arc;
use std::time::Duration;

/// A broker talking HTTP with the credential from the command line
pub fn broker(service: &ServiceArgs) -> ServiceBroker {
    let compiler = WsdlCompiler::http(
        Duration::from_secs(service.fetch_timeout),
        Arc::new(service.credential()),
    );
    let cache = Arc::new(ProxyCache::new(Arc::new(compiler)));
    ServiceBroker::new(cache, Arc::new(TracingSink))
}
