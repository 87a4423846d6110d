use async_trait::async_trait;
use dws_core::Credential;
use dws_wsdl::SoapVersion;
use reqwest::Client as ReqwestClient;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// One SOAP exchange as it goes on the wire
#[derive(Debug, Clone)]
pub struct SoapRequest {
    pub endpoint: Url,
    pub version: SoapVersion,
    pub action: Option<String>,
    pub body: Vec<u8>,
    pub credential: Credential,
}

#[derive(Debug, Clone)]
pub struct SoapResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{endpoint}: {message}")]
pub struct TransportError {
    pub endpoint: String,
    pub message: String,
}

impl TransportError {
    pub fn new(endpoint: &Url, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }
}

/// Delivers envelopes to an endpoint
#[async_trait]
pub trait SoapTransport: Send + Sync {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse, TransportError>;
}

/// SOAP over HTTP POST
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }

    /// Get the underlying reqwest client
    pub fn reqwest_client(&self) -> &ReqwestClient {
        &self.client
    }
}

fn content_type(version: SoapVersion, action: Option<&str>) -> String {
    match (version, action) {
        (SoapVersion::Soap11, _) => "text/xml; charset=utf-8".to_string(),
        (SoapVersion::Soap12, Some(action)) => {
            format!("application/soap+xml; charset=utf-8; action=\"{}\"", action)
        }
        (SoapVersion::Soap12, None) => "application/soap+xml; charset=utf-8".to_string(),
    }
}

#[async_trait]
impl SoapTransport for HttpTransport {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse, TransportError> {
        let SoapRequest {
            endpoint,
            version,
            action,
            body,
            credential,
        } = request;

        let content_type = HeaderValue::from_str(&content_type(version, action.as_deref()))
            .map_err(|e| TransportError::new(&endpoint, format!("Invalid SOAP action: {}", e)))?;
        let mut builder = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body);
        if version == SoapVersion::Soap11 {
            builder = builder.header("SOAPAction", format!("\"{}\"", action.unwrap_or_default()));
        }
        if let Some((username, password)) = credential.basic_auth() {
            builder = builder.basic_auth(username, Some(password));
        }

        debug!(%endpoint, %version, "Sending SOAP request");
        let response = builder.send().await.map_err(|e| {
            TransportError::new(&endpoint, format!("Failed to execute request: {}", e))
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            TransportError::new(&endpoint, format!("Failed to read response body: {}", e))
        })?;

        Ok(SoapResponse {
            status,
            body: body.to_vec(),
        })
    }
}
