//! Retrieval of description documents

use crate::error::FetchError;
use async_trait::async_trait;
use dws_core::Credential;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches the raw bytes of a description or schema document
#[async_trait]
pub trait DescriptionFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, credential: &Credential) -> Result<Vec<u8>, FetchError>;
}

/// HTTP GET with optional basic authentication
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl DescriptionFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, credential: &Credential) -> Result<Vec<u8>, FetchError> {
        let mut request = self.client.get(url.clone());
        if let Some((user, password)) = credential.basic_auth() {
            request = request.basic_auth(user, Some(password));
        }

        debug!(%url, timeout = ?self.timeout, "Fetching document");
        let exchange = async {
            let response = request.send().await.map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;
            Ok(body.to_vec())
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            })?
    }
}
