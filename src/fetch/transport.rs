//! Network side of a cached fetch.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use super::FetchRequest;
use crate::error::FetchError;

// == Transport Trait ==
/// Performs a request and decodes its JSON response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &FetchRequest) -> Result<Value, FetchError>;
}

// == HTTP Transport ==
/// `reqwest`-backed transport. Timeouts are whatever the client is built
/// with; nothing is added on top.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        debug!("{} {}", request.method, request.target());

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.params);

        if request.method != Method::GET {
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
        }

        let response = builder.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}
