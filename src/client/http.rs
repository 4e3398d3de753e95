use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use tracing::debug;

use crate::client::{ApiRequest, ApiResponse, Transport, TransportError};
use crate::config::Config;

/// Transport backed by a shared reqwest client.
pub struct HttpTransport {
    client: Client,
    api_token: Option<String>,
}

impl HttpTransport {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            api_token: cfg.api_token.clone(),
        }
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() || e.is_request() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = request
            .url()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(ACCEPT, "application/json")
            .timeout(request.timeout);

        if let Some(token) = &self.api_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify)?;

        Ok(ApiResponse { status, body })
    }
}
