pub mod analysis;
pub mod http;
pub mod replay;
pub mod retry;

pub use analysis::{
    AnalysisClient, ANALYSIS_TIMEOUT, BILLING_SUMMARY_PATH, MODELS_CATALOG_PATH, MULTI_ANALYSIS_PATH,
    SINGLE_ANALYSIS_PATH,
};
pub use http::HttpTransport;
pub use replay::{RecordedCall, ReplayLog, ReplayTransport};
pub use retry::RetryPolicy;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::error::{AnalysisError, AnalysisResult};

/// One HTTP round trip as the client describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub base_url: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn url(&self) -> AnalysisResult<Url> {
        let raw = format!("{}{}", self.base_url.trim_end_matches('/'), self.path);
        let url = if self.query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, &self.query)
        };
        url.map_err(|e| AnalysisError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// Values of every query parameter named `key`, in order.
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Whatever the backend answered, regardless of status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// The call never produced a response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for AnalysisError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout(msg) => AnalysisError::Timeout(msg),
            TransportError::Connect(msg) => AnalysisError::Network(msg),
            TransportError::Other(msg) => AnalysisError::Transport(msg),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
