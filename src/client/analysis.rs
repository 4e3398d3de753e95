use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::retry::{with_retry, RetryPolicy};
use crate::client::{ApiRequest, Transport};
use crate::config::Config;
use crate::error::{excerpt, AnalysisError, AnalysisResult};
use crate::models::candle::deserialize_candles;
use crate::models::{
    AnalysisRequest, AnalysisResponse, BillingSnapshot, BillingSummary, Candle, ModelsCatalog,
    MultiAnalysisRequest, MultiAnalysisResponse, NormalizedRequest,
};
use crate::render::{classify_payload, ProviderOutcome};

pub const SINGLE_ANALYSIS_PATH: &str = "/analysis/strategy";
pub const MULTI_ANALYSIS_PATH: &str = "/analysis/strategy/ai/multi";
pub const MODELS_CATALOG_PATH: &str = "/analysis/strategy/ai/models";
pub const BILLING_SUMMARY_PATH: &str = "/billing/billing/summary";

/// AI inference is slow; a single attempt may legitimately take minutes.
pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(400);

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct RawSingleResponse {
    pair: String,
    granularity: String,
    #[serde(default, deserialize_with = "deserialize_candles")]
    candles: Vec<Candle>,
    analysis: Value,
    #[serde(default)]
    billing: Option<BillingSnapshot>,
}

/// Client for the analysis backend.
pub struct AnalysisClient {
    transport: Box<dyn Transport>,
    base_urls: Vec<String>,
    timeout: Duration,
    multi_policy: RetryPolicy,
    single_policy: RetryPolicy,
    strict_instruments: bool,
}

impl AnalysisClient {
    pub fn new(cfg: &Config, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            base_urls: cfg.base_urls(),
            timeout: cfg.request_timeout,
            multi_policy: RetryPolicy::multi_provider(),
            single_policy: RetryPolicy::single_provider(),
            strict_instruments: cfg.strict_instruments,
        }
    }

    pub fn with_policies(mut self, multi: RetryPolicy, single: RetryPolicy) -> Self {
        self.multi_policy = multi;
        self.single_policy = single;
        self
    }

    fn primary_base(&self) -> &str {
        self.base_urls
            .first()
            .map(String::as_str)
            .unwrap_or(crate::config::DEFAULT_API_BASE_URL)
    }

    fn analysis_request(&self, base: &str, path: &str, norm: &NormalizedRequest) -> ApiRequest {
        ApiRequest {
            method: Method::POST,
            base_url: base.to_string(),
            path: path.to_string(),
            query: norm.query(),
            body: norm.body(),
            timeout: self.timeout,
        }
    }

    fn lookup_request(&self, path: &str) -> ApiRequest {
        ApiRequest {
            method: Method::GET,
            base_url: self.primary_base().to_string(),
            path: path.to_string(),
            query: Vec::new(),
            body: None,
            timeout: LOOKUP_TIMEOUT.min(self.timeout),
        }
    }

    /// One round trip: classify the status and parse the body as JSON.
    async fn execute_once(&self, request: &ApiRequest) -> AnalysisResult<Value> {
        let resp = self.transport.send(request).await?;
        let status = resp.status;

        match status {
            200..=299 => serde_json::from_str(&resp.body)
                .map_err(|_| AnalysisError::InvalidResponse(excerpt(&resp.body))),
            400..=499 => Err(AnalysisError::Client {
                status,
                body: excerpt(&resp.body),
            }),
            500..=599 => Err(AnalysisError::Server {
                status,
                body: excerpt(&resp.body),
            }),
            _ => Err(AnalysisError::UnexpectedStatus {
                status,
                body: excerpt(&resp.body),
            }),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        what: &str,
    ) -> AnalysisResult<T> {
        let value = with_retry(policy, cancel, what, move |_| self.execute_once(request)).await?;
        serde_json::from_value(value).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
    }

    /// Ask every selected provider for an opinion in one backend call.
    ///
    /// Network failure fails all providers together; per-provider failures
    /// inside a successful response are left in `analysis` for the renderer.
    pub async fn run_multi_analysis(
        &self,
        params: &MultiAnalysisRequest,
        cancel: &CancellationToken,
    ) -> AnalysisResult<MultiAnalysisResponse> {
        let norm = params.normalize(self.strict_instruments)?;
        let request = self.analysis_request(self.primary_base(), MULTI_ANALYSIS_PATH, &norm);

        info!(
            "Multi analysis: {} {} {} providers={:?}",
            norm.pair, norm.granularity, norm.strategy, norm.providers
        );

        let request = &request;
        let value = with_retry(&self.multi_policy, cancel, "multi analysis", move |_| async move {
            let value = self.execute_once(request).await?;
            validate_analysis_shape(&value)?;
            Ok(value)
        })
        .await?;

        let response: MultiAnalysisResponse = serde_json::from_value(value)
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

        info!(
            "Multi analysis complete: {} {} ({} provider result(s))",
            response.pair,
            response.granularity,
            response.analysis.len()
        );
        Ok(response)
    }

    /// Single-provider analysis, trying each configured base URL in turn.
    pub async fn fetch_trading_analysis(
        &self,
        params: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> AnalysisResult<AnalysisResponse> {
        let norm = params.normalize(self.strict_instruments)?;
        let mut last_err: Option<AnalysisError> = None;

        for base in &self.base_urls {
            let request = self.analysis_request(base, SINGLE_ANALYSIS_PATH, &norm);
            info!(
                "Analysis via {}: {} {} {}",
                base, norm.pair, norm.granularity, norm.strategy
            );

            let request = &request;
            let result = with_retry(&self.single_policy, cancel, "analysis", move |_| async move {
                let value = self.execute_once(request).await?;
                validate_analysis_shape(&value)?;
                Ok(value)
            })
            .await;

            match result {
                Ok(value) => return decode_single(value),
                Err(e @ AnalysisError::RetriesExhausted { .. }) => {
                    warn!("Analysis via {} exhausted: {}", base, e);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            AnalysisError::Transport("no analysis base URL configured".to_string())
        }))
    }

    pub async fn fetch_models_catalog(
        &self,
        cancel: &CancellationToken,
    ) -> AnalysisResult<ModelsCatalog> {
        let request = self.lookup_request(MODELS_CATALOG_PATH);
        self.fetch_json(&request, &self.multi_policy, cancel, "models catalog")
            .await
    }

    pub async fn fetch_billing_summary(
        &self,
        cancel: &CancellationToken,
    ) -> AnalysisResult<BillingSummary> {
        let request = self.lookup_request(BILLING_SUMMARY_PATH);
        self.fetch_json(&request, &RetryPolicy::no_retry(), cancel, "billing summary")
            .await
    }
}

/// Reject bodies that are not an analysis response (HTML error pages,
/// proxy banners, unrelated JSON).
pub fn validate_analysis_shape(value: &Value) -> AnalysisResult<()> {
    let looks_valid = value
        .as_object()
        .map(|obj| {
            obj.contains_key("analysis") && obj.contains_key("pair") && obj.contains_key("granularity")
        })
        .unwrap_or(false);

    if looks_valid {
        Ok(())
    } else {
        let raw = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Err(AnalysisError::InvalidResponse(excerpt(&raw)))
    }
}

fn decode_single(value: Value) -> AnalysisResult<AnalysisResponse> {
    let raw: RawSingleResponse = serde_json::from_value(value)
        .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

    let analysis = match classify_payload(&raw.analysis) {
        ProviderOutcome::Normalized(record) => record,
        ProviderOutcome::Error(msg) => return Err(AnalysisError::Provider(msg)),
        ProviderOutcome::Raw(text) => return Err(AnalysisError::InvalidResponse(excerpt(&text))),
    };

    Ok(AnalysisResponse {
        pair: raw.pair,
        granularity: raw.granularity,
        candles: raw.candles,
        analysis,
        billing: raw.billing,
    })
}
