use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::client::{ApiRequest, ApiResponse, Transport, TransportError};

#[derive(Debug, Clone)]
enum Step {
    Respond(ApiResponse),
    Fail(TransportError),
}

/// A request the replay transport received, and when.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: ApiRequest,
    pub at: Instant,
}

/// Shared handle on the calls a [`ReplayTransport`] has seen.
#[derive(Debug, Clone, Default)]
pub struct ReplayLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ReplayLog {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|w| w[1].at.duration_since(w[0].at))
            .collect()
    }

    fn record(&self, request: &ApiRequest) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                request: request.clone(),
                at: Instant::now(),
            });
        }
    }
}

/// A transport that answers from a pre-loaded script, one step per call.
/// When the script runs out the last step repeats; an empty script fails.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    latency: Duration,
    log: ReplayLog,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> ReplayLog {
        self.log.clone()
    }

    /// Delay every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn push(self, step: Step) -> Self {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(step);
        }
        self
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.push(Step::Respond(ApiResponse {
            status,
            body: body.to_string(),
        }))
    }

    pub fn respond_json(self, status: u16, body: &Value) -> Self {
        self.respond(status, &body.to_string())
    }

    pub fn time_out(self) -> Self {
        self.push(Step::Fail(TransportError::Timeout("replayed timeout".to_string())))
    }

    pub fn refuse_connection(self) -> Self {
        self.push(Step::Fail(TransportError::Connect(
            "replayed connection refused".to_string(),
        )))
    }

    fn next_step(&self) -> Option<Step> {
        let next = self.steps.lock().ok().and_then(|mut s| s.pop_front());
        let mut last = self.last.lock().ok()?;
        match next {
            Some(step) => {
                *last = Some(step.clone());
                Some(step)
            }
            None => last.clone(),
        }
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.log.record(request);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.next_step() {
            Some(Step::Respond(resp)) => Ok(resp),
            Some(Step::Fail(err)) => Err(err),
            None => Err(TransportError::Other("replay script is empty".to_string())),
        }
    }
}
