use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::billing::BillingState;
use crate::client::AnalysisClient;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{AnalysisRequest, AnalysisResponse, MultiAnalysisRequest, MultiAnalysisResponse};

/// Call-site owner of analysis requests.
///
/// At most one request per key is in flight: submitting again with the same
/// key cancels the older call, which then resolves to
/// [`AnalysisError::Cancelled`] even if its response already arrived.
pub struct AnalysisSession {
    client: AnalysisClient,
    billing: BillingState,
    shutdown: CancellationToken,
    in_flight: Mutex<HashMap<String, (u64, CancellationToken)>>,
    next_id: AtomicU64,
}

impl AnalysisSession {
    pub fn new(client: AnalysisClient, billing: BillingState) -> Self {
        Self {
            client,
            billing,
            shutdown: CancellationToken::new(),
            in_flight: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn client(&self) -> &AnalysisClient {
        &self.client
    }

    pub fn billing(&self) -> &BillingState {
        &self.billing
    }

    pub fn in_flight(&self) -> usize {
        self.registry().len()
    }

    /// Token for one-off calls made outside the registry (catalog, billing).
    /// It fires on [`cancel_all`](Self::cancel_all).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// The registry only holds ids and tokens, so a panic elsewhere cannot
    /// leave it inconsistent; keep using it.
    fn registry(&self) -> MutexGuard<'_, HashMap<String, (u64, CancellationToken)>> {
        self.in_flight.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("In-flight registry lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn begin(&self, key: &str) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.shutdown.child_token();
        if let Some((_, previous)) = self.registry().insert(key.to_string(), (id, token.clone())) {
            debug!("Superseding in-flight request {}", key);
            previous.cancel();
        }
        (id, token)
    }

    fn finish(&self, key: &str, id: u64) {
        let mut map = self.registry();
        if map.get(key).map(|(current, _)| *current == id).unwrap_or(false) {
            map.remove(key);
        }
    }

    /// Cancel the in-flight request registered under `key`, if any.
    /// Keys come from [`MultiAnalysisRequest::key`] and [`AnalysisRequest::key`].
    pub fn cancel(&self, key: &str) -> bool {
        let removed = self.registry().remove(key);
        match removed {
            Some((_, token)) => {
                debug!("Cancelling in-flight request {}", key);
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_multi(&self, request: &MultiAnalysisRequest) -> bool {
        self.cancel(&request.key())
    }

    pub fn cancel_single(&self, request: &AnalysisRequest) -> bool {
        self.cancel(&request.key())
    }

    /// Cancel everything; later submissions are cancelled immediately.
    pub fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    pub async fn submit_multi(
        &self,
        request: &MultiAnalysisRequest,
    ) -> AnalysisResult<MultiAnalysisResponse> {
        let key = request.key();
        let (id, token) = self.begin(&key);
        let result = self.client.run_multi_analysis(request, &token).await;
        self.finish(&key, id);

        if token.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let response = result?;
        if let Some(billing) = &response.billing {
            self.billing.apply(billing).await;
        }
        info!("Multi analysis delivered for {}", response.pair);
        Ok(response)
    }

    pub async fn submit_single(&self, request: &AnalysisRequest) -> AnalysisResult<AnalysisResponse> {
        let key = request.key();
        let (id, token) = self.begin(&key);
        let result = self.client.fetch_trading_analysis(request, &token).await;
        self.finish(&key, id);

        if token.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let response = result?;
        if let Some(billing) = &response.billing {
            self.billing.apply(billing).await;
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::BillingUpdate;
    use crate::client::ReplayTransport;
    use crate::models::Provider;
    use crate::test_helpers::{multi_body, test_config};
    use std::sync::Arc;
    use std::time::Duration;

    fn session(transport: ReplayTransport) -> AnalysisSession {
        AnalysisSession::new(
            AnalysisClient::new(&test_config(), Box::new(transport)),
            BillingState::new(),
        )
    }

    fn request() -> MultiAnalysisRequest {
        MultiAnalysisRequest::new("EUR/USD", "1H", "ICT Concept", &[Provider::Gemini])
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_cancels_older_request() {
        let transport = ReplayTransport::new()
            .with_latency(Duration::from_millis(100))
            .respond_json(200, &multi_body());
        let log = transport.log();
        let session = Arc::new(session(transport));

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.submit_multi(&request()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = session.submit_multi(&request()).await;

        let first = first.await.unwrap();
        assert!(matches!(first, Err(AnalysisError::Cancelled)));
        assert!(second.is_ok());
        assert_eq!(log.len(), 2);
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_run_side_by_side() {
        let transport = ReplayTransport::new()
            .with_latency(Duration::from_millis(100))
            .respond_json(200, &multi_body());
        let session = Arc::new(session(transport));

        let other = MultiAnalysisRequest::new("GBP/USD", "1H", "ICT Concept", &[Provider::Gemini]);
        let first = request();
        let (a, b) = tokio::join!(session.submit_multi(&first), session.submit_multi(&other));
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_stops_new_work() {
        let transport = ReplayTransport::new().respond_json(200, &multi_body());
        let log = transport.log();
        let session = session(transport);
        session.cancel_all();

        let err = session.submit_multi(&request()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn billing_is_published() {
        let mut body = multi_body();
        body["billing"] = serde_json::json!({
            "charged_credits": 1,
            "monthly_credits_remaining": 99,
            "daily_credits_spent": 1
        });
        let session = session(ReplayTransport::new().respond_json(200, &body));
        let mut rx = session.billing().subscribe();

        session.submit_multi(&request()).await.unwrap();
        match rx.recv().await.unwrap() {
            BillingUpdate::Charged(snap) => assert_eq!(snap.monthly_credits_remaining, Some(99.0)),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn cancel_unknown_key() {
        let session = session(ReplayTransport::new());
        assert!(!session.cancel("nothing"));
        assert!(!session.cancel_multi(&request()));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_cancel_resolves_in_flight_submit() {
        let transport = ReplayTransport::new()
            .with_latency(Duration::from_secs(5))
            .respond_json(200, &multi_body());
        let session = Arc::new(session(transport));

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.submit_multi(&request()).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(session.in_flight(), 1);
        assert!(session.cancel_multi(&request()));
        assert!(matches!(pending.await.unwrap(), Err(AnalysisError::Cancelled)));
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_single_by_request() {
        let body = serde_json::json!({
            "pair": "EUR_USD",
            "granularity": "H1",
            "analysis": crate::test_helpers::record_json("BUY"),
        });
        let transport = ReplayTransport::new()
            .with_latency(Duration::from_secs(5))
            .respond_json(200, &body);
        let session = Arc::new(session(transport));
        let single = AnalysisRequest::new("EUR/USD", "1H", "ict");

        let pending = {
            let session = session.clone();
            let single = single.clone();
            tokio::spawn(async move { session.submit_single(&single).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(session.cancel_single(&single));
        assert!(matches!(pending.await.unwrap(), Err(AnalysisError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_token_follows_cancel_all() {
        let session = session(ReplayTransport::new());
        let token = session.cancellation_token();
        assert!(!token.is_cancelled());
        session.cancel_all();
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn poisoned_registry_still_supersedes() {
        let transport = ReplayTransport::new()
            .with_latency(Duration::from_millis(100))
            .respond_json(200, &multi_body());
        let session = Arc::new(session(transport));

        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.in_flight.lock().unwrap();
            panic!("poison the registry");
        })
        .join();
        assert!(session.in_flight.is_poisoned());

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.submit_multi(&request()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = session.submit_multi(&request()).await;

        assert!(matches!(first.await.unwrap(), Err(AnalysisError::Cancelled)));
        assert!(second.is_ok());
    }
}
