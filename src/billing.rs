use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::AnalysisClient;
use crate::error::AnalysisResult;
use crate::models::{BillingSnapshot, BillingSummary};

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingUpdate {
    /// Optimistic balances from an analysis response.
    Charged(BillingSnapshot),
    /// Authoritative summary from the billing endpoint.
    Refreshed(BillingSummary),
}

/// Latest known credit balances plus a subscription channel.
#[derive(Clone)]
pub struct BillingState {
    summary: Arc<RwLock<Option<BillingSummary>>>,
    update_tx: broadcast::Sender<BillingUpdate>,
}

impl Default for BillingState {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingState {
    pub fn new() -> Self {
        let (update_tx, _) = broadcast::channel(32);
        Self {
            summary: Arc::new(RwLock::new(None)),
            update_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BillingUpdate> {
        self.update_tx.subscribe()
    }

    pub async fn summary(&self) -> Option<BillingSummary> {
        self.summary.read().await.clone()
    }

    /// Merge a response's billing block and notify subscribers. Every block is
    /// published, even one without balances, so listeners can refetch.
    /// Returns whether a cached summary was updated.
    pub async fn apply(&self, snapshot: &BillingSnapshot) -> bool {
        let mut merged = false;
        if snapshot.has_balances() {
            let mut guard = self.summary.write().await;
            if let Some(summary) = guard.as_mut() {
                if let Some(remaining) = snapshot.monthly_credits_remaining {
                    summary.monthly_credits_remaining = remaining;
                }
                if let Some(spent) = snapshot.daily_credits_spent {
                    summary.daily_credits_spent = Some(spent);
                }
                merged = true;
            }
        }

        debug!(
            "Billing charged={:?} remaining={:?} daily={:?}",
            snapshot.charged_credits, snapshot.monthly_credits_remaining, snapshot.daily_credits_spent
        );
        // No subscribers is fine.
        let _ = self.update_tx.send(BillingUpdate::Charged(snapshot.clone()));
        merged
    }

    /// Re-read the authoritative summary from the backend.
    pub async fn refresh(
        &self,
        client: &AnalysisClient,
        cancel: &CancellationToken,
    ) -> AnalysisResult<BillingSummary> {
        let summary = client.fetch_billing_summary(cancel).await?;
        info!(
            "Billing plan={} remaining={}/{}",
            summary.plan, summary.monthly_credits_remaining, summary.monthly_credits_max
        );
        *self.summary.write().await = Some(summary.clone());
        let _ = self.update_tx.send(BillingUpdate::Refreshed(summary.clone()));
        Ok(summary)
    }
}
