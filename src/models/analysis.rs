use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::candle::{deserialize_candles, Candle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    /// Case-sensitive parse of the wire value.
    pub fn from_wire(s: &str) -> Option<Signal> {
        match s {
            "BUY" => Some(Signal::Buy),
            "SELL" => Some(Signal::Sell),
            "HOLD" => Some(Signal::Hold),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fully-shaped trading signal produced by one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAnalysisRecord {
    pub signal: Signal,
    pub confidence: f64,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward_ratio: String,
    pub timeframe: String,
    pub technical_analysis: Map<String, Value>,
    pub recommendation: String,
}

/// Credit accounting attached to a charged analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingSnapshot {
    #[serde(default)]
    pub charged_credits: Option<f64>,
    #[serde(default)]
    pub monthly_credits_remaining: Option<f64>,
    #[serde(default)]
    pub daily_credits_spent: Option<f64>,
}

impl BillingSnapshot {
    /// Whether it carries any balance to merge.
    pub fn has_balances(&self) -> bool {
        self.monthly_credits_remaining.is_some() || self.daily_credits_spent.is_some()
    }
}

/// Single-provider analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub pair: String,
    pub granularity: String,
    pub candles: Vec<Candle>,
    pub analysis: CanonicalAnalysisRecord,
    pub billing: Option<BillingSnapshot>,
}

/// Multi-provider analysis. `analysis` keeps the backend's key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiAnalysisResponse {
    pub pair: String,
    pub granularity: String,
    #[serde(default, deserialize_with = "deserialize_candles")]
    pub candles: Vec<Candle>,
    pub analysis: Map<String, Value>,
    #[serde(default)]
    pub billing: Option<BillingSnapshot>,
}

/// Available model names per provider key.
pub type ModelsCatalog = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub plan: String,
    pub monthly_credits_remaining: f64,
    pub monthly_credits_max: f64,
    #[serde(default)]
    pub daily_credits_spent: Option<f64>,
    #[serde(default)]
    pub daily_cap: Option<f64>,
    #[serde(default)]
    pub allowed_models: Option<Vec<String>>,
}
