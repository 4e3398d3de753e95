use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{map_instrument_strict, map_to_oanda_instrument, Granularity, Provider, Strategy};

pub const DEFAULT_CANDLE_COUNT: u32 = 100;

/// Single-provider analysis request, in UI vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub pair: String,
    pub timeframe: String,
    pub strategy: String,
    pub count: u32,
}

impl AnalysisRequest {
    pub fn new(pair: &str, timeframe: &str, strategy: &str) -> Self {
        Self {
            pair: pair.to_string(),
            timeframe: timeframe.to_string(),
            strategy: strategy.to_string(),
            count: DEFAULT_CANDLE_COUNT,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Identity of the request for one-in-flight-per-key bookkeeping.
    pub fn key(&self) -> String {
        format!("single|{}|{}|{}", self.pair, self.timeframe, self.strategy)
    }

    pub fn normalize(&self, strict_instruments: bool) -> AnalysisResult<NormalizedRequest> {
        Ok(NormalizedRequest {
            pair: map_pair(&self.pair, strict_instruments)?,
            granularity: Granularity::from_ui(&self.timeframe),
            strategy: Strategy::from_label(&self.strategy),
            providers: Vec::new(),
            count: self.count,
            models: BTreeMap::new(),
        })
    }
}

/// Multi-provider analysis request, in UI vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAnalysisRequest {
    pub providers: Vec<Provider>,
    pub pair: String,
    pub timeframe: String,
    pub strategy: String,
    pub count: u32,
    /// Per-provider model override.
    pub models: BTreeMap<Provider, String>,
}

impl MultiAnalysisRequest {
    pub fn new(pair: &str, timeframe: &str, strategy: &str, providers: &[Provider]) -> Self {
        Self {
            providers: providers.to_vec(),
            pair: pair.to_string(),
            timeframe: timeframe.to_string(),
            strategy: strategy.to_string(),
            count: DEFAULT_CANDLE_COUNT,
            models: BTreeMap::new(),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_model(mut self, provider: Provider, model: &str) -> Self {
        self.models.insert(provider, model.to_string());
        self
    }

    pub fn normalize(&self, strict_instruments: bool) -> AnalysisResult<NormalizedRequest> {
        let mut providers: Vec<Provider> = Vec::with_capacity(self.providers.len());
        for p in &self.providers {
            if !providers.contains(p) {
                providers.push(*p);
            }
        }
        if providers.is_empty() {
            return Err(AnalysisError::NoProviders);
        }

        let models = self
            .models
            .iter()
            .filter(|(_, m)| !m.trim().is_empty())
            .map(|(p, m)| (*p, m.trim().to_string()))
            .collect();

        Ok(NormalizedRequest {
            pair: map_pair(&self.pair, strict_instruments)?,
            granularity: Granularity::from_ui(&self.timeframe),
            strategy: Strategy::from_label(&self.strategy),
            providers,
            count: self.count,
            models,
        })
    }

    /// Identity of the request for one-in-flight-per-key bookkeeping.
    pub fn key(&self) -> String {
        let providers: Vec<&str> = self.providers.iter().map(|p| p.as_str()).collect();
        let models: Vec<String> = self
            .models
            .iter()
            .map(|(p, m)| format!("{}={}", p, m))
            .collect();
        format!(
            "multi|{}|{}|{}|{}|{}",
            self.pair,
            self.timeframe,
            self.strategy,
            providers.join(","),
            models.join(",")
        )
    }
}

fn map_pair(pair: &str, strict: bool) -> AnalysisResult<String> {
    if strict {
        map_instrument_strict(pair)
    } else {
        Ok(map_to_oanda_instrument(pair))
    }
}

/// Request expressed in backend vocabulary, ready to put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    pub pair: String,
    pub granularity: Granularity,
    pub strategy: Strategy,
    /// Empty for single-provider requests.
    pub providers: Vec<Provider>,
    pub count: u32,
    pub models: BTreeMap<Provider, String>,
}

impl NormalizedRequest {
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .providers
            .iter()
            .map(|p| ("providers".to_string(), p.as_str().to_string()))
            .collect();

        query.push(("strategy".to_string(), self.strategy.as_str().to_string()));
        query.push(("pair".to_string(), self.pair.clone()));
        query.push(("granularity".to_string(), self.granularity.as_str().to_string()));
        query.push(("count".to_string(), self.count.to_string()));

        for (provider, model) in &self.models {
            query.push((provider.model_param().to_string(), model.clone()));
        }
        query
    }

    /// `{"models": {...}}` when any override is present.
    pub fn body(&self) -> Option<Value> {
        if self.models.is_empty() {
            return None;
        }
        let models: Map<String, Value> = self
            .models
            .iter()
            .map(|(p, m)| (p.as_str().to_string(), Value::String(m.clone())))
            .collect();
        Some(json!({ "models": models }))
    }
}
