use serde_json::{Map, Value};

use crate::models::{CanonicalAnalysisRecord, Signal};

/// What one provider's payload turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    Normalized(CanonicalAnalysisRecord),
    /// Human-readable error embedded by the backend.
    Error(String),
    /// Neither of the above; the pretty-printed payload.
    Raw(String),
}

impl ProviderOutcome {
    pub fn is_normalized(&self) -> bool {
        matches!(self, ProviderOutcome::Normalized(_))
    }

    pub fn signal(&self) -> Option<Signal> {
        match self {
            ProviderOutcome::Normalized(rec) => Some(rec.signal),
            _ => None,
        }
    }
}

/// Normalize if possible, else extract an error, else keep the raw payload.
pub fn classify_payload(payload: &Value) -> ProviderOutcome {
    if let Some(record) = normalize_record(payload) {
        return ProviderOutcome::Normalized(record);
    }
    if let Some(message) = extract_error(payload) {
        return ProviderOutcome::Error(message);
    }
    let raw = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    ProviderOutcome::Raw(raw)
}

/// All-or-nothing coercion into a canonical record.
pub fn normalize_record(payload: &Value) -> Option<CanonicalAnalysisRecord> {
    let obj = payload.as_object()?;

    Some(CanonicalAnalysisRecord {
        signal: obj.get("signal").and_then(Value::as_str).and_then(Signal::from_wire)?,
        confidence: number(obj, "confidence")?,
        entry: number(obj, "entry")?,
        stop_loss: number(obj, "stop_loss")?,
        take_profit: number(obj, "take_profit")?,
        risk_reward_ratio: text_or_number(obj, "risk_reward_ratio")?,
        timeframe: obj.get("timeframe").and_then(Value::as_str)?.to_string(),
        technical_analysis: obj.get("technical_analysis").and_then(Value::as_object)?.clone(),
        recommendation: obj.get("recommendation").and_then(Value::as_str)?.to_string(),
    })
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn text_or_number(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Pull a usable message out of an error-carrying payload.
pub fn extract_error(payload: &Value) -> Option<String> {
    let obj = payload.as_object()?;

    if let Some(err) = obj.get("error") {
        if let Some(msg) = non_blank(err) {
            return Some(msg);
        }
        if let Some(inner) = err.as_object() {
            for key in ["message", "detail"] {
                if let Some(msg) = inner.get(key).and_then(non_blank) {
                    return Some(msg);
                }
            }
        }
    }

    for key in ["detail", "message"] {
        if let Some(msg) = obj.get(key).and_then(non_blank) {
            return Some(msg);
        }
    }

    let status = obj.get("status").and_then(|s| match s {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })?;
    (status >= 400).then(|| format!("provider returned status {}", status))
}
