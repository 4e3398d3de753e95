use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One OHLCV bar echoed back by the analysis backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    /// Bar open time (RFC 3339).
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    /// Decode one bar from the backend echo.
    ///
    /// The time may arrive as `time` or `timestamp`, either RFC 3339 or epoch
    /// seconds; prices may be numbers or numeric strings; volume may be absent
    /// or null. Returns `None` if a price or the time is unusable.
    pub fn from_value(value: &Value) -> Option<Candle> {
        let obj = value.as_object()?;
        Some(Candle {
            time: bar_time(obj)?,
            open: price(obj, "open")?,
            high: price(obj, "high")?,
            low: price(obj, "low")?,
            close: price(obj, "close")?,
            volume: price(obj, "volume"),
        })
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

fn bar_time(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("time").or_else(|| obj.get("timestamp"))? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|t| t.to_rfc3339()),
        _ => None,
    }
}

fn price(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Keep the bars that decode, drop the rest. A malformed candle echo never
/// fails the response it travels in.
pub fn decode_candles(value: &Value) -> Vec<Candle> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let candles: Vec<Candle> = items.iter().filter_map(Candle::from_value).collect();
    if candles.len() < items.len() {
        debug!("Skipped {} unusable candle(s)", items.len() - candles.len());
    }
    candles
}

/// serde adapter for [`decode_candles`].
pub fn deserialize_candles<'de, D>(deserializer: D) -> Result<Vec<Candle>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_candles(&value))
}

/// Close of the most recent bar, assuming oldest-first ordering.
pub fn latest_close(candles: &[Candle]) -> Option<f64> {
    candles.last().map(|c| c.close)
}
