use serde_json::{json, Value};
use std::time::Duration;

use forex_analysis_client::config::Config;

pub fn test_config() -> Config {
    Config {
        api_base_url: "http://analysis.test".to_string(),
        fallback_base_urls: Vec::new(),
        api_token: None,
        request_timeout: Duration::from_secs(400),
        candle_count: 100,
        strict_instruments: false,
        log_level: "error".to_string(),
    }
}

/// A complete provider record carrying `signal`.
pub fn record(signal: &str, entry: f64) -> Value {
    json!({
        "signal": signal,
        "confidence": "72.5",
        "entry": entry,
        "stop_loss": entry - 0.005,
        "take_profit": entry + 0.01,
        "risk_reward_ratio": 2,
        "timeframe": "H4",
        "technical_analysis": { "trend": "up" },
        "recommendation": "Wait for a retest of the breakout level",
    })
}

pub fn multi_response(pair: &str, granularity: &str, analysis: Value) -> Value {
    json!({
        "pair": pair,
        "granularity": granularity,
        "candles": [
            { "time": "2024-01-15T12:00:00Z", "open": 1.0850, "high": 1.0870, "low": 1.0840, "close": 1.0865, "volume": 1200 },
        ],
        "analysis": analysis,
    })
}
