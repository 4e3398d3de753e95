use serde_json::{json, Value};

use crate::client::ANALYSIS_TIMEOUT;
use crate::config::Config;
use crate::models::DEFAULT_CANDLE_COUNT;

/// A Config suitable for testing: no token, no fallbacks, lenient instruments.
pub fn test_config() -> Config {
    Config {
        api_base_url: "http://analysis.test".to_string(),
        fallback_base_urls: Vec::new(),
        api_token: None,
        request_timeout: ANALYSIS_TIMEOUT,
        candle_count: DEFAULT_CANDLE_COUNT,
        strict_instruments: false,
        log_level: "error".to_string(),
    }
}

/// A complete provider record carrying `signal`.
pub fn record_json(signal: &str) -> Value {
    json!({
        "signal": signal,
        "confidence": 80,
        "entry": 1.1,
        "stop_loss": 1.05,
        "take_profit": 1.2,
        "risk_reward_ratio": "1:2",
        "timeframe": "H1",
        "technical_analysis": {},
        "recommendation": "go",
    })
}

/// A well-formed multi-provider response for EUR_USD H4.
pub fn multi_body() -> Value {
    json!({
        "pair": "EUR_USD",
        "granularity": "H4",
        "candles": [
            { "time": "2024-01-15T12:00:00Z", "open": 1.1, "high": 1.2, "low": 1.0, "close": 1.15, "volume": 100 },
            { "time": "2024-01-15T16:00:00Z", "open": 1.15, "high": 1.25, "low": 1.1, "close": 1.2, "volume": 120 },
        ],
        "analysis": {
            "gemini": record_json("BUY"),
            "claude": record_json("SELL"),
        },
    })
}
