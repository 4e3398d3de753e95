use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::DEFAULT_CANDLE_COUNT;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Backend
    pub api_base_url: String,
    pub fallback_base_urls: Vec<String>,
    pub api_token: Option<String>,

    // Requests
    pub request_timeout: Duration,
    pub candle_count: u32,
    pub strict_instruments: bool,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let fallback_base_urls = env("ANALYSIS_API_FALLBACK_URLS", "")
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let api_token = Some(env("ANALYSIS_API_TOKEN", ""))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Config {
            api_base_url: env("ANALYSIS_API_BASE_URL", DEFAULT_API_BASE_URL)
                .trim()
                .trim_end_matches('/')
                .to_string(),
            fallback_base_urls,
            api_token,
            request_timeout: Duration::from_secs(
                env("ANALYSIS_TIMEOUT_SECS", "400").parse().unwrap_or(400),
            ),
            candle_count: env("ANALYSIS_CANDLE_COUNT", "100")
                .parse()
                .unwrap_or(DEFAULT_CANDLE_COUNT),
            strict_instruments: env("STRICT_INSTRUMENTS", "false").to_lowercase() == "true",
            log_level: env("LOG_LEVEL", "info"),
        }
    }

    /// Primary base URL followed by the fallbacks, without duplicates.
    pub fn base_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::with_capacity(1 + self.fallback_base_urls.len());
        for url in std::iter::once(&self.api_base_url).chain(&self.fallback_base_urls) {
            if !url.is_empty() && !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        urls
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::test_config;

    #[test]
    fn base_urls_dedupes_fallbacks() {
        let mut cfg = test_config();
        cfg.fallback_base_urls = vec![
            "http://backup:8000".to_string(),
            cfg.api_base_url.clone(),
            "http://backup:8000".to_string(),
        ];
        assert_eq!(
            cfg.base_urls(),
            vec![cfg.api_base_url.clone(), "http://backup:8000".to_string()]
        );
    }

    #[test]
    fn empty_primary_is_skipped() {
        let mut cfg = test_config();
        cfg.api_base_url = String::new();
        cfg.fallback_base_urls = vec!["http://backup:8000".to_string()];
        assert_eq!(cfg.base_urls(), vec!["http://backup:8000".to_string()]);
    }
}
