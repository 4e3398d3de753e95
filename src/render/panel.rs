use std::fmt;

use crate::models::{latest_close, provider_label, MultiAnalysisResponse, Signal};
use crate::render::normalize::{classify_payload, ProviderOutcome};

/// One provider's rendered result.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPanel {
    pub provider: String,
    pub label: String,
    pub outcome: ProviderOutcome,
}

/// All panels for a multi-provider response, in response order.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiResultView {
    pub pair: String,
    pub granularity: String,
    pub bars: usize,
    pub last_close: Option<f64>,
    /// Open time of the latest bar, `YYYY-MM-DD HH:MM UTC` when parseable.
    pub last_bar: Option<String>,
    pub panels: Vec<ProviderPanel>,
}

impl MultiResultView {
    pub fn from_response(resp: &MultiAnalysisResponse) -> Self {
        let panels = resp
            .analysis
            .iter()
            .map(|(provider, payload)| ProviderPanel {
                provider: provider.clone(),
                label: provider_label(provider),
                outcome: classify_payload(payload),
            })
            .collect();

        let last_bar = resp.candles.last().map(|c| match c.timestamp() {
            Some(ts) => ts.format("%Y-%m-%d %H:%M UTC").to_string(),
            None => c.time.clone(),
        });

        Self {
            pair: resp.pair.clone(),
            granularity: resp.granularity.clone(),
            bars: resp.candles.len(),
            last_close: latest_close(&resp.candles),
            last_bar,
            panels,
        }
    }

    pub fn panel(&self, provider: &str) -> Option<&ProviderPanel> {
        self.panels.iter().find(|p| p.provider == provider)
    }

    pub fn normalized_count(&self) -> usize {
        self.panels.iter().filter(|p| p.outcome.is_normalized()).count()
    }
}

fn badge(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "[ BUY ]",
        Signal::Sell => "[ SELL ]",
        Signal::Hold => "[ HOLD ]",
    }
}

impl fmt::Display for ProviderPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ProviderOutcome::Normalized(rec) => {
                writeln!(f, "{}  {}", self.label, badge(rec.signal))?;
                writeln!(
                    f,
                    "  Entry {} | SL {} | TP {} | R:R {} | Confidence {}",
                    rec.entry, rec.stop_loss, rec.take_profit, rec.risk_reward_ratio, rec.confidence
                )?;
                write!(f, "  {}", rec.recommendation)
            }
            ProviderOutcome::Error(msg) => {
                writeln!(f, "{}", self.label)?;
                write!(f, "  !! {}", msg)
            }
            ProviderOutcome::Raw(raw) => {
                writeln!(f, "{}", self.label)?;
                let indented: Vec<String> = raw.lines().map(|l| format!("  {}", l)).collect();
                write!(f, "{}", indented.join("\n"))
            }
        }
    }
}

impl fmt::Display for MultiResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AI Providers Results  {} • {}", self.pair, self.granularity)?;
        if let (Some(close), Some(at)) = (self.last_close, &self.last_bar) {
            writeln!(f, "Last close {} at {} ({} bars)", close, at, self.bars)?;
        }
        for panel in &self.panels {
            writeln!(f)?;
            writeln!(f, "{}", panel)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::record_json;
    use serde_json::json;

    fn response(analysis: serde_json::Value) -> MultiAnalysisResponse {
        serde_json::from_value(json!({
            "pair": "EUR_USD",
            "granularity": "H1",
            "candles": [],
            "analysis": analysis,
        }))
        .unwrap()
    }

    #[test]
    fn mixed_results_render_independently() {
        let resp = response(json!({
            "gemini": record_json("BUY"),
            "claude": { "error": "rate limited" },
            "openai": "not an object",
        }));
        let view = MultiResultView::from_response(&resp);

        let order: Vec<&str> = view.panels.iter().map(|p| p.provider.as_str()).collect();
        assert_eq!(order, vec!["gemini", "claude", "openai"]);

        assert_eq!(view.panel("gemini").unwrap().outcome.signal(), Some(Signal::Buy));
        assert_eq!(
            view.panel("claude").unwrap().outcome,
            ProviderOutcome::Error("rate limited".into())
        );
        assert!(matches!(
            view.panel("openai").unwrap().outcome,
            ProviderOutcome::Raw(_)
        ));
        assert_eq!(view.normalized_count(), 1);
    }

    #[test]
    fn text_output_shows_one_state_per_panel() {
        let resp = response(json!({
            "gemini": record_json("SELL"),
            "claude": { "error": "rate limited" },
            "llama": { "foo": 1 },
        }));
        let text = MultiResultView::from_response(&resp).to_string();

        assert!(text.starts_with("AI Providers Results  EUR_USD • H1"));
        assert!(text.contains("Gemini  [ SELL ]"));
        assert!(text.contains("Claude\n  !! rate limited"));
        assert!(text.contains("llama\n  {"));
        assert_eq!(text.matches("!!").count(), 1);
        assert_eq!(text.matches("[ ").count(), 1);
    }

    #[test]
    fn header_reports_latest_bar() {
        let mut resp = response(json!({ "gemini": record_json("BUY") }));
        resp.candles = crate::models::candle::decode_candles(&json!([
            { "time": "2024-01-15T12:00:00Z", "open": 1.1, "high": 1.2, "low": 1.0, "close": 1.15 },
            { "timestamp": "2024-01-15T13:00:00.000Z", "open": 1.15, "high": 1.2, "low": 1.1, "close": "1.18" },
        ]));
        let view = MultiResultView::from_response(&resp);
        assert_eq!(view.bars, 2);
        assert_eq!(view.last_close, Some(1.18));

        let text = view.to_string();
        assert!(text.contains("Last close 1.18 at 2024-01-15 13:00 UTC (2 bars)"));
    }

    #[test]
    fn no_candles_no_close_line() {
        let text = MultiResultView::from_response(&response(json!({}))).to_string();
        assert!(!text.contains("Last close"));
    }

    #[test]
    fn unknown_provider_uses_raw_key() {
        let resp = response(json!({ "mixtral-local": record_json("HOLD") }));
        let view = MultiResultView::from_response(&resp);
        assert_eq!(view.panels[0].label, "mixtral-local");
    }
}
