use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend strategy code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Breakout,
    Ict,
    AdvancedSmc,
    Smc,
    Fibonacci,
    TrendFollowing,
    Momentum,
    VolatilityBreakout,
    CarryTrade,
    OptionsStraddle,
}

impl Strategy {
    pub const ALL: [Strategy; 10] = [
        Strategy::Breakout,
        Strategy::Ict,
        Strategy::AdvancedSmc,
        Strategy::Smc,
        Strategy::Fibonacci,
        Strategy::TrendFollowing,
        Strategy::Momentum,
        Strategy::VolatilityBreakout,
        Strategy::CarryTrade,
        Strategy::OptionsStraddle,
    ];

    pub const DEFAULT: Strategy = Strategy::Breakout;

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Breakout => "breakout",
            Strategy::Ict => "ict",
            Strategy::AdvancedSmc => "advanced_smc",
            Strategy::Smc => "smc",
            Strategy::Fibonacci => "fibonacci",
            Strategy::TrendFollowing => "trend_following",
            Strategy::Momentum => "momentum",
            Strategy::VolatilityBreakout => "volatility_breakout",
            Strategy::CarryTrade => "carry_trade",
            Strategy::OptionsStraddle => "options_straddle",
        }
    }

    /// Display name shown in the strategy picker.
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Breakout => "Breakout Strategy",
            Strategy::Ict => "ICT Concept",
            Strategy::AdvancedSmc => "Advanced SMC",
            Strategy::Smc => "SMC Strategy",
            Strategy::Fibonacci => "Fibonacci Retracement",
            Strategy::TrendFollowing => "Trend Following",
            Strategy::Momentum => "Momentum",
            Strategy::VolatilityBreakout => "Volatility Breakout",
            Strategy::CarryTrade => "Carry Trade",
            Strategy::OptionsStraddle => "Options Straddle",
        }
    }

    /// Resolve a display name or backend code. Unknown input is `Breakout`.
    pub fn from_label(s: &str) -> Strategy {
        Strategy::ALL
            .into_iter()
            .find(|st| st.label() == s || st.as_str() == s)
            .unwrap_or(Strategy::DEFAULT)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_map_to_codes() {
        let cases = [
            ("Breakout Strategy", "breakout"),
            ("ICT Concept", "ict"),
            ("Advanced SMC", "advanced_smc"),
            ("SMC Strategy", "smc"),
            ("Fibonacci Retracement", "fibonacci"),
            ("Trend Following", "trend_following"),
            ("Momentum", "momentum"),
            ("Volatility Breakout", "volatility_breakout"),
            ("Carry Trade", "carry_trade"),
            ("Options Straddle", "options_straddle"),
        ];
        for (label, code) in cases {
            assert_eq!(Strategy::from_label(label).as_str(), code);
        }
    }

    #[test]
    fn codes_are_accepted() {
        for st in Strategy::ALL {
            assert_eq!(Strategy::from_label(st.as_str()), st);
        }
    }

    #[test]
    fn unknown_falls_back_to_breakout() {
        assert_eq!(Strategy::from_label("Martingale"), Strategy::Breakout);
        assert_eq!(Strategy::from_label(""), Strategy::Breakout);
        // exact match only
        assert_eq!(Strategy::from_label("ict concept"), Strategy::Breakout);
    }

    #[test]
    fn serde_uses_backend_codes() {
        let json = serde_json::to_string(&Strategy::AdvancedSmc).unwrap();
        assert_eq!(json, "\"advanced_smc\"");
    }
}
