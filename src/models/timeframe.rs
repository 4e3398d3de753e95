use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend candle granularity code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    H8,
    D1,
    W1,
    /// Monthly
    M,
}

impl Granularity {
    pub const ALL: [Granularity; 10] = [
        Granularity::M1,
        Granularity::M5,
        Granularity::M15,
        Granularity::M30,
        Granularity::H1,
        Granularity::H4,
        Granularity::H8,
        Granularity::D1,
        Granularity::W1,
        Granularity::M,
    ];

    pub const DEFAULT: Granularity = Granularity::H1;

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::M1 => "M1",
            Granularity::M5 => "M5",
            Granularity::M15 => "M15",
            Granularity::M30 => "M30",
            Granularity::H1 => "H1",
            Granularity::H4 => "H4",
            Granularity::H8 => "H8",
            Granularity::D1 => "D1",
            Granularity::W1 => "W1",
            Granularity::M => "M",
        }
    }

    /// Exact backend code, if `s` already is one.
    pub fn from_code(s: &str) -> Option<Granularity> {
        Granularity::ALL.into_iter().find(|g| g.as_str() == s)
    }

    /// Map a UI timeframe token to a backend code.
    ///
    /// Accepts backend codes unchanged, UI shorthand ("4H", "1D") and
    /// TradingView minute intervals ("60", "240"). Anything else is `H1`.
    pub fn from_ui(timeframe: &str) -> Granularity {
        if let Some(code) = Granularity::from_code(timeframe) {
            return code;
        }

        match timeframe {
            "1M" | "1" => Granularity::M1,
            "5M" | "5" => Granularity::M5,
            "15M" | "15" => Granularity::M15,
            "30M" | "30" => Granularity::M30,
            "1H" | "60" => Granularity::H1,
            "4H" | "240" => Granularity::H4,
            "8H" | "480" => Granularity::H8,
            "1D" | "D" => Granularity::D1,
            "1W" | "W" => Granularity::W1,
            "1MO" => Granularity::M,
            _ => Granularity::DEFAULT,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
