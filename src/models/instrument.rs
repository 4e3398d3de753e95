use crate::error::{AnalysisError, AnalysisResult};

/// Instrument substituted for unrecognised input by the lenient mapper.
pub const DEFAULT_INSTRUMENT: &str = "EUR_USD";

const MAJOR_FOREX_PAIRS: &[&str] = &[
    "EUR/USD", "USD/JPY", "GBP/USD", "AUD/USD", "USD/CAD", "USD/CHF", "NZD/USD", "EUR/GBP",
    "EUR/JPY", "GBP/JPY",
];

// Commodities quoted forex-style.
const COMMODITY_PAIRS: &[&str] = &[
    "XAU/USD",
    "XAG/USD",
    "XPT/USD",
    "XPD/USD",
    "WTICO/USD",
    "BCO/USD",
    "NATGAS/USD",
    "PLATINUM/USD",
    "PALLADIUM/USD",
];

const CRYPTO_PAIRS: &[&str] = &[
    "BTC/USD", "ETH/USD", "XRP/USD", "SOL/USD", "ADA/USD", "DOT/USD", "DOGE/USD", "AVAX/USD",
    "LINK/USD", "MATIC/USD", "BNB/USD", "XLM/USD", "UNI/USD", "ATOM/USD", "LTC/USD",
];

const INDEX_CODES: &[(&str, &str)] = &[
    ("S&P 500", "SPX500_USD"),
    ("DOW", "US30_USD"),
    ("NASDAQ", "NAS100_USD"),
    ("FTSE 100", "UK100_GBP"),
    ("DAX", "DE30_EUR"),
    ("NIKKEI 225", "JP225_USD"),
    ("HANG SENG", "HK33_HKD"),
    ("ASX 200", "AU200_AUD"),
    ("CAC 40", "FR40_EUR"),
];

// Not listed on OANDA; forwarded as exchange symbols.
const INDIAN_STOCKS: &[(&str, &str)] = &[
    ("RELIANCE", "NSE:RELIANCE"),
    ("TCS", "NSE:TCS"),
    ("HDFC BANK", "NSE:HDFCBANK"),
    ("ICICI BANK", "NSE:ICICIBANK"),
    ("HUL", "NSE:HINDUNILVR"),
    ("INFOSYS", "NSE:INFY"),
    ("ITC", "NSE:ITC"),
    ("BHARTI AIRTEL", "NSE:BHARTIARTL"),
    ("SBI", "NSE:SBIN"),
    ("LT", "NSE:LT"),
    ("HCL TECH", "NSE:HCLTECH"),
    ("BAJAJ FINANCE", "NSE:BAJFINANCE"),
    ("ASIAN PAINTS", "NSE:ASIANPAINT"),
    ("HDFC LIFE", "NSE:HDFCLIFE"),
    ("KOTAK MAHINDRA", "NSE:KOTAKBANK"),
    ("TATA MOTORS", "NSE:TATAMOTORS"),
    ("TATA STEEL", "NSE:TATASTEEL"),
    ("WIPRO", "NSE:WIPRO"),
    ("ADANI PORTS", "NSE:ADANIPORTS"),
    ("NTPC", "NSE:NTPC"),
    ("POWERGRID", "NSE:POWERGRID"),
    ("ULTRATECH CEMENT", "NSE:ULTRACEMCO"),
    ("TITAN", "NSE:TITAN"),
    ("SUN PHARMA", "NSE:SUNPHARMA"),
    ("NESTLE", "NSE:NESTLEIND"),
];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn underscored(clean: &str) -> String {
    clean.replacen('/', "_", 1)
}

fn is_backend_code(clean: &str) -> bool {
    match clean.split_once('_') {
        Some((base, quote)) => {
            !base.is_empty()
                && !quote.is_empty()
                && clean.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Resolve a UI pair label to the backend instrument code, or `None` when
/// nothing in the tables or the `BASE/QUOTE` rule applies.
pub fn resolve_instrument(pair: &str) -> Option<String> {
    let clean = pair.trim().to_uppercase();

    if pair == "COPPER/USD" {
        return Some("XCU_USD".to_string());
    }

    if MAJOR_FOREX_PAIRS.contains(&pair)
        || COMMODITY_PAIRS.contains(&pair)
        || CRYPTO_PAIRS.contains(&pair)
    {
        return Some(underscored(&clean));
    }

    if let Some(code) = lookup(INDEX_CODES, &clean) {
        return Some(code.to_string());
    }

    if let Some(symbol) = lookup(INDIAN_STOCKS, pair) {
        return Some(symbol.to_string());
    }

    if clean.contains('/') {
        return Some(underscored(&clean));
    }

    // Already a backend code such as "GBP_USD".
    if is_backend_code(&clean) {
        return Some(clean);
    }

    None
}

/// Lenient mapping: unrecognised input becomes [`DEFAULT_INSTRUMENT`].
pub fn map_to_oanda_instrument(pair: &str) -> String {
    resolve_instrument(pair).unwrap_or_else(|| DEFAULT_INSTRUMENT.to_string())
}

/// Strict mapping: unrecognised input is an error instead of a substitution.
pub fn map_instrument_strict(pair: &str) -> AnalysisResult<String> {
    resolve_instrument(pair).ok_or_else(|| AnalysisError::UnmappedInstrument(pair.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forex_majors() {
        assert_eq!(map_to_oanda_instrument("EUR/USD"), "EUR_USD");
        assert_eq!(map_to_oanda_instrument("GBP/JPY"), "GBP_JPY");
    }

    #[test]
    fn copper_special_case() {
        assert_eq!(map_to_oanda_instrument("COPPER/USD"), "XCU_USD");
    }

    #[test]
    fn commodities_and_crypto() {
        assert_eq!(map_to_oanda_instrument("XAU/USD"), "XAU_USD");
        assert_eq!(map_to_oanda_instrument("NATGAS/USD"), "NATGAS_USD");
        assert_eq!(map_to_oanda_instrument("BTC/USD"), "BTC_USD");
    }

    #[test]
    fn indices_use_cfd_codes() {
        assert_eq!(map_to_oanda_instrument("S&P 500"), "SPX500_USD");
        assert_eq!(map_to_oanda_instrument("nasdaq"), "NAS100_USD");
        assert_eq!(map_to_oanda_instrument(" DAX "), "DE30_EUR");
    }

    #[test]
    fn indian_stocks_keep_exchange_symbols() {
        assert_eq!(map_to_oanda_instrument("HDFC BANK"), "NSE:HDFCBANK");
    }

    #[test]
    fn unknown_slash_pairs_are_rewritten() {
        assert_eq!(map_to_oanda_instrument("usd/try"), "USD_TRY");
    }

    #[test]
    fn backend_codes_pass_through() {
        assert_eq!(map_to_oanda_instrument("GBP_USD"), "GBP_USD");
        assert_eq!(map_instrument_strict("xau_usd").unwrap(), "XAU_USD");
    }

    #[test]
    fn slash_free_unknown_defaults_to_eur_usd() {
        assert_eq!(map_to_oanda_instrument("GOLDBUG"), "EUR_USD");
        assert_eq!(map_to_oanda_instrument(""), "EUR_USD");
    }

    #[test]
    fn strict_mapping_rejects_unknown() {
        assert!(matches!(
            map_instrument_strict("GOLDBUG"),
            Err(AnalysisError::UnmappedInstrument(p)) if p == "GOLDBUG"
        ));
        assert_eq!(map_instrument_strict("EUR/USD").unwrap(), "EUR_USD");
    }
}
