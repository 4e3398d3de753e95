pub mod analysis;
pub mod candle;
pub mod instrument;
pub mod provider;
pub mod request;
pub mod strategy;
pub mod timeframe;

pub use analysis::*;
pub use candle::{latest_close, Candle};
pub use instrument::{map_instrument_strict, map_to_oanda_instrument, resolve_instrument};
pub use provider::{provider_label, Provider};
pub use request::{AnalysisRequest, MultiAnalysisRequest, NormalizedRequest, DEFAULT_CANDLE_COUNT};
pub use strategy::Strategy;
pub use timeframe::Granularity;
