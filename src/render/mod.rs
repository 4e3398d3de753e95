pub mod normalize;
pub mod panel;

pub use normalize::{classify_payload, extract_error, normalize_record, ProviderOutcome};
pub use panel::{MultiResultView, ProviderPanel};
