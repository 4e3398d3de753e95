use thiserror::Error;

/// Longest slice of a response body kept in error messages.
pub const BODY_EXCERPT_LEN: usize = 500;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("request rejected {status}: {body}")]
    Client { status: u16, body: String },

    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Invalid AI analysis response: {0}")]
    InvalidResponse(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("no providers selected")]
    NoProviders,

    #[error("unmapped instrument: {0}")]
    UnmappedInstrument(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("analysis request cancelled")]
    Cancelled,

    #[error("failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<AnalysisError>,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Transport-level failures that may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Timeout(_) | AnalysisError::Network(_) | AnalysisError::Server { .. }
        )
    }

    /// HTTP status attached to the failure, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AnalysisError::Server { status, .. }
            | AnalysisError::Client { status, .. }
            | AnalysisError::UnexpectedStatus { status, .. } => Some(*status),
            AnalysisError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// The innermost error, unwrapping retry exhaustion.
    pub fn root(&self) -> &AnalysisError {
        match self {
            AnalysisError::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }

    /// Message suitable for a toast or banner.
    pub fn user_message(&self) -> String {
        match self.root() {
            AnalysisError::Timeout(_) => {
                "The analysis service is taking too long to respond. Please try again.".to_string()
            }
            AnalysisError::Network(_) => {
                "Unable to connect to the analysis service. Check your connection and try again."
                    .to_string()
            }
            AnalysisError::Client { status: 402, body } => {
                if detail_code(body).as_deref() == Some("insufficient_credits") {
                    "Insufficient credits. Please top up to continue.".to_string()
                } else {
                    "Payment required or insufficient credits.".to_string()
                }
            }
            AnalysisError::Client { status: 429, body } => {
                if detail_code(body).as_deref() == Some("daily_cap_reached") {
                    "Daily credit cap reached. Try again tomorrow.".to_string()
                } else {
                    "Too many requests. Please wait and try again.".to_string()
                }
            }
            AnalysisError::Client { body, .. } | AnalysisError::Provider(body) => {
                provider_hint(body).unwrap_or_else(|| "Failed to run AI analysis.".to_string())
            }
            AnalysisError::Cancelled => "Analysis cancelled.".to_string(),
            AnalysisError::NoProviders => "Please select at least one AI provider.".to_string(),
            AnalysisError::UnmappedInstrument(pair) => {
                format!("{} is not a supported instrument.", pair)
            }
            _ => "Failed to fetch analysis. Please try again.".to_string(),
        }
    }
}

/// Truncate a raw body for diagnostics without splitting a UTF-8 character.
pub fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

/// `detail.code` from a FastAPI-style error body.
fn detail_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail").unwrap_or(&value);
    detail
        .get("code")
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

fn provider_hint(body: &str) -> Option<String> {
    let lower = body.to_lowercase();
    if lower.contains("insufficient_quota") || lower.contains("quota") {
        return Some(
            "Provider quota exceeded. Select a different provider/model or check billing."
                .to_string(),
        );
    }
    if lower.contains("model_not_found") || lower.contains("does not exist") {
        return Some(
            "Selected model is unavailable for this account. Choose a different model."
                .to_string(),
        );
    }
    None
}
