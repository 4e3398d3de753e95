use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AI inference backend the analysis service can consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    Claude,
    Deepseek,
    Openai,
    Mistral,
    Cohere,
    Xai,
}

impl Provider {
    pub const ALL: [Provider; 7] = [
        Provider::Gemini,
        Provider::Claude,
        Provider::Deepseek,
        Provider::Openai,
        Provider::Mistral,
        Provider::Cohere,
        Provider::Xai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Claude => "claude",
            Provider::Deepseek => "deepseek",
            Provider::Openai => "openai",
            Provider::Mistral => "mistral",
            Provider::Cohere => "cohere",
            Provider::Xai => "xai",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Claude => "Claude",
            Provider::Deepseek => "DeepSeek",
            Provider::Openai => "OpenAI",
            Provider::Mistral => "Mistral",
            Provider::Cohere => "Cohere",
            Provider::Xai => "xAI",
        }
    }

    /// Query parameter carrying this provider's model override.
    pub fn model_param(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini_model",
            Provider::Claude => "claude_model",
            Provider::Deepseek => "deepseek_model",
            Provider::Openai => "openai_model",
            Provider::Mistral => "mistral_model",
            Provider::Cohere => "cohere_model",
            Provider::Xai => "xai_model",
        }
    }
}

/// Display label for a provider key as it appears in a response.
pub fn provider_label(key: &str) -> String {
    key.parse::<Provider>()
        .map(|p| p.label().to_string())
        .unwrap_or_else(|_| key.to_string())
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown provider: {}", s))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
