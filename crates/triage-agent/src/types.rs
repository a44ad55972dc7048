//! Type definitions for model backend interactions

use serde::{Deserialize, Serialize};

/// Token usage reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Ollama `/api/generate` request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    /// `"json"` constrains the reply to a JSON document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Ollama `/api/generate` response (non-streaming)
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub prompt_eval_count: Option<usize>,
    #[serde(default)]
    pub eval_count: Option<usize>,
}

impl GenerateResponse {
    pub fn usage(&self) -> Option<Usage> {
        match (self.prompt_eval_count, self.eval_count) {
            (None, None) => None,
            (input, output) => Some(Usage {
                input_tokens: input.unwrap_or(0),
                output_tokens: output.unwrap_or(0),
            }),
        }
    }
}

/// Which decoding tier produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeTier {
    /// Strict schema decode of the structured completion
    Structured,
    /// Strict decode after the model repaired its own output
    Repaired,
    /// JSON object found inside a plain completion
    Extracted,
    /// No usable JSON; explanation is an excerpt of the raw text
    Excerpt,
}

impl std::fmt::Display for DecodeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Repaired => write!(f, "repaired"),
            Self::Extracted => write!(f, "extracted"),
            Self::Excerpt => write!(f, "excerpt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_format_when_plain() {
        let request = GenerateRequest {
            model: "mistral".to_string(),
            prompt: "hi".to_string(),
            stream: false,
            format: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("format").is_none());
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_usage() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"model":"mistral","response":"ok","done":true,"prompt_eval_count":12,"eval_count":3}"#,
        )
        .unwrap();
        assert_eq!(response.response, "ok");
        assert_eq!(
            response.usage(),
            Some(Usage {
                input_tokens: 12,
                output_tokens: 3
            })
        );

        let bare: GenerateResponse = serde_json::from_str(r#"{"response":"ok"}"#).unwrap();
        assert_eq!(bare.usage(), None);
    }
}
