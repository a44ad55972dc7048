//! Three-tier verdict decoding
//!
//! 1. Structured completion with strict decode (plus one self-repair pass)
//! 2. Plain completion, scanned for an embedded JSON object
//! 3. Excerpt of the raw text as a low-confidence explanation
//!
//! [`VerdictDecoder::decode`] never fails: every path ends in a complete
//! [`Verdict`].

use crate::client::SharedModel;
use crate::extract::{balanced_object, excerpt, greedy_object, strip_markdown_fences};
use crate::prompt::build_verdict_prompt;
use crate::structured::{decode_lenient, StructuredClient};
use crate::types::DecodeTier;
use triage_core::Verdict;

/// Default length of a Tier-3 explanation excerpt
pub const DEFAULT_EXCERPT_CHARS: usize = 200;

/// A verdict and the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub verdict: Verdict,
    pub tier: DecodeTier,
}

impl Decoded {
    fn new(verdict: Verdict, tier: DecodeTier) -> Self {
        Self { verdict, tier }
    }
}

/// Decode a plain completion: embedded JSON object if any, otherwise an excerpt
pub fn decode_raw_text(raw: &str, excerpt_chars: usize) -> Decoded {
    let text = strip_markdown_fences(raw);

    let embedded = greedy_object(text)
        .and_then(decode_lenient)
        .or_else(|| balanced_object(text).and_then(decode_lenient));

    match embedded {
        Some(verdict) => Decoded::new(verdict, DecodeTier::Extracted),
        None => Decoded::new(
            Verdict::undetermined(excerpt(raw, excerpt_chars)),
            DecodeTier::Excerpt,
        ),
    }
}

/// Turns a user turn into a verdict using a structured and a raw client
#[derive(Clone)]
pub struct VerdictDecoder {
    structured: StructuredClient,
    raw: SharedModel,
    excerpt_chars: usize,
}

impl VerdictDecoder {
    pub fn new(structured: StructuredClient, raw: SharedModel) -> Self {
        Self {
            structured,
            raw,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self
    }

    /// Decode a verdict for `input`, falling back tier by tier
    pub async fn decode(&self, input: &str) -> Decoded {
        let error = match self.structured.invoke(input).await {
            Ok((verdict, tier)) => return Decoded::new(verdict, tier),
            Err(e) => e,
        };

        tracing::warn!(
            model = %self.structured.model_name(),
            error = %error,
            "Structured decode failed, falling back to plain completion"
        );

        match self.raw.complete(&build_verdict_prompt(input)).await {
            Ok(raw) => {
                let decoded = decode_raw_text(&raw, self.excerpt_chars);
                if decoded.tier == DecodeTier::Excerpt {
                    tracing::warn!(
                        chars = raw.len(),
                        "No JSON object in fallback completion, using excerpt"
                    );
                }
                decoded
            }
            Err(e) => {
                tracing::error!(error = %e, "Fallback completion failed");
                Decoded::new(
                    Verdict::undetermined(excerpt(
                        &format!("Fallback completion failed: {}", e),
                        self.excerpt_chars,
                    )),
                    DecodeTier::Excerpt,
                )
            }
        }
    }
}
