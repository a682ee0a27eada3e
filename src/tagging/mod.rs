//! Tag suggestion: asks a generative model for category tags for a filename.
//!
//! The suggester never fails. Provider errors and malformed output both
//! degrade to a single tag derived from the filename.

pub mod gemini;
pub mod parse;

pub use gemini::GeminiProvider;
pub use parse::{fallback_tag, normalize_tag};

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Upper bound on suggested tags kept per file.
pub const MAX_TAGS: usize = 5;

/// A single prompt-in, text-out model call.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub fn build_prompt(filename: &str) -> String {
    format!(
        "Analyze the following filename and generate a JSON array of 3-5 relevant, concise, lowercase tags.\n\
         The tags should categorize the file's likely content or purpose.\n\
         For example, for 'Q3_Financial_Report_2024.docx', a good response would be [\"finance\", \"report\", \"q3\", \"2024\"].\n\
         For 'Project_Bandit_Proposal_v2.pdf', a good response would be [\"proposal\", \"project bandit\", \"internal\"].\n\
         \n\
         Filename: \"{filename}\""
    )
}

#[derive(Clone)]
pub struct TagSuggester {
    provider: Arc<dyn CompletionProvider>,
}

impl TagSuggester {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Lowercase, deduplicated tags for `filename`; never empty and at most
    /// [`MAX_TAGS`] long.
    pub async fn suggest(&self, filename: &str) -> Vec<String> {
        let raw = match self.provider.complete(&build_prompt(filename)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    filename,
                    error = %e,
                    "tag suggestion failed, using fallback"
                );
                return vec![fallback_tag(filename)];
            }
        };

        match parse::parse_tag_array(&raw).map(parse::normalize_tags) {
            Some(mut tags) if !tags.is_empty() => {
                tags.truncate(MAX_TAGS);
                tags
            }
            _ => {
                tracing::warn!(
                    provider = self.provider.name(),
                    filename,
                    response = %raw.chars().take(200).collect::<String>(),
                    "tag response was not an array of strings, using fallback"
                );
                vec![fallback_tag(filename)]
            }
        }
    }
}
