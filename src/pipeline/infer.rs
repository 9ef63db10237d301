//! VLM interaction: build the vision request, call the provider, and
//! recover a structure record from the reply.
//!
//! The inference dependency sits behind the [`VisionInference`] trait so the
//! retry logic is testable with scripted fakes and hosts can substitute
//! their own transport. [`ProviderInference`] is the production
//! implementation on top of `edgequake-llm`, which handles provider routing
//! (OpenAI, Anthropic, Gemini, local endpoints) and authentication.
//!
//! ## Retry Strategy
//!
//! Transport and API errors are transient often enough to retry. Each page
//! gets `max_retries` attempts in total; after failed attempt `i`
//! (zero-indexed) the extractor sleeps `retry_backoff_ms * 2^i` before the
//! next attempt. Parsing trouble is never retried: response recovery is
//! total, so any received reply produces a usable record. Exhausting every
//! attempt surfaces the final error to the caller, which treats it as fatal
//! for that page only.

use crate::config::ExtractionConfig;
use crate::output::PageStructure;
use crate::pipeline::recover::recover_structure;
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, USER_DIRECTIVE};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Error from a single inference attempt.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct InferenceError(pub String);

/// Raw reply from one successful inference call.
#[derive(Debug, Clone)]
pub struct InferenceReply {
    /// Free-form text content of the model's response.
    pub content: String,
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Completion tokens produced.
    pub output_tokens: u64,
}

/// A vision-capable completion endpoint.
///
/// One call sends the system instruction, a short text directive, and a PNG
/// page image, and returns the model's free-form text reply.
#[async_trait]
pub trait VisionInference: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        directive: &str,
        png_bytes: &[u8],
    ) -> Result<InferenceReply, InferenceError>;
}

/// Production [`VisionInference`] backed by an `edgequake-llm` provider.
pub struct ProviderInference {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderInference {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl VisionInference for ProviderInference {
    /// ## Message Layout
    ///
    /// 1. **System message**: the JSON-contract prompt
    /// 2. **User message**: the short directive plus the page PNG as a
    ///    base64 image attachment; `detail: "high"` keeps small print and
    ///    table cells legible to tiling vision models
    async fn complete(
        &self,
        system_prompt: &str,
        directive: &str,
        png_bytes: &[u8],
    ) -> Result<InferenceReply, InferenceError> {
        let b64 = STANDARD.encode(png_bytes);
        let image = ImageData::new(b64, "image/png").with_detail("high");

        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user_with_images(directive, vec![image]),
        ];

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| InferenceError(e.to_string()))?;

        Ok(InferenceReply {
            content: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// Successful extraction of one page.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub structure: PageStructure,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Failed attempts before the success.
    pub retries: u32,
}

/// Extract one page's structure from its PNG image, with retries.
///
/// Any received reply is turned into a record via
/// [`recover_structure`]; only transport/API failures count against
/// the retry budget. The final error is returned once the budget is spent.
pub async fn extract_structure(
    inference: &dyn VisionInference,
    page_num: usize,
    png_bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractedPage, InferenceError> {
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let mut last_err: Option<InferenceError> = None;

    for attempt in 0..config.max_retries {
        match inference
            .complete(system_prompt, USER_DIRECTIVE, png_bytes)
            .await
        {
            Ok(reply) => {
                debug!(
                    "Page {}: {} input tokens, {} output tokens",
                    page_num, reply.input_tokens, reply.output_tokens
                );
                return Ok(ExtractedPage {
                    structure: recover_structure(&reply.content),
                    input_tokens: reply.input_tokens,
                    output_tokens: reply.output_tokens,
                    retries: attempt,
                });
            }
            Err(e) => {
                warn!(
                    "Page {}: attempt {}/{} failed: {}",
                    page_num,
                    attempt + 1,
                    config.max_retries,
                    e
                );
                last_err = Some(e);
                if attempt + 1 < config.max_retries {
                    let backoff = config
                        .retry_backoff_ms
                        .saturating_mul(2u64.saturating_pow(attempt));
                    debug!("Page {}: backing off {}ms", page_num, backoff);
                    sleep(Duration::from_millis(backoff)).await;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| InferenceError("no inference attempts were made".into())))
}
