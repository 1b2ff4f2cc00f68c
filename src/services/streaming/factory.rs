//! Adapter Factory
//!
//! Creates appropriate stream adapters based on provider and model.

use assistant_stream_core::StreamAdapter;

use super::adapters::{AnthropicAdapter, GeminiAdapter, OllamaAdapter, OpenAIAdapter};
use crate::services::extraction::ReasoningTags;

/// Known models that reason inside `<think>` tags
const THINKING_MODELS: &[&str] = &["deepseek-r1", "deepseek-reasoner", "qwq", "qwen-qwq"];

/// Check if a model name indicates `<think>` tag reasoning
pub(crate) fn uses_think_tags(model: &str) -> bool {
    let model_lower = model.to_lowercase();

    if THINKING_MODELS.iter().any(|known| model_lower.contains(known)) {
        return true;
    }

    // r1 distills and fine-tunes
    model_lower.contains("-r1") || model_lower.starts_with("r1") || model_lower.contains("qwq")
}

/// Factory for creating stream adapters based on provider and model.
pub struct AdapterFactory;

impl AdapterFactory {
    /// Create an appropriate adapter for the given provider and model.
    ///
    /// # Arguments
    /// * `provider` - Provider name (openai, anthropic, ollama, gemini, or an
    ///   OpenAI-compatible gateway)
    /// * `model` - Model identifier (used for thinking capability detection)
    pub fn create(provider: &str, model: &str) -> Box<dyn StreamAdapter> {
        match provider.to_lowercase().as_str() {
            "anthropic" | "claude" | "claude-api" | "claude_api" => {
                Box::new(AnthropicAdapter::new())
            }

            "openai" | "openai-api" | "gpt" | "deepseek" | "openrouter" | "groq" | "mistral"
            | "xai" | "openai-compatible" | "lmstudio" | "vllm" => {
                Box::new(OpenAIAdapter::new(model))
            }

            "ollama" | "ollama-api" => Box::new(OllamaAdapter::new(model)),

            "gemini" | "google" | "google-ai" => Box::new(GeminiAdapter::new()),

            // Default to OpenAI adapter as it's the most compatible format
            _ => {
                tracing::warn!(
                    provider = %provider,
                    "unknown provider, defaulting to OpenAI-compatible adapter"
                );
                Box::new(OpenAIAdapter::new(model))
            }
        }
    }

    /// Get a list of supported provider names.
    pub fn supported_providers() -> &'static [&'static str] {
        &[
            "openai",
            "anthropic",
            "deepseek",
            "openrouter",
            "groq",
            "ollama",
            "gemini",
        ]
    }

    /// Check if a provider is supported.
    pub fn is_supported(provider: &str) -> bool {
        let provider_lower = provider.to_lowercase();
        matches!(
            provider_lower.as_str(),
            "anthropic"
                | "claude"
                | "claude-api"
                | "claude_api"
                | "openai"
                | "openai-api"
                | "gpt"
                | "deepseek"
                | "openrouter"
                | "groq"
                | "mistral"
                | "xai"
                | "openai-compatible"
                | "lmstudio"
                | "vllm"
                | "ollama"
                | "ollama-api"
                | "gemini"
                | "google"
                | "google-ai"
        )
    }

    /// Reasoning tag pair a provider/model embeds in its text output, if any.
    ///
    /// Providers with native reasoning channels (Anthropic thinking blocks,
    /// Gemini thought parts) never get tags.
    pub fn default_reasoning_tags(provider: &str, model: &str) -> Option<ReasoningTags> {
        match provider.to_lowercase().as_str() {
            "anthropic" | "claude" | "claude-api" | "claude_api" | "gemini" | "google"
            | "google-ai" => None,
            _ if uses_think_tags(model) => Some(ReasoningTags::think()),
            _ => None,
        }
    }
}
