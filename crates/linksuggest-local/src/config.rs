//! Explicit configuration structs.
//!
//! Components take these by reference; nothing below reads the process environment.
//! The binary is responsible for populating them (clap + env).

use linksuggest_core::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Gemini,
    #[serde(rename = "openai_compat")]
    OpenAiCompat,
}

impl Provider {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai_compat" | "openai-compat" | "openai" => Ok(Provider::OpenAiCompat),
            other => Err(Error::NotConfigured(format!(
                "unknown provider {other:?} (allowed: gemini, openai_compat)"
            ))),
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::OpenAiCompat => "https://api.openai.com",
        }
    }

    pub fn default_embed_model(self) -> &'static str {
        match self {
            Provider::Gemini => "text-embedding-004",
            Provider::OpenAiCompat => "text-embedding-3-small",
        }
    }

    pub fn default_completion_model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAiCompat => "gpt-4o-mini",
        }
    }
}

/// Language-model credentials and endpoints, injected once at startup.
#[derive(Clone)]
pub struct ModelConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub base_url: String,
    pub embed_model: String,
    pub completion_model: String,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("api_key_present", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .field("embed_model", &self.embed_model)
            .field("completion_model", &self.completion_model)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl ModelConfig {
    pub fn new(provider: Provider, api_key: Option<String>) -> Self {
        Self {
            provider,
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url: provider.default_base_url().to_string(),
            embed_model: provider.default_embed_model().to_string(),
            completion_model: provider.default_completion_model().to_string(),
            timeout_ms: 30_000,
        }
    }

    /// Redacted view for diagnostics.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "provider": self.provider,
            "api_key_present": self.api_key.is_some(),
            "base_url": self.base_url,
            "embed_model": self.embed_model,
            "completion_model": self.completion_model,
            "timeout_ms": self.timeout_ms,
        })
    }

    /// Build the embedder and completer for the configured provider.
    pub fn build(
        &self,
        client: reqwest::Client,
    ) -> Result<(
        Arc<dyn linksuggest_core::Embedder>,
        Arc<dyn linksuggest_core::Completer>,
    )> {
        match self.provider {
            Provider::Gemini => {
                let c = crate::gemini::GeminiClient::new(client, self)?;
                Ok((Arc::new(c.clone()), Arc::new(c)))
            }
            Provider::OpenAiCompat => {
                let c = crate::openai_compat::OpenAiCompatClient::new(client, self)?;
                Ok((Arc::new(c.clone()), Arc::new(c)))
            }
        }
    }
}

/// Knobs for the fetch → extract → rank → prompt pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub fetch_timeout_ms: u64,
    pub user_agent: String,
    pub max_bytes: u64,
    /// Cap on paragraphs sent to the embedder (earliest kept).
    pub max_paragraphs: usize,
    pub top_candidates: usize,
    pub max_suggestions: usize,
    /// Max in-flight paragraph embedding requests.
    pub embed_concurrency: usize,
    pub target_embed_chars: usize,
    pub target_summary_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 10_000,
            user_agent: crate::DEFAULT_USER_AGENT.to_string(),
            max_bytes: 5_000_000,
            max_paragraphs: 64,
            top_candidates: crate::rank::DEFAULT_TOP_CANDIDATES,
            max_suggestions: crate::sanitize::MAX_SUGGESTIONS,
            embed_concurrency: 4,
            target_embed_chars: 2_000,
            target_summary_chars: 800,
        }
    }
}

impl PipelineConfig {
    /// Count knobs raised to at least 1.
    pub fn normalized(mut self) -> Self {
        self.max_paragraphs = self.max_paragraphs.max(1);
        self.top_candidates = self.top_candidates.max(1);
        self.embed_concurrency = self.embed_concurrency.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_accepts_aliases() {
        assert_eq!(Provider::parse("Gemini").unwrap(), Provider::Gemini);
        assert_eq!(
            Provider::parse(" openai-compat ").unwrap(),
            Provider::OpenAiCompat
        );
        assert!(matches!(
            Provider::parse("bard"),
            Err(Error::NotConfigured(_))
        ));
    }

    #[test]
    fn model_config_debug_and_summary_never_leak_key() {
        let cfg = ModelConfig::new(Provider::Gemini, Some("sk-secret".to_string()));
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("sk-secret"));
        let summary = cfg.summary().to_string();
        assert!(!summary.contains("sk-secret"));
        assert!(summary.contains("\"api_key_present\":true"));
    }

    #[test]
    fn blank_api_key_is_treated_as_absent() {
        let cfg = ModelConfig::new(Provider::OpenAiCompat, Some("   ".to_string()));
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.embed_model, "text-embedding-3-small");
    }

    #[test]
    fn provider_serializes_to_a_name_parse_accepts() {
        for p in [Provider::Gemini, Provider::OpenAiCompat] {
            let v = serde_json::to_value(p).unwrap();
            let name = v.as_str().unwrap();
            assert_eq!(Provider::parse(name).unwrap(), p, "round trip of {name}");
        }
        assert_eq!(
            serde_json::to_value(Provider::OpenAiCompat).unwrap(),
            "openai_compat"
        );
    }

    #[test]
    fn normalized_raises_zero_counts_to_one() {
        let cfg = PipelineConfig {
            max_paragraphs: 0,
            top_candidates: 0,
            embed_concurrency: 0,
            ..PipelineConfig::default()
        }
        .normalized();
        assert_eq!(cfg.max_paragraphs, 1);
        assert_eq!(cfg.top_candidates, 1);
        assert_eq!(cfg.embed_concurrency, 1);
        assert_eq!(PipelineConfig::default().normalized().max_paragraphs, 64);
    }

    #[test]
    fn pipeline_defaults_match_reference_behaviour() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.fetch_timeout_ms, 10_000);
        assert_eq!(cfg.user_agent, "AI-LinkSuggestionTool");
        assert_eq!(cfg.top_candidates, 6);
        assert_eq!(cfg.max_suggestions, 3);
        assert_eq!(cfg.target_embed_chars, 2_000);
        assert_eq!(cfg.target_summary_chars, 800);
    }
}
