use crate::config::ModelConfig;
use linksuggest_core::{Completer, Embedder, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible `/v1/embeddings` + `/v1/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    embed_model: String,
    completion_model: String,
    timeout: Duration,
}

impl OpenAiCompatClient {
    pub fn new(client: reqwest::Client, cfg: &ModelConfig) -> Result<Self> {
        if cfg.base_url.trim().is_empty() {
            return Err(Error::NotConfigured(
                "missing base url for openai_compat".to_string(),
            ));
        }
        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
            embed_model: cfg.embed_model.clone(),
            completion_model: cfg.completion_model.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url.trim_end_matches('/'))
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut rb = self
            .client
            .post(self.endpoint(path))
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(k) = &self.api_key {
            rb = rb.header(reqwest::header::AUTHORIZATION, format!("Bearer {k}"));
        }
        rb
    }
}

#[async_trait::async_trait]
impl Completer for OpenAiCompatClient {
    fn name(&self) -> &'static str {
        "openai_compat"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let req = ChatCompletionsRequest {
            model: self.completion_model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: Some(false),
        };

        let resp = self
            .request("chat/completions")
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "openai_compat chat.completions HTTP {status}"
            )));
        }

        let parsed: ChatCompletionsResponse =
            resp.json().await.map_err(|e| Error::Llm(e.to_string()))?;
        Ok(parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(|c| c.trim().to_string())
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiCompatClient {
    fn name(&self) -> &'static str {
        "openai_compat"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let req = EmbeddingsRequest {
            model: self.embed_model.clone(),
            input: text.to_string(),
        };
        let resp = self
            .request("embeddings")
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Embedding(format!(
                "openai_compat embeddings HTTP {status}"
            )));
        }
        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Embedding("openai_compat returned no embedding".to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    /// Null for refusals and tool-only replies.
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}
