//! Gemini (Generative Language API) embeddings + text generation.
//!
//! The key travels in the `x-goog-api-key` header, never in the URL, so reqwest error
//! messages (which include the URL) cannot leak it into logs or error envelopes.

use crate::config::ModelConfig;
use linksuggest_core::{Completer, Embedder, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    embed_model: String,
    completion_model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct EmbedReq {
    model: String,
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResp {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateReq {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, cfg: &ModelConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| Error::NotConfigured("missing GEMINI_API_KEY".to_string()))?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            embed_model: cfg.embed_model.clone(),
            completion_model: cfg.completion_model.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.base_url)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
        wrap: fn(String) -> Error,
    ) -> Result<R> {
        let resp = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| wrap(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(wrap(format!("gemini HTTP {status}")));
        }
        resp.json().await.map_err(|e| wrap(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Embedder for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let req = EmbedReq {
            model: format!("models/{}", self.embed_model),
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
        };
        let url = self.endpoint(&self.embed_model, "embedContent");
        let parsed: EmbedResp = self.post(url, &req, Error::Embedding).await?;
        if parsed.embedding.values.is_empty() {
            return Err(Error::Embedding("gemini returned an empty embedding".to_string()));
        }
        Ok(parsed.embedding.values)
    }
}

#[async_trait::async_trait]
impl Completer for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let req = GenerateReq {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };
        let url = self.endpoint(&self.completion_model, "generateContent");
        let parsed: GenerateResp = self.post(url, &req, Error::Llm).await?;
        // candidates[0].content.parts[*].text
        let out = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        Ok(out.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use axum::{extract::Path, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn cfg(addr: SocketAddr) -> ModelConfig {
        let mut c = ModelConfig::new(Provider::Gemini, Some("test-key".to_string()));
        c.base_url = format!("http://{addr}/");
        c.timeout_ms = 2_000;
        c
    }

    fn key_ok(headers: &HeaderMap) -> bool {
        headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) == Some("test-key")
    }

    async fn stub(
        Path(model_method): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        if !key_ok(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
        }
        if model_method == "text-embedding-004:embedContent" {
            if body["model"] != "models/text-embedding-004" {
                return (StatusCode::BAD_REQUEST, Json(serde_json::json!({})));
            }
            let text = body["content"]["parts"][0]["text"].as_str().unwrap_or("");
            return (
                StatusCode::OK,
                Json(serde_json::json!({"embedding": {"values": [text.len() as f32, 1.0]}})),
            );
        }
        if model_method == "gemini-2.5-flash:generateContent" {
            let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("");
            return (
                StatusCode::OK,
                Json(serde_json::json!({
                    "candidates": [{"content": {"parts": [
                        {"text": "  echo: "},
                        {"text": prompt}
                    ]}}]
                })),
            );
        }
        (StatusCode::NOT_FOUND, Json(serde_json::json!({})))
    }

    #[tokio::test]
    async fn embeds_and_generates_against_stub() {
        let app = Router::new().route("/v1beta/models/:model_method", post(stub));
        let addr = serve(app).await;
        let g = GeminiClient::new(reqwest::Client::new(), &cfg(addr)).unwrap();

        let v = g.embed("hello").await.unwrap();
        assert_eq!(v, vec![5.0, 1.0]);

        let out = g.complete("ping").await.unwrap();
        assert_eq!(out, "echo: ping");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_typed_errors() {
        let app = Router::new().route("/v1beta/models/:model_method", post(stub));
        let addr = serve(app).await;
        let mut c = cfg(addr);
        c.api_key = Some("wrong".to_string());
        let g = GeminiClient::new(reqwest::Client::new(), &c).unwrap();

        let e = g.embed("x").await.unwrap_err();
        assert!(matches!(e, Error::Embedding(_)));
        assert!(!e.to_string().contains("wrong"));
        let e = g.complete("x").await.unwrap_err();
        assert!(matches!(e, Error::Llm(_)));
    }

    #[test]
    fn missing_key_is_not_configured() {
        let c = ModelConfig::new(Provider::Gemini, None);
        let e = GeminiClient::new(reqwest::Client::new(), &c).unwrap_err();
        assert!(matches!(e, Error::NotConfigured(_)));
    }
}
