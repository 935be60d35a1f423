use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("{0}")]
    Extract(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("llm failed: {0}")]
    Llm(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    /// Request body could not be read as a suggestion request.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl Error {
    /// Errors caused by the caller's input rather than by us or an upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_) | Error::Extract(_) | Error::BadRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// True only for absolute URLs with an `http` or `https` scheme.
///
/// Pure parse: no DNS, no network.
pub fn is_valid_http_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(u) => matches!(u.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub anchor_text: String,
}

impl SuggestRequest {
    pub fn validate(&self) -> Result<()> {
        if is_valid_http_url(&self.source_url) && is_valid_http_url(&self.target_url) {
            Ok(())
        } else {
            Err(Error::InvalidUrl("Invalid URLs".to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub original_text: String,
    pub suggested_change: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedArticle {
    pub title: Option<String>,
    pub text: String,
    /// Which extraction strategy produced `text`.
    pub engine: &'static str,
}

impl ExtractedArticle {
    pub fn empty() -> Self {
        Self {
            title: None,
            text: String::new(),
            engine: "empty",
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.text.chars().any(|c| !c.is_whitespace())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParagraphEmbedding {
    pub index: usize,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub index: usize,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the whole request (connect + body).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            max_bytes: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Body was cut at `FetchRequest::max_bytes`.
    pub truncated: bool,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// Maps text to a fixed-dimension vector.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &'static str;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Single-shot text completion: one prompt in, final text out.
#[async_trait::async_trait]
pub trait Completer: Send + Sync {
    fn name(&self) -> &'static str;
    async fn complete(&self, prompt: &str) -> Result<String>;
}
