use linksuggest_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};
use std::time::Duration;

pub mod config;
pub mod extract;
pub mod gemini;
pub mod openai_compat;
pub mod pipeline;
pub mod prompt;
pub mod rank;
pub mod sanitize;
pub mod segment;

pub use config::{ModelConfig, PipelineConfig, Provider};
pub use pipeline::{ArticlePipeline, RankedPipeline};

/// Client identifier sent with every page fetch.
pub const DEFAULT_USER_AGENT: &str = "AI-LinkSuggestionTool";

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            // Per-request timeouts (FetchRequest.timeout_ms) can still override this.
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_config(cfg: &PipelineConfig) -> Result<Self> {
        Self::new(&cfg.user_agent, Duration::from_millis(cfg.fetch_timeout_ms))
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let started = std::time::Instant::now();
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        let resp = rb.send().await.map_err(|e| Error::Fetch(describe(&req.url, &e)))?;
        let final_url = resp.url().to_string();
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{} returned HTTP {status}", req.url)));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(u64::MAX) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Fetch(describe(&req.url, &e)))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url = %req.url,
            status = status.as_u16(),
            bytes = bytes.len(),
            truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched page"
        );
        Ok(FetchResponse {
            final_url,
            status: status.as_u16(),
            content_type,
            bytes,
            truncated,
        })
    }
}

fn describe(url: &str, e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timeout fetching {url}: {e}")
    } else {
        format!("{url}: {e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn local_fetcher_sends_user_agent_and_returns_body() {
        let app = Router::new().route(
            "/",
            get(|headers: axum::http::HeaderMap| async move {
                let ua = headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                ([(header::CONTENT_TYPE, "text/html")], format!("<p>ua={ua}</p>"))
            }),
        );
        let addr = serve(app).await;

        let fetcher = LocalFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
        let resp = fetcher
            .fetch(&FetchRequest::new(format!("http://{addr}/")))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type.as_deref(), Some("text/html"));
        assert!(resp.text_lossy().contains("ua=AI-LinkSuggestionTool"));
        assert!(!resp.truncated);
    }

    #[tokio::test]
    async fn local_fetcher_reports_final_url_after_redirect() {
        let app = Router::new()
            .route(
                "/old",
                get(|| async { axum::response::Redirect::permanent("/new") }),
            )
            .route("/new", get(|| async { "<p>moved here</p>" }));
        let addr = serve(app).await;

        let fetcher = LocalFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
        let resp = fetcher
            .fetch(&FetchRequest::new(format!("http://{addr}/old")))
            .await
            .unwrap();
        assert_eq!(resp.final_url, format!("http://{addr}/new"));
        assert!(resp.text_lossy().contains("moved here"));
    }

    #[tokio::test]
    async fn local_fetcher_fails_on_non_success_status() {
        let app = Router::new().route("/gone", get(|| async { (StatusCode::NOT_FOUND, "nope") }));
        let addr = serve(app).await;

        let fetcher = LocalFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch(&FetchRequest::new(format!("http://{addr}/gone")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(err.to_string().contains("404"), "got: {err}");
    }

    #[tokio::test]
    async fn local_fetcher_times_out() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let addr = serve(app).await;

        let fetcher = LocalFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(30)).unwrap();
        let mut req = FetchRequest::new(format!("http://{addr}/slow"));
        req.timeout_ms = Some(200);
        let err = fetcher.fetch(&req).await.unwrap_err();
        assert!(err.to_string().contains("timeout"), "got: {err}");
    }

    #[tokio::test]
    async fn local_fetcher_caps_body_bytes() {
        let app = Router::new().route("/big", get(|| async { "x".repeat(10_000) }));
        let addr = serve(app).await;

        let fetcher = LocalFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
        let mut req = FetchRequest::new(format!("http://{addr}/big"));
        req.max_bytes = Some(100);
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.bytes.len(), 100);
        assert!(resp.truncated);
    }
}
