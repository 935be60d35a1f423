//! Request pipeline: fetch → extract → segment → rank → prompt → complete → sanitize.

use crate::config::PipelineConfig;
use crate::extract::{extract_article, truncate_chars};
use crate::prompt::{build_prompt, target_embedding_text, PromptInput};
use crate::rank::{embed_paragraphs, rank_by_similarity};
use crate::sanitize::parse_suggestions_capped;
use crate::segment::split_paragraphs;
use linksuggest_core::{
    Completer, Embedder, Error, ExtractedArticle, FetchBackend, FetchRequest, Result,
    ScoredCandidate, SuggestRequest, Suggestion,
};
use std::sync::Arc;
use std::time::Instant;

pub const NO_PARAGRAPHS: &str = "No valid paragraphs found in source article";

/// One strategy for turning a request into suggestions.
#[async_trait::async_trait]
pub trait ArticlePipeline: Send + Sync {
    /// Fetch `url` and reduce it to readable text.
    async fn extract(&self, url: &str) -> Result<ExtractedArticle>;

    /// Pick the source passages most related to the target.
    async fn rank(
        &self,
        source: &ExtractedArticle,
        target: &ExtractedArticle,
    ) -> Result<Vec<ScoredCandidate>>;

    fn build_prompt(
        &self,
        req: &SuggestRequest,
        target: &ExtractedArticle,
        candidates: &[ScoredCandidate],
    ) -> String;

    /// Single completion round trip; returns the model's raw text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn max_suggestions(&self) -> usize {
        crate::sanitize::MAX_SUGGESTIONS
    }

    async fn run(&self, req: &SuggestRequest) -> Result<Vec<Suggestion>> {
        req.validate()?;
        let started = Instant::now();

        let (source, target) =
            tokio::try_join!(self.extract(&req.source_url), self.extract(&req.target_url))?;
        tracing::debug!(
            source_engine = source.engine,
            source_chars = source.text.len(),
            target_engine = target.engine,
            target_chars = target.text.len(),
            "extracted articles"
        );

        let candidates = self.rank(&source, &target).await?;
        let prompt = self.build_prompt(req, &target, &candidates);
        let raw = self.generate(&prompt).await?;
        let suggestions = parse_suggestions_capped(&raw, self.max_suggestions());

        tracing::info!(
            source_url = %req.source_url,
            target_url = %req.target_url,
            candidates = candidates.len(),
            suggestions = suggestions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated suggestions"
        );
        Ok(suggestions)
    }
}

/// Readability extraction + embedding-ranked candidates.
#[derive(Clone)]
pub struct RankedPipeline {
    fetcher: Arc<dyn FetchBackend>,
    embedder: Arc<dyn Embedder>,
    completer: Arc<dyn Completer>,
    cfg: PipelineConfig,
}

impl RankedPipeline {
    pub fn new(
        fetcher: Arc<dyn FetchBackend>,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        cfg: PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            embedder,
            completer,
            cfg,
        }
    }
}

#[async_trait::async_trait]
impl ArticlePipeline for RankedPipeline {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle> {
        let mut req = FetchRequest::new(url);
        req.timeout_ms = Some(self.cfg.fetch_timeout_ms);
        req.max_bytes = Some(self.cfg.max_bytes);
        let resp = self.fetcher.fetch(&req).await?;
        if resp.truncated {
            tracing::warn!(
                url,
                max_bytes = self.cfg.max_bytes,
                "page body truncated before extraction"
            );
        }
        let article = extract_article(&resp.text_lossy());
        tracing::debug!(
            url,
            final_url = %resp.final_url,
            status = resp.status,
            content_type = resp.content_type.as_deref().unwrap_or(""),
            engine = article.engine,
            "extracted page"
        );
        Ok(article)
    }

    async fn rank(
        &self,
        source: &ExtractedArticle,
        target: &ExtractedArticle,
    ) -> Result<Vec<ScoredCandidate>> {
        let mut paragraphs = split_paragraphs(&source.text);
        if paragraphs.is_empty() {
            return Err(Error::Extract(NO_PARAGRAPHS.to_string()));
        }
        if paragraphs.len() > self.cfg.max_paragraphs {
            tracing::debug!(
                total = paragraphs.len(),
                kept = self.cfg.max_paragraphs,
                "capping candidate paragraphs"
            );
            paragraphs.truncate(self.cfg.max_paragraphs);
        }

        let target_text = target_embedding_text(
            target.title.as_deref(),
            &target.text,
            self.cfg.target_embed_chars,
        );
        let (target_vec, embeddings) = tokio::try_join!(
            self.embedder.embed(&target_text),
            embed_paragraphs(
                self.embedder.as_ref(),
                &paragraphs,
                self.cfg.embed_concurrency
            ),
        )?;
        tracing::debug!(
            embedder = self.embedder.name(),
            paragraphs = paragraphs.len(),
            dims = target_vec.len(),
            "embedded target and paragraphs"
        );

        Ok(rank_by_similarity(
            &paragraphs,
            &embeddings,
            &target_vec,
            self.cfg.top_candidates,
        ))
    }

    fn build_prompt(
        &self,
        req: &SuggestRequest,
        target: &ExtractedArticle,
        candidates: &[ScoredCandidate],
    ) -> String {
        build_prompt(&PromptInput {
            anchor_text: &req.anchor_text,
            target_url: &req.target_url,
            target_summary: truncate_chars(&target.text, self.cfg.target_summary_chars),
            candidates,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.completer.complete(prompt).await
    }

    fn max_suggestions(&self) -> usize {
        self.cfg.max_suggestions
    }
}
