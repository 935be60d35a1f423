//! Embedding-based paragraph ranking.
//!
//! The target page is embedded once; every candidate paragraph is embedded with bounded
//! concurrency and scored by cosine similarity against it.

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use linksuggest_core::{Embedder, Error, Paragraph, ParagraphEmbedding, Result, ScoredCandidate};

pub const DEFAULT_TOP_CANDIDATES: usize = 6;

const EPSILON: f64 = 1e-12;

/// `dot(a, b) / (|a| * |b| + 1e-12)` over the common prefix of both vectors.
///
/// Accumulates in f64. Vectors holding NaN or infinities score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let score = dot / (na.sqrt() * nb.sqrt() + EPSILON);
    if score.is_finite() {
        score as f32
    } else {
        0.0
    }
}

/// Score paragraphs against the target vector, best first.
///
/// Stable: equal scores keep original paragraph order.
pub fn rank_by_similarity(
    paragraphs: &[Paragraph],
    embeddings: &[ParagraphEmbedding],
    target: &[f32],
    top_k: usize,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = embeddings
        .iter()
        .filter_map(|e| {
            let p = paragraphs.iter().find(|p| p.index == e.index)?;
            Some(ScoredCandidate {
                index: e.index,
                text: p.text.clone(),
                score: cosine(target, &e.vector),
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.index.cmp(&b.index))
    });
    scored.truncate(top_k);
    scored
}

/// Embed every paragraph, at most `concurrency` requests in flight.
///
/// Output order follows `paragraphs`, not completion order. The first failure aborts.
pub async fn embed_paragraphs(
    embedder: &dyn Embedder,
    paragraphs: &[Paragraph],
    concurrency: usize,
) -> Result<Vec<ParagraphEmbedding>> {
    let futures: Vec<BoxFuture<'_, Result<ParagraphEmbedding>>> = paragraphs
        .iter()
        .map(|p| {
            async move {
                let vector = embedder.embed(&p.text).await?;
                Ok::<_, Error>(ParagraphEmbedding {
                    index: p.index,
                    vector,
                })
            }
            .boxed()
        })
        .collect();
    stream::iter(futures)
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
