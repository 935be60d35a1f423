//! HTTP surface for link suggestions.
//!
//! `POST /api/generate` takes `{sourceUrl, targetUrl, anchorText}` and answers with
//! `{suggestions: [...]}` or an `{error}` envelope (400 for caller mistakes, 500 otherwise).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use linksuggest_core::{Error, SuggestRequest, SuggestResponse};
use linksuggest_local::ArticlePipeline;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<dyn ArticlePipeline>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error envelope with its status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            // Client-facing messages are passed through verbatim ("Invalid URLs", ...).
            Error::InvalidUrl(m) | Error::Extract(m) | Error::BadRequest(m) => Self::bad_request(m),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(pipeline: Arc<dyn ArticlePipeline>) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/healthz", get(healthz))
        .with_state(AppState { pipeline })
}

async fn healthz() -> &'static str {
    "ok"
}

async fn generate(
    State(state): State<AppState>,
    body: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| {
        tracing::error!(status = 400u16, error = %rejection.body_text(), "rejected request body");
        ApiError::from(Error::BadRequest(rejection.body_text()))
    })?;

    match state.pipeline.run(&req).await {
        Ok(suggestions) => Ok(Json(SuggestResponse { suggestions })),
        Err(err) => {
            let api = ApiError::from(err);
            tracing::error!(
                status = api.status().as_u16(),
                source_url = %req.source_url,
                target_url = %req.target_url,
                error = %api.message(),
                "suggestion generation failed"
            );
            Err(api)
        }
    }
}

/// Install the global fmt subscriber; `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
