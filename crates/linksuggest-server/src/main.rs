use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linksuggest_core::{SuggestRequest, SuggestResponse};
use linksuggest_local::{
    ArticlePipeline, LocalFetcher, ModelConfig, PipelineConfig, Provider, RankedPipeline,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "linksuggest")]
#[command(about = "Suggest where to insert a hyperlink to a target page", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve `POST /api/generate` over HTTP.
    Serve(ServeCmd),
    /// Run one suggestion request and print the JSON response.
    Suggest(SuggestCmd),
    /// Print the resolved configuration (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version,
}

#[derive(clap::Args, Debug)]
struct ModelArgs {
    /// Model provider: `gemini` or `openai_compat`.
    #[arg(long, env = "LINKSUGGEST_PROVIDER", default_value = "gemini")]
    provider: String,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Override the provider's API base URL.
    #[arg(long, env = "LINKSUGGEST_BASE_URL")]
    base_url: Option<String>,
    #[arg(long, env = "LINKSUGGEST_EMBED_MODEL")]
    embed_model: Option<String>,
    #[arg(long, env = "LINKSUGGEST_MODEL")]
    model: Option<String>,
    #[arg(long, env = "LINKSUGGEST_LLM_TIMEOUT_MS", default_value_t = 30_000)]
    llm_timeout_ms: u64,
}

impl ModelArgs {
    fn resolve(&self) -> Result<ModelConfig> {
        let provider = Provider::parse(&self.provider)?;
        // LINKSUGGEST_API_KEY is the provider-neutral spelling.
        let key = self
            .api_key
            .clone()
            .or_else(|| std::env::var("LINKSUGGEST_API_KEY").ok());
        let mut cfg = ModelConfig::new(provider, key);
        if let Some(u) = self.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
            cfg.base_url = u.trim().to_string();
        }
        if let Some(m) = self.embed_model.as_deref().filter(|s| !s.trim().is_empty()) {
            cfg.embed_model = m.trim().to_string();
        }
        if let Some(m) = self.model.as_deref().filter(|s| !s.trim().is_empty()) {
            cfg.completion_model = m.trim().to_string();
        }
        cfg.timeout_ms = self.llm_timeout_ms;
        Ok(cfg)
    }
}

#[derive(clap::Args, Debug)]
struct PipelineArgs {
    #[arg(long, env = "LINKSUGGEST_FETCH_TIMEOUT_MS", default_value_t = 10_000)]
    fetch_timeout_ms: u64,
    /// Cap on source paragraphs sent to the embedder (earliest kept).
    #[arg(long, env = "LINKSUGGEST_MAX_PARAGRAPHS", default_value_t = 64)]
    max_paragraphs: usize,
    /// Max in-flight paragraph embedding requests.
    #[arg(long, env = "LINKSUGGEST_EMBED_CONCURRENCY", default_value_t = 4)]
    embed_concurrency: usize,
}

impl PipelineArgs {
    fn resolve(&self) -> PipelineConfig {
        PipelineConfig {
            fetch_timeout_ms: self.fetch_timeout_ms,
            max_paragraphs: self.max_paragraphs,
            embed_concurrency: self.embed_concurrency,
            ..PipelineConfig::default()
        }
        .normalized()
    }
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    #[arg(long, env = "LINKSUGGEST_BIND", default_value = "127.0.0.1:3000")]
    bind: String,
    #[command(flatten)]
    model: ModelArgs,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(clap::Args, Debug)]
struct SuggestCmd {
    #[arg(long)]
    source_url: String,
    #[arg(long)]
    target_url: String,
    #[arg(long)]
    anchor_text: String,
    #[command(flatten)]
    model: ModelArgs,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    #[command(flatten)]
    model: ModelArgs,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn build_pipeline(model: &ModelArgs, pipeline: &PipelineArgs) -> Result<RankedPipeline> {
    let model_cfg = model.resolve()?;
    let pipeline_cfg = pipeline.resolve();
    tracing::debug!(model = ?model_cfg, pipeline = ?pipeline_cfg, "resolved configuration");

    let fetcher = LocalFetcher::from_config(&pipeline_cfg)?;
    let model_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(model_cfg.timeout_ms))
        .build()
        .context("build model http client")?;
    let (embedder, completer) = model_cfg.build(model_client)?;
    Ok(RankedPipeline::new(
        Arc::new(fetcher),
        embedder,
        completer,
        pipeline_cfg,
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    linksuggest_server::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let pipeline = build_pipeline(&args.model, &args.pipeline)?;
            let app = linksuggest_server::router(Arc::new(pipeline));
            let listener = tokio::net::TcpListener::bind(&args.bind)
                .await
                .with_context(|| format!("bind {}", args.bind))?;
            tracing::info!(addr = %listener.local_addr()?, "listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::Suggest(args) => {
            let pipeline = build_pipeline(&args.model, &args.pipeline)?;
            let req = SuggestRequest {
                source_url: args.source_url,
                target_url: args.target_url,
                anchor_text: args.anchor_text,
            };
            let suggestions = pipeline.run(&req).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&SuggestResponse { suggestions })?
            );
        }
        Commands::Doctor(args) => {
            let model_cfg = args.model.resolve()?;
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "doctor",
                "name": "linksuggest",
                "version": env!("CARGO_PKG_VERSION"),
                "model": model_cfg.summary(),
                "pipeline": args.pipeline.resolve(),
            });
            println!("{v}");
        }
        Commands::Version => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "name": "linksuggest",
                "version": env!("CARGO_PKG_VERSION"),
            });
            println!("{v}");
        }
    }
    Ok(())
}
