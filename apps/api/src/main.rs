mod auth;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod pdf;
mod render;
mod routes;
mod state;
mod storage;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::generation::generator::ResumeService;
use crate::generation::retrieval::Retrieval;
use crate::generation::summary::LlmSummaryEnhancer;
use crate::llm_client::{Completion, LlmClient};
use crate::pdf::{ChromiumPdfRenderer, PdfOptions};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{
    BlobStore, MemoryBlobStore, MemoryMetadataStore, MetadataStore, PgMetadataStore, S3BlobStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vitae API v{}", env!("CARGO_PKG_VERSION"));

    // Blob storage: S3-compatible bucket, or process memory for local runs
    let blobs: Arc<dyn BlobStore> = match &config.s3 {
        Some(s3) => {
            info!("Blob storage: bucket '{}'", config.bucket_name());
            Arc::new(S3BlobStore::from_config(s3).await)
        }
        None => {
            warn!("S3_BUCKET not set, storing resumes in memory");
            Arc::new(MemoryBlobStore::new())
        }
    };

    // Metadata: PostgreSQL, or process memory
    let metadata: Arc<dyn MetadataStore> = match &config.database_url {
        Some(url) => Arc::new(PgMetadataStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set, keeping resume metadata in memory");
            Arc::new(MemoryMetadataStore::new())
        }
    };

    // LLM client: shared by the summary enhancer and the assistant route
    let llm = LlmClient::new(
        config.openai_api_key.as_ref().map(|k| k.expose().to_string()),
        config.llm.clone(),
    )
    .context("Failed to build LLM client")?;
    let llm_configured = llm.is_configured();
    info!(
        "LLM client initialized (model: {}, configured: {llm_configured})",
        llm.model()
    );
    let completion: Arc<dyn Completion> = Arc::new(llm);

    let mut resumes = ResumeService::new(blobs.clone(), metadata.clone(), config.signed_url_ttl);
    if llm_configured {
        resumes = resumes.with_enhancer(Arc::new(LlmSummaryEnhancer::new(completion.clone())));
    }
    if config.generate_pdf {
        let options = PdfOptions {
            timeout: config.pdf_timeout,
            ..PdfOptions::default()
        };
        resumes = resumes.with_pdf_renderer(Arc::new(ChromiumPdfRenderer::new(
            &config.chromium_path,
            options,
        )));
    }

    info!("PDF export: {}", if resumes.pdf_enabled() { "on" } else { "off" });

    let retrieval = Retrieval::new(blobs, metadata, config.preview_url_ttl);
    let auth = config
        .jwt_secret
        .as_ref()
        .map(|secret| Arc::new(TokenVerifier::new(secret.expose())));

    let cors = build_cors(config.frontend_origin.as_deref())?;

    // Build app state
    let state = AppState {
        resumes: Arc::new(resumes),
        retrieval: Arc::new(retrieval),
        completion,
        auth,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Restricts CORS to `FRONTEND_ORIGIN` when set; otherwise any origin.
fn build_cors(origin: Option<&str>) -> Result<CorsLayer> {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin)
                .with_context(|| format!("FRONTEND_ORIGIN is not a valid origin: '{origin}'"))?,
        ),
        None => AllowOrigin::any(),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
