use std::sync::Arc;

use answer_pipeline::{BatchOrchestrator, DefaultPipelineServices, PipelineConfig, RowPipeline};
use api_router::{api_routes_v1, api_state::ApiState};
use axum::Router;
use common::{cache::AnswerCache, utils::config::get_config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    std::fs::create_dir_all(config.upload_dir())?;
    std::fs::create_dir_all(config.output_dir())?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let services = Arc::new(DefaultPipelineServices::new(
        openai_client,
        config.clone(),
    )?);

    let cache = AnswerCache::new(config.cache_dir())?;
    let pipeline = Arc::new(RowPipeline::new(
        cache,
        config.scratch_dir(),
        PipelineConfig::from_app_config(&config),
        services,
    )?);
    let orchestrator = Arc::new(BatchOrchestrator::new(pipeline));

    let api_state = ApiState::new(config.clone(), orchestrator);

    // Create Axum router
    let app = Router::new()
        .nest("/api/v1", api_routes_v1(&api_state))
        .with_state(api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
