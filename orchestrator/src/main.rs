use std::sync::Arc;

use tracing::info;
use warp::Filter;

mod agents;
mod api;
mod config;
mod db;
mod error;
mod index;
mod llm;
mod middleware;
mod models;
mod prompts;
mod redis_client;
mod worker;
mod workflow;

use crate::agents::faq::FaqGenerator;
use crate::agents::questions::QuestionGenerator;
use crate::index::{HttpSemanticIndex, SemanticIndex};
use crate::llm::{ChatModel, OpenAiChatModel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting LegalGPT Orchestrator");

    // Load configuration
    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    // Initialize database pool
    let db_pool = db::create_pool(&config.database_url).await?;
    info!("Database connection pool created");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    info!("Database migrations applied");

    // Initialize Redis client
    let redis = redis_client::RedisClient::new(&config.redis_url).await?;
    info!("Redis connection established");

    // Construct the inference and index clients and wire up the assistant
    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY must be set"))?;
    let model: Arc<dyn ChatModel> =
        Arc::new(OpenAiChatModel::new(config.openai_base_url.clone(), api_key.clone()));
    let semantic_index: Arc<dyn SemanticIndex> =
        Arc::new(HttpSemanticIndex::new(&config, api_key));
    let assistant = Arc::new(workflow::LegalAssistant::new(
        model.clone(),
        semantic_index.clone(),
        &config,
    ));
    let faq_store = db::FaqStore::new(db_pool.clone());

    // Spawn the background content-generation worker
    let content_worker = worker::ContentWorker::new(
        redis.clone(),
        faq_store.clone(),
        FaqGenerator::new(model.clone(), config.primary_model.clone()),
        QuestionGenerator::new(model.clone(), config.primary_model.clone()),
        semantic_index.clone(),
    );
    tokio::spawn(content_worker.run());
    info!("Content-generation worker spawned");

    // Build API routes
    let api_routes = api::routes(assistant, faq_store, redis.clone(), semantic_index)
        .recover(error::handle_rejection)
        .with(warp::log("api"))
        .with(middleware::cors());

    // Health check route
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "healthy"})));

    // Metrics route
    let metrics = warp::path("metrics").and(warp::get()).map(|| {
        use prometheus::{Encoder, TextEncoder};
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer).unwrap();
        warp::reply::with_header(buffer, "Content-Type", encoder.format_type())
    });

    let routes = health.or(metrics).or(api_routes);

    // Start server
    let addr = ([0, 0, 0, 0], config.port);
    info!("Server listening on {}", addr.1);

    warp::serve(routes).run(addr).await;

    Ok(())
}
