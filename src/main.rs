//! Leadway - lead capture backend for a consultancy marketing site

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadway::{
    config::Args,
    db::{LeadStore, MemoryStore, MongoClient, MongoStore},
    llm::{LlmBackend, OpenAiBackend},
    server, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_tracing(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Leadway");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
    info!("Narrative model: {} @ {}", args.ai_model, args.ai_base_url);
    info!("======================================");

    let store = open_store(&args).await?;
    let llm = narrative_backend(&args)?;

    let state = Arc::new(AppState::new(args, store, llm)?);
    server::run(state).await?;

    info!("Leadway stopped");
    Ok(())
}

fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("leadway={},info", args.log_level).into());

    if args.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// MongoDB in production; dev mode falls back to memory when it's unreachable
async fn open_store(args: &Args) -> anyhow::Result<Arc<dyn LeadStore>> {
    let opened = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => MongoStore::open(client).await,
        Err(e) => Err(e),
    };

    match opened {
        Ok(store) => {
            info!("MongoDB connected successfully");
            Ok(Arc::new(store))
        }
        Err(e) if args.dev_mode => {
            warn!("MongoDB unavailable (dev mode, using in-memory store): {}", e);
            Ok(Arc::new(MemoryStore::new()))
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            Err(e.into())
        }
    }
}

fn narrative_backend(args: &Args) -> anyhow::Result<Option<Arc<dyn LlmBackend>>> {
    let Some(api_key) = args.ai_api_key.clone().filter(|k| !k.is_empty()) else {
        warn!("AI_API_KEY not set - assessments will ship without a narrative");
        return Ok(None);
    };

    let backend: Arc<dyn LlmBackend> = Arc::new(OpenAiBackend::new(
        args.ai_base_url.clone(),
        args.ai_model.clone(),
        Some(api_key),
        Duration::from_millis(args.request_timeout_ms),
    )?);
    Ok(Some(backend))
}
