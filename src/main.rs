use anyhow::Context;
use maternia::api::{self, app_state::AppState};
use maternia::chatbot::Chatbot;
use maternia::clock::SystemClock;
use maternia::config::loader::ConfigLoader;
use maternia::observability::{AppMetrics, ObservabilityState, init_tracing};
use maternia::sms::create_sms_sender;
use maternia::storage::StorageFactory;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ConfigLoader::load().context("loading configuration")?;
    ConfigLoader::validate(&config)?;
    let _log_guard = init_tracing(&config.logging)?;

    info!(environment = %config.environment, "Starting Maternia...");

    let repositories = StorageFactory::create(&config.database).await?;
    info!("Storage initialized: {}", repositories.backend.name());

    let chatbot = Arc::new(Chatbot::load(&config.chatbot)?);

    let metrics = Arc::new(AppMetrics::default());
    let sms = create_sms_sender(&config.sms, metrics.clone())?;

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics.clone(),
        repositories.backend.clone(),
        sms.is_configured(),
    ));

    let app_state = AppState::new(
        &config,
        &repositories,
        chatbot,
        sms,
        metrics,
        Arc::new(SystemClock),
    );
    let router = api::create_app(app_state, observability_state);
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
