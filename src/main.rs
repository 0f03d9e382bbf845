// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::monitoring_repository::MonitoringRepository;
use crate::application::query_service::QueryService;
use crate::infrastructure::completion_client::AzureChatClient;
use crate::infrastructure::config::{load_app_config, MonitoringSettings};
use crate::infrastructure::session_store::InMemorySessionStore;
use crate::infrastructure::thingsboard_repository::ThingsBoardRepository;
use crate::infrastructure::zabbix_repository::ZabbixRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("monitoring_assistant=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn MonitoringRepository> = match &config.monitoring {
        MonitoringSettings::Thingsboard(settings) => {
            tracing::info!(url = %settings.url, "Using ThingsBoard monitoring platform");
            Arc::new(ThingsBoardRepository::new(settings)?)
        }
        MonitoringSettings::Zabbix(settings) => {
            tracing::info!(url = %settings.url, "Using Zabbix monitoring platform");
            Arc::new(ZabbixRepository::new(settings)?)
        }
    };
    let completion = Arc::new(AzureChatClient::new(config.completion.clone())?);

    // Create services (application layer)
    let query_service = QueryService::new(repository, completion, &config.assistant);

    // Create application state
    let state = Arc::new(AppState {
        query_service,
        sessions: Arc::new(InMemorySessionStore::new(Duration::from_secs(
            config.assistant.session_ttl_secs,
        ))),
        session_ttl_secs: config.assistant.session_ttl_secs,
    });

    // Build router (presentation layer)
    let router = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address `{}`", config.server.bind))?;
    tracing::info!(%addr, "Starting monitoring-assistant service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
