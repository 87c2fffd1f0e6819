//! Web server for the legal assistant.
//!
//! Serves a single page plus a JSON API for uploads, chat and recent bills.
//! Visitors are told apart by the `x-session-id` header.

mod handlers;
mod routes;
mod templates;

pub use routes::create_router;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::assistant::AssistantService;
use crate::config::Settings;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub assistant: AssistantService,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::with_service(
            settings,
            AssistantService::from_settings(settings)?,
        ))
    }

    pub fn with_service(settings: &Settings, assistant: AssistantService) -> Self {
        Self {
            settings: Arc::new(settings.clone()),
            assistant,
        }
    }
}

/// Bind a listener. `host` may be an IP address or a hostname.
pub async fn bind_listener(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| anyhow::anyhow!("Cannot bind {}:{}: {}", host, port, e))
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let listener = bind_listener(host, port).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
