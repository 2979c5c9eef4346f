use std::net::SocketAddr;
use std::sync::Arc;

use room_ai::settings::api_key_from_env;
use room_ai::{CredentialStore, GeminiClient, KeyringCredentialStore, load_settings};
use room_server::{AppState, app};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ADDR_ENV: &str = "ROOM_DESIGNER_ADDR";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings(None)?;
    let credentials: Arc<dyn CredentialStore> = Arc::new(KeyringCredentialStore::new());
    let api_key = match api_key_from_env() {
        Some(key) => Some(key),
        None => credentials.load().unwrap_or_else(|err| {
            warn!("could not read stored API key: {err}");
            None
        }),
    };
    if api_key.is_none() {
        warn!("no API key configured; set one with PUT /credential");
    }

    let client = GeminiClient::new(settings.generation.clone());
    let state = Arc::new(AppState::new(
        settings,
        Box::new(client),
        credentials,
        api_key,
    ));

    let address = match std::env::var(ADDR_ENV) {
        Ok(value) => value.parse::<SocketAddr>()?,
        Err(_) => SocketAddr::from(([127, 0, 0, 1], 3000)),
    };
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(%address, "room designer server listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
