use park_easy::api;
use park_easy::config;
use park_easy::state::AppState;
use park_easy::store::{InMemoryStore, load_snapshot_from_path};
use std::net::SocketAddr;
use std::sync::Arc;

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level()?);
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "park-easy starting"
    );

    let stats_options = config.stats_options()?;
    let store = match config.snapshot_path() {
        Some(path) => match load_snapshot_from_path(path).and_then(InMemoryStore::from_snapshot) {
            Ok(store) => {
                tracing::info!(path = %path.display(), "Store seeded from snapshot");
                store
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "Failed to seed store from snapshot, starting empty");
                InMemoryStore::new()
            }
        },
        None => {
            tracing::info!("No snapshot configured, starting with an empty store");
            InMemoryStore::new()
        }
    };

    let state = Arc::new(AppState::new(Arc::new(store), stats_options));
    let app = api::router(state);
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
