//! Promoter HTTP server.

use std::sync::Arc;

use promoter_core::FileStore;
use promoter_engine::{Engine, PromotionWorkflow};
use promoter_git::{GitCli, GitHubClient, OsFileStore, resolve_token};
use promoter_server::{AppState, ManagedRepo, ServerConfig, routes};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let token = resolve_token(config.github_token.as_deref())?;

    let git = Arc::new(GitCli::new(&config.repo_location).with_redacted_token(token.clone()));
    let repo = ManagedRepo::new(
        git.clone(),
        &config.repo_location,
        config.repo_url.clone(),
        Some(token.clone()),
    );
    info!(location = %config.repo_location.display(), "Preparing managed checkout");
    repo.prepare().await?;
    repo.ensure_author(&config.author).await?;

    let store: Arc<dyn FileStore> = Arc::new(OsFileStore::new(&config.repo_location));
    let engine = Engine::new(store, git, Arc::new(GitHubClient::new(token)))
        .with_status_concurrency(config.status_concurrency);
    let state = AppState::new(PromotionWorkflow::new(engine), repo);

    let refresher = config
        .refresh_interval
        .map(|interval| state.spawn_refresh(interval));

    let app = routes::router(state).layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    );

    info!("Starting server on {}", config.listen_addr);
    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = refresher {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
