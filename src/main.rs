use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use study_desk::config::Config;
use study_desk::db::StudyStorage;
use study_desk::router::{AppState, study_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        static_dir = %cfg.static_dir.display(),
        account = %cfg.account,
        insecure_cookie = cfg.insecure_cookie,
        loglevel = %cfg.loglevel
    );

    let key = cfg.session_key()?;
    let storage = StudyStorage::connect(&cfg.database_url).await?;
    info!("database ready");

    let state = AppState::new(
        storage,
        Arc::from(cfg.account.as_str()),
        key,
        cfg.insecure_cookie,
    );
    let app = study_router(state, cfg.static_assets());

    let listener = TcpListener::bind(cfg.listen_addr.as_str()).await?;
    info!("HTTP server listening on http://{}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
