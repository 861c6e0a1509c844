use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use onboarding_wizard::config::ServerConfig;
use onboarding_wizard::onboarding::{OnboardingManager, OnboardingRouteState, onboarding_routes};
use onboarding_wizard::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Invalid configuration")?;

    // Initialize tracing. The guard flushes the file writer on exit.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _log_guard = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "onboarding.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
            None
        }
    };

    eprintln!("Onboarding Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Wizard API: http://{}:{}/api/onboarding", config.bind, config.port);
    eprintln!("   Admin API:  http://{}:{}/api/admin/config", config.bind, config.port);
    eprintln!("   Database:   {}", config.db_path.display());

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── Server ───────────────────────────────────────────────────────────
    let manager = Arc::new(OnboardingManager::new(db, config.bcrypt_cost));
    let app = onboarding_routes(OnboardingRouteState { manager });

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Onboarding server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
