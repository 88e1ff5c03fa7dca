//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod app;
mod config;
mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::{AuthConfig, FileMailer, PgAuthRepository};
use platform::background::BackgroundTasks;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{AppParts, SystemInfo, build_router};
use crate::config::{ApiConfig, LogFormat};
use crate::middleware::RateLimitState;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// How often idle rate-limit buckets are dropped
const LIMITER_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;
    init_tracing(config.log_format);

    // Database connection
    let pool = platform::db::connect(&config.db).await?;

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let auth_repo = Arc::new(PgAuthRepository::new(pool.clone(), config.db.query_timeout));

    // Startup cleanup: expired tokens only take up space
    // Errors here should not prevent server startup
    if let Err(e) = auth::domain::repository::TokenRepository::delete_expired(&*auth_repo).await {
        tracing::warn!(error = %e, "Expired token cleanup failed, continuing anyway");
    }

    let mailer = Arc::new(FileMailer::new(&config.mail_dir, &config.mail_sender)?);
    tracing::info!(dir = %config.mail_dir.display(), "Mail is written to files");

    let mut auth_config = AuthConfig::default();
    if let Some(pepper) = &config.password_pepper {
        auth_config = auth_config.with_pepper(pepper.as_bytes());
    }

    let tasks = BackgroundTasks::new(&config.background);
    let rate_limit = RateLimitState::new(config.limiter.clone());
    spawn_limiter_purge(&rate_limit);

    let app = build_router(AppParts {
        pool,
        query_timeout: config.db.query_timeout,
        auth_repo,
        mailer,
        tasks: tasks.clone(),
        auth_config,
        rate_limit,
        frontend_origins: config.frontend_origins.clone(),
        system_info: SystemInfo::new(config.env.clone()),
    });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(addr = %addr, env = %config.env, "Starting server");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tasks.shutdown(config.background.drain_timeout).await;
    tracing::info!(addr = %addr, "Stopped server");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "api=info,auth=info,catalog=info,platform=info,tower_http=info".into()
    });
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

fn spawn_limiter_purge(state: &RateLimitState) {
    if !state.config.enabled {
        return;
    }
    let limiter = state.limiter.clone();
    let idle_ttl = state.config.idle_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = limiter.purge_idle(idle_ttl);
            if purged > 0 {
                tracing::debug!(purged, "Dropped idle rate-limit buckets");
            }
        }
    });
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!(signal = "SIGINT", "Shutting down server");
        },
        _ = terminate => {
            tracing::info!(signal = "SIGTERM", "Shutting down server");
        },
    }
}
