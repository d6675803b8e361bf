//! CCR project portal server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use ccr_api::AppState;
use ccr_attachments::LocalStorage;
use ccr_auth::{MemorySessionStore, SessionStore};
use ccr_core::config::AppConfig;
use ccr_db::{Database, Stores};
use ccr_services::{AccountService, ServiceContext, ServiceSettings};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod health;

use health::{HealthChecker, HealthConfig};

/// Expired sessions are swept at this interval
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        company = %config.instance.company_name,
        "Starting CCR portal"
    );

    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");
    if config.database.run_migrations {
        db.migrate().await.context("failed to apply migrations")?;
    }

    let services = ServiceContext::new(
        Stores::postgres(db.pool().clone()),
        Arc::new(LocalStorage::new(&config.storage.media_root)),
        ServiceSettings::from_config(&config),
    );

    if let Some(ref admin) = config.auth.bootstrap_admin {
        let account = AccountService::new(&services)
            .ensure_admin(admin)
            .await
            .context("failed to create bootstrap administrator")?;
        info!(username = %account.user.username, "Administrator available");
    }

    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    spawn_session_sweeper(sessions.clone());

    let health = HealthChecker::new(HealthConfig::default())
        .with_database(db.clone())
        .with_media_root(&config.storage.media_root);

    let state = AppState::new(services, sessions, &config);
    let app = build_router(state, Arc::new(health), &config);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,ccr_server=debug,ccr_api=debug,ccr_services=debug,tower_http=debug".into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

fn build_router(state: AppState, health: Arc<HealthChecker>, config: &AppConfig) -> Router {
    ccr_api::router(state)
        .merge(health::routes(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_seconds,
                )))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

fn spawn_session_sweeper(sessions: Arc<dyn SessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.cleanup_expired() {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Expired sessions removed"),
                Err(e) => error!(error = %e, "Session sweep failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use ccr_attachments::MemoryStorage;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = AppConfig::default();
        let services = ServiceContext::new(
            Stores::memory(),
            Arc::new(MemoryStorage::new()),
            ServiceSettings::from_config(&config),
        );
        let state = AppState::new(services, Arc::new(MemorySessionStore::new()), &config);
        build_router(state, Arc::new(HealthChecker::new(HealthConfig::default())), &config)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_endpoint() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_portal_routes_are_mounted() {
        let response = test_app()
            .oneshot(Request::builder().uri("/dashboard/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/login/?next=%2Fdashboard%2F"
        );
    }
}
