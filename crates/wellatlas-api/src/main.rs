//! wellatlas HTTP API server.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wellatlas_api::config::{LogConfig, LogFormat};
use wellatlas_api::{build_router, AppState, ServerConfig};
use wellatlas_db::{log_pool_metrics, Database, PoolConfig, SeedOutcome};

/// Install the global subscriber. The returned guard flushes file output on drop.
fn init_logging(log: &LogConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wellatlas_api=debug,wellatlas_db=info,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log.file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("wellatlas-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        match log.format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init(),
            LogFormat::Text => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(log.ansi.unwrap_or(false)),
                )
                .init(),
        }
        Some(guard)
    } else {
        match log.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .init(),
            LogFormat::Text => {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = log.ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init();
            }
        }
        None
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log = LogConfig::from_env();
    let _file_guard = init_logging(&log);
    info!(
        log_format = ?log.format,
        log_file = log.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env()?;

    match config.rate_limit {
        Some(limit) => info!(
            "Rate limiting: enabled ({} requests per {} seconds)",
            limit.requests, limit.period_secs
        ),
        None => info!("Rate limiting: disabled"),
    }

    info!("Connecting to database...");
    let pool_config = PoolConfig::default().max_connections(config.db_max_connections);
    let db = Database::connect_with_config(&config.database_url, pool_config).await?;
    info!("Database connected");

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");
    log_pool_metrics(db.pool());

    if config.seed_demo_data {
        match db.seed_demo_if_empty().await? {
            SeedOutcome::Seeded {
                customers,
                sites,
                jobs,
            } => info!(customers, sites, jobs, "Demo data seeded"),
            SeedOutcome::Skipped => info!("Store already populated, demo seeding skipped"),
        }
    }

    let state = AppState::new(db, &config);
    let app = build_router(state, &config.allowed_origins);

    let addr = config.bind_addr();
    info!(
        addr = %addr,
        public_base_url = %config.public_base_url,
        site_order = %config.site_order,
        "Starting wellatlas-api"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
