//! Powrum Forum Server
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use forum_auth::secrets::{EnvSecretSurface, SecretProvisioner};
use forum_auth::{PersistenceCapability, SessionService};
use forum_core::config::AppConfig;
use forum_core::error::AppError;
use forum_database::postgres::{
    PgAccountStore, PgEphemeralStore, PgSessionStore, PgSettingStore,
};
use forum_database::{AccountStore, EphemeralStore, SessionStore, SettingStore};
use forum_realtime::{ConnectionRegistry, PushGateway, SessionBridge};
use forum_worker::{BootstrapReconciler, MaintenanceScheduler, MaintenanceSweeper};

/// Secret names on the configuration surface.
const SESSION_SIGNING_KEY: &str = "session_signing_key";
const PUSH_PUBLIC_KEY: &str = "push_public_key";
const PUSH_PRIVATE_KEY: &str = "push_private_key";

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load and validate configuration from files and environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("POWRUM_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env)?;
    // A missing database connection string is fatal; there is no degraded
    // mode without a database.
    config.validate()?;
    Ok(config)
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Powrum v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Provision process-wide secrets ───────────────────
    let capability = PersistenceCapability::from_flag(config.secrets.persist_generated);
    let surface = Arc::new(EnvSecretSurface::new(capability, &config.secrets.env_file));
    let provisioner = SecretProvisioner::new(surface);

    let signing_key = provisioner.ensure_secret(SESSION_SIGNING_KEY)?;
    let push_keys = provisioner.ensure_push_keys(PUSH_PUBLIC_KEY, PUSH_PRIVATE_KEY)?;
    tracing::info!("Secrets provisioned");

    // ── Step 2: Database connection + migrations ─────────────────
    let db_pool = forum_database::connection::create_pool(&config.database).await?;
    forum_database::migration::run_migrations(&db_pool).await?;

    // ── Step 3: Stores ───────────────────────────────────────────
    let accounts: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(db_pool.clone()));
    let settings: Arc<dyn SettingStore> = Arc::new(PgSettingStore::new(db_pool.clone()));
    let session_store: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(db_pool.clone()));
    let ephemeral: Arc<dyn EphemeralStore> = Arc::new(PgEphemeralStore::new(db_pool.clone()));

    // ── Step 4: Session layer ────────────────────────────────────
    let sessions = SessionService::new(
        Arc::clone(&session_store),
        &signing_key,
        config.session.clone(),
    );

    // ── Step 5: Realtime registry + bridge ───────────────────────
    let registry = Arc::new(ConnectionRegistry::new());
    let bridge = Arc::new(SessionBridge::new(
        sessions.clone(),
        Arc::clone(&registry),
        config.realtime.channel_buffer_size,
    ));
    let push = Arc::new(PushGateway::new());

    // ── Step 6: Bootstrap reconciliation (once, DB is ready) ─────
    let reconciler = BootstrapReconciler::new(
        Arc::clone(&settings),
        Arc::clone(&accounts),
        Arc::clone(&push),
        push_keys,
        config.secrets.push_contact.clone(),
    );
    reconciler.reconcile().await?;

    // ── Step 7: Maintenance scheduler ────────────────────────────
    let scheduler = if config.maintenance.enabled {
        let sweeper = Arc::new(MaintenanceSweeper::new(
            Arc::clone(&ephemeral),
            Arc::clone(&accounts),
            Arc::clone(&session_store),
            config.retention.clone(),
        ));
        let scheduler = MaintenanceScheduler::new(sweeper, config.maintenance.clone()).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Maintenance scheduler disabled");
        None
    };

    // ── Step 8: HTTP server ──────────────────────────────────────
    let state = forum_api::AppState {
        config: Arc::new(config.clone()),
        sessions,
        registry: Arc::clone(&registry),
        bridge,
        push,
        accounts,
        ephemeral,
    };
    let app = forum_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Powrum server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 9: Teardown ─────────────────────────────────────────
    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await?;
    }
    registry.close_all();

    tracing::info!("Powrum server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
