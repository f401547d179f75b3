use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    server::graceful::GracefulShutdown,
    service::TowerToHyperService,
};
use shared::config::server::{Config, DatabaseConfig, LogFormat};
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{debug, error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    app_state::AppState,
    db::bootstrap::{self, LivenessError},
    handlers,
    middleware::request_context::{self, RequestIdState},
    routes,
    services::user_store::PgUserStore,
    tracer,
};

/// Fatal conditions that stop the process before it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid database ssl mode '{mode}': {source}")]
    SslMode {
        mode: String,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Liveness(#[from] LivenessError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Initializes the tracing subscriber for logging using the provided configuration.
pub fn initialize_tracing(config: &Config) -> String {
    let env_filter = build_env_filter(config);

    let fmt_builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let installed = if matches!(config.logging.format, LogFormat::Json) {
        fmt_builder.json().with_ansi(false).try_init()
    } else {
        fmt_builder.with_ansi(true).try_init()
    };
    if installed.is_err() {
        debug!("tracing subscriber already installed");
    }

    config.logging.level.clone()
}

fn build_env_filter(config: &Config) -> EnvFilter {
    let default_level = config
        .logging
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}

/// Builds connection options from discrete settings so credentials never
/// pass through a formatted URL.
///
/// # Errors
/// Returns [`StartupError::SslMode`] if the configured ssl mode is unknown.
pub fn connect_options(db: &DatabaseConfig) -> Result<PgConnectOptions, StartupError> {
    let ssl_mode = db
        .ssl_mode
        .parse::<PgSslMode>()
        .map_err(|source| StartupError::SslMode {
            mode: db.ssl_mode.clone(),
            source,
        })?;

    Ok(PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.password)
        .database(&db.name)
        .ssl_mode(ssl_mode))
}

/// Creates the database connection pool. Connections open on first use;
/// call [`bootstrap::ensure_liveness`] to verify reachability.
///
/// # Errors
/// Returns an error if the connection options are invalid.
pub fn create_database_pool(db: &DatabaseConfig) -> Result<PgPool, StartupError> {
    let options = connect_options(db)?;
    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .max_lifetime(db.max_lifetime())
        .idle_timeout(db.idle_timeout())
        .acquire_timeout(db.request_timeout())
        .connect_lazy_with(options);

    info!(
        host = %db.host,
        port = db.port,
        database = %db.name,
        max_connections = db.max_connections,
        "database pool configured"
    );
    Ok(pool)
}

/// Creates the application state backed by PostgreSQL.
pub fn create_app_state(pool: PgPool, db: &DatabaseConfig) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(PgUserStore::new(pool)),
        db.request_timeout(),
    ))
}

/// Creates the main application router with all middleware and routes.
pub fn create_app_router(state: Arc<AppState>, config: &Config) -> Router {
    let request_id_state = RequestIdState::from_config(config);

    Router::new()
        .merge(routes::root::create_router_root())
        .merge(routes::users::create_router_users())
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    request_id_state,
                    request_context::assign_request_id,
                ))
                .layer(tracer::create_trace_layer()),
        )
        .with_state(state)
}

/// Creates the graceful shutdown signal handler.
pub async fn create_shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

/// Accepts connections until `shutdown` resolves, then waits for in-flight
/// connections to finish. Each connection is served over HTTP/1 with a bound
/// on how long its request headers may take; accept errors are logged and
/// the loop continues.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    header_read_timeout: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(header_read_timeout);

    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(connection) => connection,
                    Err(err) => {
                        warn!(error = %err, "failed to accept connection");
                        continue;
                    }
                };

                let service = TowerToHyperService::new(app.clone());
                let connection = graceful.watch(builder.serve_connection(TokioIo::new(stream), service));
                tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        debug!(%peer, error = %err, "connection closed with error");
                    }
                });
            }
            () = &mut shutdown => break,
        }
    }

    drop(listener);
    graceful.shutdown().await;
}

/// Starts the server: tracing, database pool, liveness check, then the
/// accept loop. Any failure before serving is returned to the caller.
///
/// # Errors
/// Returns an error if the database is unreachable or the port cannot be bound.
pub async fn run(config: Config) -> Result<(), StartupError> {
    initialize_tracing(&config);
    info!("Starting server...");

    let pool = create_database_pool(&config.db)?;
    bootstrap::ensure_liveness(&pool, config.db.connect_timeout()).await?;

    let state = create_app_state(pool, &config.db);
    let app = create_app_router(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    info!("Server listening on {}", addr);

    serve(
        listener,
        app,
        Duration::from_secs(config.server.header_read_timeout_secs),
        create_shutdown_signal(),
    )
    .await;

    Ok(())
}
