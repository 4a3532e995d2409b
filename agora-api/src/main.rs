use crate::{
    config::{ConfigError, get_env},
    server::ServerState,
};
use agora_db::{
    cache::{CacheError, RedisCache},
    client::DbClient,
    store::DbError,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod server;
mod service;

#[derive(Debug, Error)]
enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Error connecting to the database: {0}")]
    DatabaseConnect(sqlx::Error),
    #[error("Error migrating the database: {0}")]
    DatabaseMigrate(DbError),
    #[error("Error connecting to the cache: {0}")]
    CacheConnect(#[from] CacheError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "agora_api=debug,agora_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Listening for ctrl-c failed");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Listening for SIGTERM failed");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(env.postgres_max_connections)
        .connect_with(env.postgres_options())
        .await
        .map_err(InitError::DatabaseConnect)?;
    let db_client = DbClient::new(pool);
    db_client
        .migrate()
        .await
        .map_err(InitError::DatabaseMigrate)?;

    let cache = RedisCache::connect(env.redis_url()?.as_str()).await?;

    let state = ServerState::new(
        Arc::new(db_client),
        Arc::new(cache),
        env.session_ttl()?,
        env.post_cache_ttl()?,
    );
    let app = server::app(state).layer(TraceLayer::new_for_http());

    let server_address = env.server_address();
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
