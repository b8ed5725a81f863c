use infoshare_db::{
    client::DbClient,
    store::{DbError, PostStore},
};
use serde::Deserialize;
use server::ServerState;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error connecting to the database: {0}")]
    Database(#[from] DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    mongodb_uri: String,
    #[serde(default = "default_server_address")]
    server_address: IpAddr,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_database_name")]
    database_name: String,
    #[serde(default = "default_collection_name")]
    collection_name: String,
    #[serde(default = "default_store_timeout_seconds")]
    store_timeout_seconds: u64,
}

fn default_server_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

fn default_database_name() -> String {
    "info_share".to_owned()
}

fn default_collection_name() -> String {
    "community_post".to_owned()
}

fn default_store_timeout_seconds() -> u64 {
    10
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "infoshare_api=debug,\
                infoshare_db=debug,\
                tower_http=debug,axum::rejection=trace,mongodb=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => error!(error = %err, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining requests");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let db_client = DbClient::connect(
        &env.mongodb_uri,
        &env.database_name,
        &env.collection_name,
        Duration::from_secs(env.store_timeout_seconds),
    )
    .await?;
    let post_store: Arc<dyn PostStore> = Arc::new(db_client);

    let app = server::app(ServerState { post_store });

    let server_address = SocketAddr::new(env.server_address, env.port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
