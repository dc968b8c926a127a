//! favea-server: HTTP front-end for the AI collection pipeline.

mod auth;
mod config;
mod error;
mod reconcile;
mod routes;
mod store;

use std::sync::Arc;

use deadpool_postgres::Pool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use favea_core::Extractor;

use crate::config::ServerConfig;
use crate::routes::AppState;
use crate::store::PgStore;

fn build_pool(database_url: &str) -> Result<Pool, Box<dyn std::error::Error>> {
    let pg_config: tokio_postgres::Config = database_url.parse()?;
    let manager = deadpool_postgres::Manager::new(pg_config, tokio_postgres::NoTls);
    let pool = Pool::builder(manager).max_size(16).build()?;
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("favea_server=info,favea_core=info,tower_http=info")
        }))
        .init();

    let config = ServerConfig::from_env()?;
    let pool = build_pool(&config.database_url)?;

    let state = AppState {
        pool: pool.clone(),
        store: Arc::new(PgStore::new(pool)),
        robots: config.robots.clone(),
        reader: config.reader.clone(),
        extractor: Arc::new(Extractor::new(config.extractor.clone())),
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "favea-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
