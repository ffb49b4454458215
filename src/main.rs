use anyhow::Context;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use taskboard::api::session::SessionStore;
use taskboard::{SharedData, app_env, logging, persistence, router};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logging::setup_logging(logging::init_env_filter());

    let db_url =
        env::var(app_env::DB_URL).context("Could not get database URL from environment")?;
    let db_pool = persistence::connect_sqlx(&db_url)
        .await
        .context("Could not connect to the database")?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
        sessions: SessionStore::new(),
    });
    let app = logging::attach_tracing_http(router(shared_data));

    let listen_addr =
        env::var(app_env::LISTEN_ADDR).unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    info!("Starting server on {listen_addr}.");
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .context("Could not bind the server port")?;
    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
