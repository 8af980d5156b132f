use std::sync::Arc;

use roster_client::RemoteLoader;
use roster_config::{get_log_dir, get_log_path, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod handlers;
mod server;
mod session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    let log_dir = get_log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(get_log_path())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.daemon.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let loader = RemoteLoader::new(config.api_base_url());
    info!("Starting roster daemon against {}", config.api_base_url());

    let session = session::Session::new(config, Arc::new(loader));
    server::DaemonServer::new(session).run().await?;

    Ok(())
}
