mod app;
mod config;
mod domain;
mod infrastructure;
mod moderation;
mod scanners;
mod telegram;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown::Shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let shutdown = Shutdown::new();
    shutdown.install_signal_handlers();

    let app = app::LinkGuardApp::initialize(config, paths, shutdown)?;
    app.run().await
}
