use std::io;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{config::AppConfig, infrastructure::directories::ResolvedPaths};

static INIT: OnceCell<()> = OnceCell::new();
static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Console plus daily-rolling file output. `RUST_LOG` wins over `LOG_LEVEL`.
pub fn init_tracing(config: &AppConfig, paths: &ResolvedPaths) -> Result<()> {
    INIT.get_or_try_init::<_, anyhow::Error>(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.logging.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, "linkscan-guard.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        let _ = GUARD.set(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(io::stdout).with_target(true))
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_ansi(false),
            )
            .try_init()?;

        tracing::info!(logs = %paths.logs_dir.display(), "tracing initialized");
        Ok(())
    })?;
    Ok(())
}
