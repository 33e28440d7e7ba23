use std::{sync::Arc, time::Duration};

use anyhow::Result;
use reqwest::Client;
use teloxide::prelude::*;

use crate::{
    config::AppConfig,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    scanners::build_scanners,
    telegram::TelegramService,
};

pub struct LinkGuardApp {
    _paths: ResolvedPaths,
    telegram: TelegramService,
    shutdown: Shutdown,
}

impl LinkGuardApp {
    pub fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let http_client = Client::builder()
            .user_agent(format!("linkscan-guard/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let scanners = build_scanners(&http_client, &config);
        tracing::info!(
            scanners = ?scanners.iter().map(|s| s.name()).collect::<Vec<_>>(),
            logging_chat_id = ?config.moderation.logging_chat_id,
            "url scanners configured"
        );

        let bot = Bot::new(&config.telegram_bot_token);
        let telegram = TelegramService::new(bot, config.clone(), scanners);

        Ok(Self {
            _paths: paths,
            telegram,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let LinkGuardApp {
            _paths: _,
            telegram,
            shutdown,
        } = self;

        tracing::info!("link scanning bot starting");

        let mut shutdown_listener = shutdown.subscribe();
        let shutdown_timeout = Duration::from_secs(5);
        let mut telegram_future = Box::pin(telegram.run(shutdown.subscribe()));

        let result = tokio::select! {
            _ = shutdown_listener.notified() => {
                tracing::info!("shutdown signal received");
                None
            }
            res = &mut telegram_future => Some(res),
        };

        let result = match result {
            Some(res) => res,
            None => {
                match tokio::time::timeout(shutdown_timeout, &mut telegram_future).await {
                    Ok(res) => res,
                    Err(_) => {
                        tracing::warn!(
                            target: "telegram",
                            timeout = ?shutdown_timeout,
                            "Telegram service did not stop in time; abandoning in-flight moderation"
                        );
                        Ok(())
                    }
                }
            }
        };

        shutdown.trigger();
        if let Err(err) = &result {
            tracing::error!(error = %err, "Telegram dispatcher stopped with an error");
        }
        tracing::info!("bot stopped");
        result
    }
}
