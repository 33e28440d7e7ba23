use std::sync::Arc;

use anyhow::Result;
use chrono_tz::Tz;
use futures::future::BoxFuture;
use teloxide::{
    dispatching::{Dispatcher, UpdateHandler},
    error_handlers::ErrorHandler,
    prelude::*,
    types::Message,
    update_listeners,
    utils::command::BotCommands,
    RequestError,
};

use crate::{
    config::AppConfig,
    infrastructure::shutdown::ShutdownListener,
    moderation::{ModerationHandler, Outcome},
    scanners::SharedScanner,
};

use super::{
    actions::TelegramActions,
    tasks::ModerationTasks,
    types::{AppState, BotResult, GeneralCommand},
    utils::to_inbound,
};

pub struct TelegramService {
    bot: Bot,
    config: Arc<AppConfig>,
    scanners: Vec<SharedScanner>,
}

#[derive(Clone, Copy, Debug)]
enum NetworkIssueKind {
    Timeout,
    Connection,
    Other,
}

impl NetworkIssueKind {
    fn label(&self) -> &'static str {
        match self {
            NetworkIssueKind::Timeout => "request timeout",
            NetworkIssueKind::Connection => "connection failure",
            NetworkIssueKind::Other => "network error",
        }
    }

    fn classify(error: &teloxide::RequestError) -> Option<Self> {
        match error {
            teloxide::RequestError::Network(source) => {
                let req_err = source.as_ref();
                Some(if req_err.is_timeout() {
                    NetworkIssueKind::Timeout
                } else if req_err.is_connect() {
                    NetworkIssueKind::Connection
                } else {
                    NetworkIssueKind::Other
                })
            }
            _ => None,
        }
    }
}

/// Logs update-listener failures; polling keeps going on its own.
struct ListenerErrorLogger;

impl ErrorHandler<teloxide::RequestError> for ListenerErrorLogger {
    fn handle_error(self: Arc<Self>, error: teloxide::RequestError) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            match NetworkIssueKind::classify(&error) {
                Some(kind) => tracing::warn!(
                    target: "telegram",
                    issue = kind.label(),
                    error = %error,
                    "Telegram polling network failure"
                ),
                None => tracing::error!(target: "telegram", error = %error, "update listener error"),
            }
        })
    }
}

impl TelegramService {
    pub fn new(bot: Bot, config: Arc<AppConfig>, scanners: Vec<SharedScanner>) -> Self {
        Self {
            bot,
            config,
            scanners,
        }
    }

    pub async fn run(&self, mut shutdown: ShutdownListener) -> Result<()> {
        self.bot
            .set_my_commands(GeneralCommand::bot_commands())
            .await?;
        let me = self.bot.get_me().await?;
        tracing::info!(
            target: "telegram",
            bot_id = me.id.0,
            username = ?me.username,
            "connected to Telegram"
        );

        let timezone: Tz = self.config.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(
                target: "config",
                timezone = %self.config.timezone,
                "unknown time zone; falling back to UTC"
            );
            chrono_tz::UTC
        });

        let moderation = Arc::new(ModerationHandler::new(
            me.id.0,
            self.scanners.clone(),
            self.config.moderation.clone(),
        ));
        let state = Arc::new(AppState {
            config: self.config.clone(),
            moderation,
            actions: TelegramActions::new(self.bot.clone(), timezone),
            tasks: ModerationTasks::default(),
        });

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), Self::schema())
            .dependencies(dptree::deps![state.clone()])
            .default_handler(|update| async move {
                tracing::debug!(target: "telegram", ?update, "unhandled update");
            })
            .build();

        let listener = update_listeners::polling_default(self.bot.clone()).await;
        let shutdown_token = dispatcher.shutdown_token();
        let mut dispatcher_future =
            Box::pin(dispatcher.dispatch_with_listener(listener, Arc::new(ListenerErrorLogger)));
        let mut dispatcher_finished = false;

        tokio::select! {
            _ = shutdown.notified() => {
                tracing::info!(target: "telegram", "dispatcher shutdown requested");
                if let Ok(wait) = shutdown_token.shutdown() {
                    wait.await;
                }
            }
            _ = &mut dispatcher_future => {
                dispatcher_finished = true;
                tracing::info!(target: "telegram", "dispatcher finished");
            }
        }

        if !dispatcher_finished {
            dispatcher_future.await;
        }

        let pending = state.tasks.in_flight();
        if pending > 0 {
            tracing::info!(target: "telegram", pending, "waiting for in-flight moderation");
        }
        state.tasks.drain().await;

        Ok(())
    }

    /// Edits go through moderation like new messages; a link swapped in later is scanned too.
    fn schema() -> UpdateHandler<RequestError> {
        dptree::entry()
            .branch(
                Update::filter_message()
                    .branch(
                        dptree::entry()
                            .filter_command::<GeneralCommand>()
                            .endpoint(Self::on_command),
                    )
                    .branch(dptree::endpoint(Self::on_plain_message)),
            )
            .branch(Update::filter_edited_message().endpoint(Self::on_plain_message))
    }

    async fn on_plain_message(msg: Message, state: Arc<AppState>) -> BotResult<()> {
        Self::moderate(&msg, &state);
        Ok(())
    }

    fn moderate(msg: &Message, state: &AppState) {
        let inbound = to_inbound(msg);
        let moderation = state.moderation.clone();
        let actions = state.actions.clone();

        // Scans can poll for close to a minute; keep them off the dispatcher.
        state.tasks.spawn(async move {
            let outcome = moderation.handle(&actions, &inbound).await;
            if let Outcome::Applied { action, records } = outcome {
                tracing::debug!(
                    target: "moderation",
                    chat_id = inbound.chat_id,
                    message_id = inbound.message_id,
                    ?action,
                    scans = records.len(),
                    "message processed"
                );
            }
        });
    }

    async fn on_command(
        bot: Bot,
        msg: Message,
        cmd: GeneralCommand,
        state: Arc<AppState>,
    ) -> BotResult<()> {
        // Command text can carry links as well.
        Self::moderate(&msg, &state);

        match cmd {
            GeneralCommand::Start => {
                bot.send_message(
                    msg.chat.id,
                    "Hi! I check links posted here against URL reputation services and remove \
                     the malicious ones.",
                )
                .await?
            }
            GeneralCommand::Help => {
                bot.send_message(msg.chat.id, GeneralCommand::descriptions().to_string())
                    .await?
            }
            GeneralCommand::Chatid => {
                bot.send_message(msg.chat.id, format!("Chat ID: {}", msg.chat.id))
                    .await?
            }
            GeneralCommand::Status => {
                let moderation = &state.moderation;
                let logging = match moderation.config().logging_chat_id {
                    Some(id) => format!("chat {id}"),
                    None => "disabled".to_string(),
                };
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "Bot status\n- Scanners: {}\n- Poll attempts: {}\n- Deletion log: {}",
                        moderation.scanner_names().join(", "),
                        state.config.scan.poll_attempts,
                        logging
                    ),
                )
                .await?
            }
        };
        Ok(())
    }
}
