use std::sync::Arc;

use teloxide::utils::command::BotCommands;

use crate::{config::AppConfig, moderation::ModerationHandler};

use super::{actions::TelegramActions, tasks::ModerationTasks};

pub type BotResult<T> = Result<T, teloxide::RequestError>;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub moderation: Arc<ModerationHandler>,
    pub actions: TelegramActions,
    pub tasks: ModerationTasks,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum GeneralCommand {
    #[command(description = "introduce the bot")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "show the id of this chat")]
    Chatid,
    #[command(description = "show scanner and logging status")]
    Status,
}
