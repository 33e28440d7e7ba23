use chrono_tz::Tz;
use futures::future::BoxFuture;
use teloxide::{
    prelude::*,
    types::{MessageId, ParseMode, ReactionType},
    ApiError, RequestError,
};

use crate::{
    domain::InboundMessage,
    moderation::{ChatActions, ChatError, ChatResult, DeletionNotice},
};

use super::format::format_deletion_notice;

/// Applies moderation side effects through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramActions {
    bot: Bot,
    timezone: Tz,
}

impl TelegramActions {
    pub fn new(bot: Bot, timezone: Tz) -> Self {
        Self { bot, timezone }
    }

    async fn delete(&self, message: &InboundMessage) -> ChatResult<()> {
        self.bot
            .delete_message(ChatId(message.chat_id), MessageId(message.message_id))
            .await?;
        tracing::info!(
            target: "telegram",
            chat_id = message.chat_id,
            message_id = message.message_id,
            "message deleted"
        );
        Ok(())
    }

    async fn react(&self, message: &InboundMessage, emoji: &str) -> ChatResult<()> {
        self.bot
            .set_message_reaction(ChatId(message.chat_id), MessageId(message.message_id))
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await?;
        Ok(())
    }
}

impl ChatActions for TelegramActions {
    fn delete_message<'a>(&'a self, message: &'a InboundMessage) -> BoxFuture<'a, ChatResult<()>> {
        Box::pin(self.delete(message))
    }

    fn add_reaction<'a>(
        &'a self,
        message: &'a InboundMessage,
        emoji: &'a str,
    ) -> BoxFuture<'a, ChatResult<()>> {
        Box::pin(self.react(message, emoji))
    }

    fn send_notice<'a>(
        &'a self,
        destination: i64,
        notice: &'a DeletionNotice,
    ) -> BoxFuture<'a, ChatResult<()>> {
        Box::pin(async move {
            let text = format_deletion_notice(notice, self.timezone);
            match self
                .bot
                .send_message(ChatId(destination), text)
                .parse_mode(ParseMode::Html)
                .await
            {
                Ok(_) => Ok(()),
                Err(RequestError::Api(ApiError::ChatNotFound)) => {
                    Err(ChatError::DestinationNotFound(destination))
                }
                Err(err) => Err(err.into()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path_regex},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::config::AccentColor;

    fn actions_for(server: &MockServer) -> TelegramActions {
        let api_url = reqwest::Url::parse(&server.uri()).expect("mock server url");
        let bot = Bot::new("123:test-token").set_api_url(api_url);
        TelegramActions::new(bot, chrono_tz::UTC)
    }

    fn bad_request(description: &str) -> ResponseTemplate {
        ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": description,
        }))
    }

    fn notice() -> DeletionNotice {
        DeletionNotice {
            chat_id: -1001,
            chat_title: Some("Lobby".to_string()),
            message_id: 55,
            author_id: Some(42),
            author_display: "@spammer".to_string(),
            flagged: vec![("https://evil.example/login".to_string(), vec!["virustotal"])],
            accent: AccentColor::DEFAULT,
            sent_at: Utc::now(),
            deleted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unknown_log_chat_maps_to_destination_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("(?i)/sendmessage$"))
            .respond_with(bad_request("Bad Request: chat not found"))
            .expect(1)
            .mount(&server)
            .await;

        let err = actions_for(&server)
            .send_notice(-100777, &notice())
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::DestinationNotFound(-100777)));
    }

    #[tokio::test]
    async fn other_api_errors_stay_request_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("(?i)/sendmessage$"))
            .respond_with(bad_request("Forbidden: bot was kicked from the supergroup chat"))
            .mount(&server)
            .await;

        let err = actions_for(&server)
            .send_notice(-100777, &notice())
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Request(_)));
    }
}
