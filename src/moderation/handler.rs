use chrono::Utc;

use crate::{
    config::ModerationConfig,
    domain::{decide, Action, InboundMessage, ScanRecord},
    scanners::SharedScanner,
};

use super::{
    actions::{ChatActions, ChatError},
    extract::extract_urls,
    notice::DeletionNotice,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    OwnMessage,
    NoUrls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored(IgnoreReason),
    Applied {
        action: Action,
        records: Vec<ScanRecord>,
    },
}

/// Runs one message through extraction, scanning, the verdict policy and the resulting side
/// effect. Holds no per-message state, so a single instance serves concurrent messages.
pub struct ModerationHandler {
    bot_id: u64,
    scanners: Vec<SharedScanner>,
    config: ModerationConfig,
}

impl ModerationHandler {
    pub fn new(bot_id: u64, scanners: Vec<SharedScanner>, config: ModerationConfig) -> Self {
        Self {
            bot_id,
            scanners,
            config,
        }
    }

    pub fn scanner_names(&self) -> Vec<&'static str> {
        self.scanners.iter().map(|s| s.name()).collect()
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    pub async fn handle<C>(&self, chat: &C, message: &InboundMessage) -> Outcome
    where
        C: ChatActions + ?Sized,
    {
        if message.author_id == Some(self.bot_id) {
            return Outcome::Ignored(IgnoreReason::OwnMessage);
        }

        let urls = collect_urls(message);
        if urls.is_empty() {
            return Outcome::Ignored(IgnoreReason::NoUrls);
        }

        tracing::debug!(
            target: "moderation",
            chat_id = message.chat_id,
            message_id = message.message_id,
            urls = urls.len(),
            "scanning message links"
        );

        let records = self.scan_all(&urls).await;
        let action = decide(records.iter().map(|r| &r.verdict));
        self.apply(chat, message, action, &records).await;

        Outcome::Applied { action, records }
    }

    async fn scan_all(&self, urls: &[String]) -> Vec<ScanRecord> {
        let mut records = Vec::with_capacity(urls.len() * self.scanners.len());
        for url in urls {
            for scanner in &self.scanners {
                let verdict = scanner.scan(url).await;
                records.push(ScanRecord {
                    url: url.clone(),
                    scanner: scanner.name(),
                    verdict,
                });
            }
        }
        records
    }

    async fn apply<C>(
        &self,
        chat: &C,
        message: &InboundMessage,
        action: Action,
        records: &[ScanRecord],
    ) where
        C: ChatActions + ?Sized,
    {
        match action {
            Action::DeleteAndLog => {
                tracing::warn!(
                    target: "moderation",
                    chat_id = message.chat_id,
                    message_id = message.message_id,
                    "found malicious links"
                );
                if let Err(err) = chat.delete_message(message).await {
                    tracing::error!(
                        target: "moderation",
                        error = %err,
                        chat_id = message.chat_id,
                        message_id = message.message_id,
                        "failed to delete malicious message"
                    );
                    return;
                }
                self.send_notice(chat, message, records).await;
            }
            Action::MarkUnknown => {
                tracing::info!(
                    target: "moderation",
                    chat_id = message.chat_id,
                    message_id = message.message_id,
                    "failed to determine whether links are malicious"
                );
                self.react(chat, message, &self.config.reaction_unknown).await;
            }
            Action::MarkSafe => {
                self.react(chat, message, &self.config.reaction_safe).await;
                tracing::info!(
                    target: "moderation",
                    chat_id = message.chat_id,
                    message_id = message.message_id,
                    "marked message as safe"
                );
            }
        }
    }

    async fn react<C>(&self, chat: &C, message: &InboundMessage, emoji: &str)
    where
        C: ChatActions + ?Sized,
    {
        if let Err(err) = chat.add_reaction(message, emoji).await {
            tracing::error!(
                target: "moderation",
                error = %err,
                chat_id = message.chat_id,
                message_id = message.message_id,
                emoji,
                "failed to add reaction"
            );
        }
    }

    async fn send_notice<C>(&self, chat: &C, message: &InboundMessage, records: &[ScanRecord])
    where
        C: ChatActions + ?Sized,
    {
        let Some(destination) = self.config.logging_chat_id else {
            tracing::debug!(target: "moderation", "no logging chat configured; notice skipped");
            return;
        };

        let notice = DeletionNotice::new(message, records, self.config.accent_color, Utc::now());
        match chat.send_notice(destination, &notice).await {
            Ok(()) => {}
            Err(ChatError::DestinationNotFound(id)) => {
                tracing::warn!(
                    target: "moderation",
                    logging_chat_id = id,
                    "logging chat not found; notice skipped"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: "moderation",
                    error = %err,
                    logging_chat_id = destination,
                    "failed to send deletion notice"
                );
            }
        }
    }
}

/// URLs in the message text, followed by hidden link targets that look like URLs.
fn collect_urls(message: &InboundMessage) -> Vec<String> {
    let mut urls = extract_urls(&message.text);
    urls.extend(
        message
            .hidden_links
            .iter()
            .flat_map(|link| extract_urls(link)),
    );
    urls
}
