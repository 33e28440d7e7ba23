use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::InboundMessage;

use super::notice::DeletionNotice;

pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("destination chat {0} could not be resolved")]
    DestinationNotFound(i64),
    #[error(transparent)]
    Request(#[from] teloxide::RequestError),
}

/// The chat-side effects moderation can apply to a message.
pub trait ChatActions: Send + Sync {
    fn delete_message<'a>(&'a self, message: &'a InboundMessage) -> BoxFuture<'a, ChatResult<()>>;

    fn add_reaction<'a>(
        &'a self,
        message: &'a InboundMessage,
        emoji: &'a str,
    ) -> BoxFuture<'a, ChatResult<()>>;

    fn send_notice<'a>(
        &'a self,
        destination: i64,
        notice: &'a DeletionNotice,
    ) -> BoxFuture<'a, ChatResult<()>>;
}
