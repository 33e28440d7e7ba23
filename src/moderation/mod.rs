pub mod actions;
pub mod extract;
pub mod handler;
pub mod notice;

pub use actions::{ChatActions, ChatError, ChatResult};
pub use handler::{ModerationHandler, Outcome};
pub use notice::DeletionNotice;
