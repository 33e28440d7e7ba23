mod actions;
mod format;
mod handler;
mod tasks;
mod types;
mod utils;

pub use handler::TelegramService;
