pub mod env;
mod loader;

pub use env::{AccentColor, AppConfig, CloudflareConfig, ModerationConfig, ScanConfig, VirusTotalConfig};
pub use loader::load_config;
