use chrono::{DateTime, Utc};

use super::verdict::Verdict;

/// Platform-neutral view of an inbound chat message.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub message_id: i32,
    pub author_id: Option<u64>,
    pub author_display: String,
    pub text: String,
    /// Link targets hidden behind formatted text, which never show up in `text`.
    pub hidden_links: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// One scanner's verdict for one URL of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub url: String,
    pub scanner: &'static str,
    pub verdict: Verdict,
}
