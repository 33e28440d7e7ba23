use teloxide::types::{Message, MessageEntityKind, User};

use crate::domain::InboundMessage;

pub fn format_user_display(user: &User) -> String {
    if let Some(username) = &user.username {
        format!("@{}", username)
    } else {
        let mut parts = Vec::new();
        parts.push(user.first_name.as_str());
        if let Some(last) = &user.last_name {
            parts.push(last.as_str());
        }
        let name = parts.join(" ").trim().to_string();
        if name.is_empty() {
            "Unknown".to_string()
        } else {
            name
        }
    }
}

/// Maps a Telegram message onto the platform-neutral moderation input.
pub fn to_inbound(msg: &Message) -> InboundMessage {
    let from = msg.from.as_ref();
    InboundMessage {
        chat_id: msg.chat.id.0,
        chat_title: msg.chat.title().map(|t| t.to_string()),
        message_id: msg.id.0,
        author_id: from.map(|u| u.id.0),
        author_display: from
            .map(format_user_display)
            .unwrap_or_else(|| "Unknown".to_string()),
        text: msg.text().or_else(|| msg.caption()).unwrap_or_default().to_string(),
        hidden_links: hidden_links(msg),
        timestamp: msg.date,
    }
}

/// Targets of `TextLink` entities, whose URL is not part of the visible text.
fn hidden_links(msg: &Message) -> Vec<String> {
    msg.parse_entities()
        .or_else(|| msg.parse_caption_entities())
        .unwrap_or_default()
        .iter()
        .filter_map(|entity| match entity.kind() {
            MessageEntityKind::TextLink { url } => Some(url.to_string()),
            _ => None,
        })
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
