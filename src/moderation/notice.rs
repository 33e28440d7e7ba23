use chrono::{DateTime, Utc};

use crate::{
    config::AccentColor,
    domain::{InboundMessage, ScanRecord, Verdict},
};

/// Report posted to the logging chat after a message was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionNotice {
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub message_id: i32,
    pub author_id: Option<u64>,
    pub author_display: String,
    /// Each flagged URL with the scanners that flagged it, in first-seen order.
    pub flagged: Vec<(String, Vec<&'static str>)>,
    pub accent: AccentColor,
    pub sent_at: DateTime<Utc>,
    pub deleted_at: DateTime<Utc>,
}

impl DeletionNotice {
    pub fn new(
        message: &InboundMessage,
        records: &[ScanRecord],
        accent: AccentColor,
        deleted_at: DateTime<Utc>,
    ) -> Self {
        let mut flagged: Vec<(String, Vec<&'static str>)> = Vec::new();
        for record in records.iter().filter(|r| r.verdict == Verdict::Malicious) {
            match flagged.iter_mut().find(|(url, _)| *url == record.url) {
                Some((_, scanners)) => {
                    if !scanners.contains(&record.scanner) {
                        scanners.push(record.scanner);
                    }
                }
                None => flagged.push((record.url.clone(), vec![record.scanner])),
            }
        }

        Self {
            chat_id: message.chat_id,
            chat_title: message.chat_title.clone(),
            message_id: message.message_id,
            author_id: message.author_id,
            author_display: message.author_display.clone(),
            flagged,
            accent,
            sent_at: message.timestamp,
            deleted_at,
        }
    }
}

const PALETTE: [(&str, (u8, u8, u8)); 9] = [
    ("🔴", (0xDD, 0x2E, 0x44)),
    ("🟠", (0xF4, 0x90, 0x0C)),
    ("🟡", (0xFD, 0xCB, 0x58)),
    ("🟢", (0x78, 0xB1, 0x59)),
    ("🔵", (0x55, 0xAC, 0xEE)),
    ("🟣", (0xAA, 0x8E, 0xD6)),
    ("🟤", (0xC1, 0x69, 0x4F)),
    ("⚫", (0x31, 0x37, 0x3D)),
    ("⚪", (0xE6, 0xE7, 0xE8)),
];

/// Closest colored circle emoji to `accent`, for platforms without colored embeds.
pub fn accent_glyph(accent: AccentColor) -> &'static str {
    let distance = |(r, g, b): (u8, u8, u8)| {
        let dr = i32::from(accent.r) - i32::from(r);
        let dg = i32::from(accent.g) - i32::from(g);
        let db = i32::from(accent.b) - i32::from(b);
        dr * dr + dg * dg + db * db
    };
    PALETTE
        .iter()
        .min_by_key(|(_, rgb)| distance(*rgb))
        .map(|(glyph, _)| *glyph)
        .unwrap_or("🔴")
}

/// Makes a URL unclickable: `https://evil.com` becomes `hxxps://evil[.]com`.
pub fn defang(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (scheme.replacen("http", "hxxp", 1), rest),
        None => (String::new(), url),
    };
    let rest = rest.replace('.', "[.]");
    if scheme.is_empty() {
        rest
    } else {
        format!("{scheme}://{rest}")
    }
}
