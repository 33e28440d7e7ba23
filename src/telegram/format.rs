use chrono_tz::Tz;

use crate::moderation::{
    notice::{accent_glyph, defang},
    DeletionNotice,
};

use super::utils::escape_html;

pub fn format_deletion_notice(notice: &DeletionNotice, tz: Tz) -> String {
    let user_id = notice
        .author_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut text = format!(
        "{} <b>Malicious link removed</b>\n\n\
         Chat: {}\n\
         Chat ID: <code>{}</code>\n\
         Message ID: {}\n\
         User: {}\n\
         User ID: <code>{}</code>\n\
         Sent: {}\n\
         Deleted: {}",
        accent_glyph(notice.accent),
        escape_html(notice.chat_title.as_deref().unwrap_or("Unknown")),
        notice.chat_id,
        notice.message_id,
        escape_html(&notice.author_display),
        user_id,
        notice.sent_at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z"),
        notice.deleted_at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z"),
    );

    if !notice.flagged.is_empty() {
        text.push_str("\n\nFlagged links:");
        for (url, scanners) in &notice.flagged {
            text.push_str(&format!(
                "\n• <code>{}</code> ({})",
                escape_html(&defang(url)),
                scanners.join(", ")
            ));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::config::AccentColor;

    #[test]
    fn renders_notice_fields() {
        let sent_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let notice = DeletionNotice {
            chat_id: -1001,
            chat_title: Some("Rust <Fans>".to_string()),
            message_id: 55,
            author_id: Some(42),
            author_display: "@spammer".to_string(),
            flagged: vec![(
                "https://evil.example/login".to_string(),
                vec!["virustotal", "cloudflare"],
            )],
            accent: AccentColor::DEFAULT,
            sent_at,
            deleted_at: sent_at,
        };

        let text = format_deletion_notice(&notice, chrono_tz::Asia::Seoul);

        assert!(text.starts_with("🔴 <b>Malicious link removed</b>"));
        assert!(text.contains("Chat: Rust &lt;Fans&gt;"));
        assert!(text.contains("User: @spammer"));
        assert!(text.contains("User ID: <code>42</code>"));
        assert!(text.contains("Sent: 2024-05-01 21:00:00 KST"));
        assert!(text.contains("hxxps://evil[.]example/login"));
        assert!(text.contains("(virustotal, cloudflare)"));
        assert!(!text.contains("https://evil.example"));
    }
}
