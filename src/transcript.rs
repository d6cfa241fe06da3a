//! HTML rendering of a whole conversation.
//!
//! [`render_messages`] is the render loop: a pure function from the store to
//! one HTML fragment per visible message. [`render_document`] wraps those in
//! a standalone page and [`export`] writes it to disk.

use anyhow::Context;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::conversation::Conversation;
use crate::markdown::{escape_html, line_breaks};
use crate::message::{Display, Role};

/// One visible message, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub role: Role,
    pub html: String,
}

/// Page metadata shown in the transcript header.
#[derive(Debug, Clone)]
pub struct TranscriptMeta {
    pub model: String,
    pub source_label: String,
    pub created: DateTime<Local>,
}

/// Render every visible message to HTML.
pub fn render_messages(conversation: &Conversation) -> Vec<RenderedMessage> {
    conversation
        .visible()
        .map(|message| {
            let html = match message.display() {
                Display::Html(html) => html,
                Display::Text(text) => line_breaks(&escape_html(&text)),
            };
            RenderedMessage {
                role: message.role,
                html,
            }
        })
        .collect()
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#0f172a;color:#e2e8f0;max-width:760px;margin:2rem auto;padding:0 1rem}\
header{color:#94a3b8;font-size:.9rem;margin-bottom:1.5rem}\
.msg{border-radius:12px;padding:.75rem 1rem;margin:.75rem 0;line-height:1.5}\
.user{background:#0e7490;margin-left:20%}\
.assistant{background:#1e293b;margin-right:20%}\
.who{font-size:.75rem;opacity:.7;margin-bottom:.25rem}\
pre{background:#020617;padding:.75rem;border-radius:8px;overflow-x:auto}\
a{color:#60a5fa}";

/// Render a standalone HTML page for the conversation.
pub fn render_document(conversation: &Conversation, meta: &TranscriptMeta) -> String {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str("<title>Eugene transcript</title>\n<style>");
    page.push_str(STYLE);
    page.push_str("</style>\n</head>\n<body>\n");
    page.push_str(&format!(
        "<header>Model: {} &middot; Source: {} &middot; {}</header>\n",
        escape_html(&meta.model),
        escape_html(&meta.source_label),
        meta.created.format("%Y-%m-%d %H:%M")
    ));

    for message in render_messages(conversation) {
        page.push_str(&format!(
            "<div class=\"msg {}\"><div class=\"who\">{}</div>{}</div>\n",
            message.role.as_str(),
            message.role.label(),
            message.html
        ));
    }

    page.push_str("</body>\n</html>\n");
    page
}

/// File name for a transcript created at `created`.
pub fn file_name(created: &DateTime<Local>) -> String {
    format!("eugene-transcript-{}.html", created.format("%Y%m%d-%H%M%S"))
}

/// Write the transcript into `dir` and return the file path.
pub fn export(conversation: &Conversation, meta: &TranscriptMeta, dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(file_name(&meta.created));
    std::fs::write(&path, render_document(conversation, meta))
        .with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), messages = conversation.visible_len(), "transcript exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta() -> TranscriptMeta {
        TranscriptMeta {
            model: "gpt-4o-mini".to_string(),
            source_label: "Bryan County".to_string(),
            created: Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 5).unwrap(),
        }
    }

    #[test]
    fn test_user_text_is_escaped_not_rendered() {
        let mut conversation = Conversation::new("sys");
        conversation.push_user("a <b> **c**\nd");
        let rendered = render_messages(&conversation);
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].html, "a &lt;b&gt; **c**<br>d");
    }

    #[test]
    fn test_system_prompt_never_rendered() {
        let conversation = Conversation::new("secret prompt");
        let page = render_document(&conversation, &meta());
        assert!(!page.contains("secret prompt"));
    }

    #[test]
    fn test_file_name_uses_timestamp() {
        assert_eq!(file_name(&meta().created), "eugene-transcript-20260301-093005.html");
    }
}
