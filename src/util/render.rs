//! Rendering of chat messages into display lines.
//!
//! Peer-provided text is never trusted as markup. The browser host inserts
//! [`ChatLine`] fields as DOM text nodes; [`ChatLine::to_html`] escapes for
//! callers that need a markup string; [`ChatLine::to_terminal`] strips
//! control characters so a peer cannot emit terminal escape sequences or fake
//! extra lines.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::net::types::ChatMessage;

/// One rendered transcript entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatLine {
    pub author: String,
    pub body: String,
    pub timestamp: Option<String>,
}

impl From<&ChatMessage> for ChatLine {
    fn from(message: &ChatMessage) -> Self {
        Self {
            author: message.username.clone(),
            body: message.content.clone(),
            timestamp: message.timestamp.clone(),
        }
    }
}

impl ChatLine {
    /// `<p><strong>{author}:</strong> {body}</p>`, every field escaped.
    pub fn to_html(&self) -> String {
        let stamp = self
            .timestamp
            .as_deref()
            .map(|ts| format!("<time>{}</time> ", escape_html(ts)))
            .unwrap_or_default();
        format!(
            "<p>{stamp}<strong>{}:</strong> {}</p>",
            escape_html(&self.author),
            escape_html(&self.body)
        )
    }

    /// `[{timestamp}] {author}: {body}` on a single line.
    pub fn to_terminal(&self) -> String {
        let author = strip_control(&self.author);
        let body = strip_control(&self.body);
        match self.timestamp.as_deref() {
            Some(ts) => format!("[{}] {author}: {body}", strip_control(ts)),
            None => format!("{author}: {body}"),
        }
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Drop control characters; whitespace controls (newline, tab) become spaces.
pub fn strip_control(text: &str) -> String {
    text.chars()
        .filter_map(|ch| {
            if !ch.is_control() {
                Some(ch)
            } else if ch.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .collect()
}
