//! MIME parsing of received messages.

use mail_parser::{MessageParser, PartType};

/// The parts of a received message that get stored and relayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEmail {
    /// Decoded display name from `From`.
    pub sender_name: String,
    /// Address from `From`.
    pub sender_email: String,
    /// Decoded subject.
    pub subject: String,
    /// First `text/plain` part, or text derived from the HTML part.
    pub body_plain: String,
    /// First `text/html` part.
    pub body_html: String,
    /// Header block as unfolded `Name: value` lines.
    pub raw_headers: String,
}

impl ParsedEmail {
    /// Parse raw message bytes.
    ///
    /// Never fails: content the MIME parser rejects is kept as lossy text.
    pub fn parse(raw: &[u8]) -> Self {
        let raw_headers = header_block(raw);

        let Some(message) = MessageParser::default().parse(raw) else {
            return Self {
                body_plain: String::from_utf8_lossy(body_block(raw)).into_owned(),
                raw_headers,
                ..Default::default()
            };
        };

        let from = message.from().and_then(|f| f.first());
        let sender_name = from
            .and_then(|a| a.name())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let sender_email = from
            .and_then(|a| a.address())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let subject = message.subject().unwrap_or_default().trim().to_string();

        let text = message.text_part(0).and_then(|part| match &part.body {
            PartType::Text(text) => Some(text.to_string()),
            _ => None,
        });
        let body_html = message
            .html_part(0)
            .and_then(|part| match &part.body {
                PartType::Html(html) => Some(html.to_string()),
                _ => None,
            })
            .unwrap_or_default();

        // Without a plain part, fall back to the parser's HTML-to-text rendering.
        let body_plain = match text {
            Some(text) => text,
            None if !body_html.is_empty() => message
                .body_text(0)
                .map(|s| s.into_owned())
                .unwrap_or_else(|| body_html.clone()),
            None => String::new(),
        };

        Self {
            sender_name,
            sender_email,
            subject,
            body_plain,
            body_html,
            raw_headers,
        }
    }

    /// Sender in display form: `Name <address>`, or whichever part is known.
    pub fn formatted_sender(&self) -> String {
        match (self.sender_name.is_empty(), self.sender_email.is_empty()) {
            (false, false) => format!("{} <{}>", self.sender_name, self.sender_email),
            (true, false) => self.sender_email.clone(),
            (false, true) => self.sender_name.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Position of the blank line separating headers from the body.
fn header_end(raw: &[u8]) -> Option<(usize, usize)> {
    let crlf = raw.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, i + 4));
    let lf = raw.windows(2).position(|w| w == b"\n\n").map(|i| (i, i + 2));
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn body_block(raw: &[u8]) -> &[u8] {
    match header_end(raw) {
        Some((_, body_start)) => &raw[body_start..],
        None => raw,
    }
}

/// Unfolded header lines of the message.
fn header_block(raw: &[u8]) -> String {
    let head = match header_end(raw) {
        Some((end, _)) => &raw[..end],
        None => raw,
    };
    let head = String::from_utf8_lossy(head);

    let mut lines: Vec<String> = Vec::new();
    for line in head.lines() {
        if line.starts_with([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
                continue;
            }
        }
        if line.contains(':') {
            lines.push(line.trim_end().to_string());
        }
    }
    lines.join("\n")
}
