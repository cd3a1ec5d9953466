//! SMTP replies.

use crate::error::{SmtpError, SmtpLimits};

/// A reply sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    /// Three-digit reply code.
    pub code: u16,
    /// Text of the first (or only) line.
    pub message: String,
    /// Additional lines of a multiline reply.
    pub lines: Vec<String>,
}

impl SmtpResponse {
    /// Create a single-line reply.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            lines: Vec::new(),
        }
    }

    /// Create a multiline reply.
    pub fn multiline(code: u16, message: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            code,
            message: message.into(),
            lines,
        }
    }

    /// 250 OK
    pub fn ok() -> Self {
        Self::new(250, "OK")
    }

    /// 220 service ready
    pub fn greeting(hostname: &str) -> Self {
        Self::new(220, format!("{hostname} ESMTP tempmail ready"))
    }

    /// 250 reply to HELO
    pub fn helo(hostname: &str, client_domain: &str) -> Self {
        Self::new(250, format!("{hostname} Hello {client_domain}"))
    }

    /// 250 reply to EHLO, listing extensions
    pub fn ehlo(hostname: &str, client_domain: &str, max_message_size: usize) -> Self {
        Self::multiline(
            250,
            format!("{hostname} Hello {client_domain}"),
            vec![
                format!("SIZE {max_message_size}"),
                "8BITMIME".to_string(),
                "PIPELINING".to_string(),
                "HELP".to_string(),
            ],
        )
    }

    /// 354 start mail input
    pub fn data_start() -> Self {
        Self::new(354, "End data with <CR><LF>.<CR><LF>")
    }

    /// 250 after a message was accepted
    pub fn queued() -> Self {
        Self::new(250, "OK: message accepted")
    }

    /// 451 when the mail handler failed
    pub fn local_error() -> Self {
        Self::new(451, "Requested action aborted: local error in processing")
    }

    /// 252 reply to VRFY
    pub fn cannot_verify() -> Self {
        Self::new(252, "Cannot VRFY user, but will accept message and attempt delivery")
    }

    /// 214 reply to HELP
    pub fn help() -> Self {
        Self::new(214, "Commands: HELO EHLO MAIL RCPT DATA RSET NOOP VRFY HELP QUIT")
    }

    /// 221 closing
    pub fn quit() -> Self {
        Self::new(221, "Bye")
    }

    /// Reply for an error.
    pub fn from_error(err: &SmtpError) -> Self {
        Self::new(err.to_response_code(), err.to_response_message())
    }

    /// Whether the reply closes the connection.
    pub fn closes_connection(&self) -> bool {
        self.code == 221 || self.code == 421
    }

    /// Format the reply for sending over the wire.
    pub fn format(&self) -> String {
        let mut all = Vec::with_capacity(self.lines.len() + 1);
        all.push(self.message.as_str());
        all.extend(self.lines.iter().map(String::as_str));

        let last = all.len() - 1;
        let mut out = String::new();
        for (i, text) in all.into_iter().enumerate() {
            let separator = if i == last { ' ' } else { '-' };
            let mut line = format!("{}{}{}", self.code, separator, text);
            // Reply lines are capped at 512 bytes including CRLF.
            if line.len() > SmtpLimits::REPLY_LINE_MAX_LENGTH - 2 {
                let mut cut = SmtpLimits::REPLY_LINE_MAX_LENGTH - 2;
                while !line.is_char_boundary(cut) {
                    cut -= 1;
                }
                line.truncate(cut);
            }
            out.push_str(&line);
            out.push_str("\r\n");
        }
        out
    }

    /// Check if this is a success reply (2xx or 3xx)
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.code)
    }
}
