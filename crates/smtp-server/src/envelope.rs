//! Received message envelope.

use std::net::SocketAddr;
use std::time::SystemTime;

/// A message accepted by the server, as handed to a [`crate::MailHandler`].
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Reverse-path from MAIL FROM (empty for bounces).
    pub mail_from: String,
    /// Forward-paths from RCPT TO, in the order given.
    pub rcpt_to: Vec<String>,
    /// Raw message content with CRLF line endings.
    pub data: Vec<u8>,
    /// Domain the client announced in HELO/EHLO.
    pub client_domain: Option<String>,
    /// Remote address of the connection.
    pub peer: Option<SocketAddr>,
    /// When the final `.` was received.
    pub received_at: SystemTime,
}

impl Envelope {
    /// Check if this message was sent to a specific recipient.
    pub fn has_recipient(&self, recipient: &str) -> bool {
        self.rcpt_to
            .iter()
            .any(|addr| addr.eq_ignore_ascii_case(recipient))
    }

    /// Size of the message content in bytes.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }
}
