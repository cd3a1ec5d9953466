//! SMTP session state management.

use std::net::SocketAddr;
use std::time::SystemTime;

use crate::envelope::Envelope;
use crate::error::{SmtpError, SmtpLimits};

/// Current state of an SMTP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpState {
    /// Waiting for HELO/EHLO.
    Initial,
    /// Greeted, ready for MAIL.
    Greeted,
    /// MAIL FROM received, waiting for RCPT.
    MailReceived,
    /// At least one RCPT TO accepted.
    RecipientsReceived,
    /// Collecting message content after DATA.
    Data,
}

/// State and transaction data of one SMTP connection.
#[derive(Debug)]
pub struct SmtpSession {
    state: SmtpState,
    client_domain: Option<String>,
    peer: Option<SocketAddr>,
    from: Option<String>,
    to: Vec<String>,
    data: Vec<u8>,
    max_message_size: usize,
    /// Error hit while collecting data; reported once the terminator arrives.
    data_error: Option<SmtpError>,
}

impl SmtpSession {
    /// Create a session for a connection.
    pub fn new(peer: Option<SocketAddr>, max_message_size: usize) -> Self {
        Self {
            state: SmtpState::Initial,
            client_domain: None,
            peer,
            from: None,
            to: Vec::new(),
            data: Vec::new(),
            max_message_size,
            data_error: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SmtpState {
        self.state
    }

    /// Whether message content is being collected.
    pub fn in_data(&self) -> bool {
        self.state == SmtpState::Data
    }

    /// Domain given in HELO/EHLO.
    pub fn client_domain(&self) -> Option<&str> {
        self.client_domain.as_deref()
    }

    /// Accepted recipients of the current transaction.
    pub fn recipients(&self) -> &[String] {
        &self.to
    }

    /// Record the HELO/EHLO domain; any open transaction is discarded.
    pub fn greet(&mut self, domain: String) {
        self.client_domain = Some(domain);
        self.reset();
    }

    /// Discard the current transaction.
    ///
    /// The greeting survives a reset.
    pub fn reset(&mut self) {
        self.state = if self.client_domain.is_some() {
            SmtpState::Greeted
        } else {
            SmtpState::Initial
        };
        self.from = None;
        self.to.clear();
        self.data.clear();
        self.data_error = None;
    }

    /// Start a transaction with the given reverse-path.
    pub fn set_sender(&mut self, sender: String, declared_size: Option<usize>) -> Result<(), SmtpError> {
        match self.state {
            SmtpState::Greeted => {}
            SmtpState::Initial => {
                return Err(SmtpError::InvalidState("send HELO/EHLO first".to_string()))
            }
            _ => return Err(SmtpError::InvalidState("nested MAIL command".to_string())),
        }

        if declared_size.is_some_and(|size| size > self.max_message_size) {
            return Err(SmtpError::TooMuchData {
                max: self.max_message_size,
            });
        }

        self.from = Some(sender);
        self.state = SmtpState::MailReceived;
        Ok(())
    }

    /// Check that RCPT is allowed now.
    pub fn check_can_add_recipient(&self) -> Result<(), SmtpError> {
        match self.state {
            SmtpState::MailReceived | SmtpState::RecipientsReceived => {}
            _ => return Err(SmtpError::InvalidState("need MAIL before RCPT".to_string())),
        }
        if self.to.len() >= SmtpLimits::MAX_RECIPIENTS {
            return Err(SmtpError::TooManyRecipients {
                max: SmtpLimits::MAX_RECIPIENTS,
            });
        }
        Ok(())
    }

    /// Add an accepted recipient.
    pub fn add_recipient(&mut self, recipient: String) -> Result<(), SmtpError> {
        self.check_can_add_recipient()?;
        self.to.push(recipient);
        self.state = SmtpState::RecipientsReceived;
        Ok(())
    }

    /// Enter data mode.
    pub fn start_data(&mut self) -> Result<(), SmtpError> {
        if self.state != SmtpState::RecipientsReceived {
            return Err(SmtpError::InvalidState("need RCPT before DATA".to_string()));
        }
        self.data.clear();
        self.data_error = None;
        self.state = SmtpState::Data;
        Ok(())
    }

    /// Append one content line (without CRLF, dot-stuffing already undone).
    ///
    /// Limit violations are remembered and reported by [`Self::finish_data`],
    /// so the rest of the content can still be drained.
    pub fn add_data_line(&mut self, line: &[u8]) {
        if self.data_error.is_some() {
            return;
        }

        let line_size = line.len() + 2;
        if line_size > SmtpLimits::TEXT_LINE_MAX_LENGTH {
            self.data_error = Some(SmtpError::LineTooLong {
                max: SmtpLimits::TEXT_LINE_MAX_LENGTH,
            });
            self.data.clear();
            return;
        }
        if self.data.len() + line_size > self.max_message_size {
            self.data_error = Some(SmtpError::TooMuchData {
                max: self.max_message_size,
            });
            self.data.clear();
            return;
        }

        self.data.extend_from_slice(line);
        self.data.extend_from_slice(b"\r\n");
    }

    /// Flag that an over-long line was seen by the reader.
    pub fn mark_line_too_long(&mut self) {
        if self.data_error.is_none() {
            self.data_error = Some(SmtpError::LineTooLong {
                max: SmtpLimits::TEXT_LINE_MAX_LENGTH,
            });
            self.data.clear();
        }
    }

    /// Finish data collection and take the envelope.
    ///
    /// The session returns to the greeted state either way.
    pub fn finish_data(&mut self) -> Result<Envelope, SmtpError> {
        if self.state != SmtpState::Data {
            return Err(SmtpError::InvalidState("not collecting data".to_string()));
        }

        if let Some(err) = self.data_error.take() {
            self.reset();
            return Err(err);
        }

        let envelope = Envelope {
            mail_from: self.from.take().unwrap_or_default(),
            rcpt_to: std::mem::take(&mut self.to),
            data: std::mem::take(&mut self.data),
            client_domain: self.client_domain.clone(),
            peer: self.peer,
            received_at: SystemTime::now(),
        };

        self.reset();
        Ok(envelope)
    }
}
