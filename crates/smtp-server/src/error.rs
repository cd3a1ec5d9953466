//! Error types for the SMTP server.

use thiserror::Error;

/// Errors raised while serving an SMTP session.
///
/// Every variant maps to an SMTP reply through [`SmtpError::to_response_code`]
/// and [`SmtpError::to_response_message`].
#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid command")]
    InvalidCommand,

    #[error("Bad sequence of commands: {0}")]
    InvalidState(String),

    #[error("Syntax error: {0}")]
    InvalidSyntax(String),

    #[error("Line too long (max {max} characters)")]
    LineTooLong { max: usize },

    #[error("Path too long (max {max} characters)")]
    PathTooLong { max: usize },

    #[error("Too many recipients (max {max})")]
    TooManyRecipients { max: usize },

    #[error("Message size exceeds fixed limit (max {max} bytes)")]
    TooMuchData { max: usize },

    #[error("Domain name too long (max {max} characters)")]
    DomainTooLong { max: usize },

    #[error("User name too long (max {max} characters)")]
    UserTooLong { max: usize },

    #[error("Recipient rejected: {0}")]
    RecipientRejected(String),

    #[error("Idle timeout")]
    Timeout,
}

/// SMTP size limits from RFC 5321 section 4.5.3.
pub struct SmtpLimits;

impl SmtpLimits {
    /// Maximum length of a user name (local part).
    pub const USER_MAX_LENGTH: usize = 64;

    /// Maximum length of a domain name.
    pub const DOMAIN_MAX_LENGTH: usize = 255;

    /// Maximum length of a path (reverse-path or forward-path).
    pub const PATH_MAX_LENGTH: usize = 256;

    /// Maximum length of a command line including CRLF.
    pub const COMMAND_LINE_MAX_LENGTH: usize = 512;

    /// Maximum length of a reply line including CRLF.
    pub const REPLY_LINE_MAX_LENGTH: usize = 512;

    /// Maximum length of a text line including CRLF.
    pub const TEXT_LINE_MAX_LENGTH: usize = 1000;

    /// Maximum number of recipients per message.
    pub const MAX_RECIPIENTS: usize = 100;

    /// Default maximum message size.
    pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
}

impl SmtpError {
    /// SMTP reply code for this error.
    pub fn to_response_code(&self) -> u16 {
        match self {
            SmtpError::Io(_) => 421,
            SmtpError::InvalidCommand => 500,
            SmtpError::InvalidState(_) => 503,
            SmtpError::InvalidSyntax(_) => 501,
            SmtpError::LineTooLong { .. } => 500,
            SmtpError::PathTooLong { .. } => 501,
            SmtpError::TooManyRecipients { .. } => 452,
            SmtpError::TooMuchData { .. } => 552,
            SmtpError::DomainTooLong { .. } => 501,
            SmtpError::UserTooLong { .. } => 501,
            SmtpError::RecipientRejected(_) => 550,
            SmtpError::Timeout => 421,
        }
    }

    /// Human-readable reply text for this error.
    pub fn to_response_message(&self) -> String {
        match self {
            SmtpError::Io(_) => "Service not available, closing transmission channel".to_string(),
            SmtpError::InvalidCommand => "Syntax error, command unrecognized".to_string(),
            SmtpError::RecipientRejected(addr) => {
                format!("<{addr}>: Relay access denied")
            }
            SmtpError::Timeout => "Idle timeout, closing connection".to_string(),
            other => other.to_string(),
        }
    }
}
