//! SMTP command parsing.

use crate::error::{SmtpError, SmtpLimits};

/// A parsed SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Helo(String),
    Ehlo(String),
    /// `MAIL FROM:<path>`; an empty path is the null reverse-path.
    Mail { from: String, size: Option<usize> },
    Rcpt(String),
    Data,
    Rset,
    Noop,
    Vrfy,
    Help,
    Quit,
}

impl Command {
    /// Parse a command line (without the trailing CRLF).
    pub fn parse(line: &str) -> Result<Self, SmtpError> {
        if line.len() + 2 > SmtpLimits::COMMAND_LINE_MAX_LENGTH {
            return Err(SmtpError::LineTooLong {
                max: SmtpLimits::COMMAND_LINE_MAX_LENGTH,
            });
        }

        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_uppercase().as_str() {
            "HELO" => Ok(Command::Helo(parse_domain(rest, "HELO")?)),
            "EHLO" => Ok(Command::Ehlo(parse_domain(rest, "EHLO")?)),
            "MAIL" => {
                let (path, params) = parse_path(rest, "FROM:")?;
                if !path.is_empty() {
                    validate_address(&path)?;
                }
                Ok(Command::Mail {
                    from: path,
                    size: parse_size_param(params)?,
                })
            }
            "RCPT" => {
                let (path, _params) = parse_path(rest, "TO:")?;
                if path.is_empty() {
                    return Err(SmtpError::InvalidSyntax(
                        "TO address cannot be empty".to_string(),
                    ));
                }
                validate_address(&path)?;
                Ok(Command::Rcpt(path))
            }
            "DATA" => no_args(rest, Command::Data),
            "RSET" => no_args(rest, Command::Rset),
            "NOOP" => Ok(Command::Noop),
            "VRFY" => Ok(Command::Vrfy),
            "HELP" => Ok(Command::Help),
            "QUIT" => no_args(rest, Command::Quit),
            _ => Err(SmtpError::InvalidCommand),
        }
    }
}

fn no_args(rest: &str, command: Command) -> Result<Command, SmtpError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(SmtpError::InvalidSyntax("command takes no arguments".to_string()))
    }
}

fn parse_domain(rest: &str, verb: &str) -> Result<String, SmtpError> {
    let domain = rest.split_whitespace().next().ok_or_else(|| {
        SmtpError::InvalidSyntax(format!("{verb} requires domain argument"))
    })?;

    if domain.len() > SmtpLimits::DOMAIN_MAX_LENGTH {
        return Err(SmtpError::DomainTooLong {
            max: SmtpLimits::DOMAIN_MAX_LENGTH,
        });
    }

    Ok(domain.to_string())
}

/// Split `FROM:<path> params` into the path and the parameter string.
///
/// A space after the colon and a source route (`<@a,@b:user@host>`) are
/// tolerated.
fn parse_path<'a>(rest: &'a str, keyword: &str) -> Result<(String, &'a str), SmtpError> {
    let prefix = rest.get(..keyword.len()).unwrap_or("");
    if !prefix.eq_ignore_ascii_case(keyword) {
        return Err(SmtpError::InvalidSyntax(format!(
            "expected '{keyword}<address>'"
        )));
    }

    let after = rest[keyword.len()..].trim_start();
    if !after.starts_with('<') {
        return Err(SmtpError::InvalidSyntax(
            "address must be enclosed in angle brackets".to_string(),
        ));
    }
    let end = after.find('>').ok_or_else(|| {
        SmtpError::InvalidSyntax("address must be enclosed in angle brackets".to_string())
    })?;

    let mut path = &after[1..end];
    if path.len() > SmtpLimits::PATH_MAX_LENGTH {
        return Err(SmtpError::PathTooLong {
            max: SmtpLimits::PATH_MAX_LENGTH,
        });
    }
    if path.starts_with('@') {
        if let Some((_, mailbox)) = path.split_once(':') {
            path = mailbox;
        }
    }

    Ok((path.to_string(), after[end + 1..].trim()))
}

fn parse_size_param(params: &str) -> Result<Option<usize>, SmtpError> {
    for param in params.split_whitespace() {
        if let Some((key, value)) = param.split_once('=') {
            if key.eq_ignore_ascii_case("SIZE") {
                let size = value
                    .parse()
                    .map_err(|_| SmtpError::InvalidSyntax("invalid SIZE value".to_string()))?;
                return Ok(Some(size));
            }
        }
    }
    Ok(None)
}

/// Validate address format and RFC size limits.
fn validate_address(addr: &str) -> Result<(), SmtpError> {
    let (user, domain) = addr.rsplit_once('@').ok_or_else(|| {
        SmtpError::InvalidSyntax("address must contain @ symbol".to_string())
    })?;

    if user.is_empty() || domain.is_empty() {
        return Err(SmtpError::InvalidSyntax("invalid address format".to_string()));
    }
    if user.len() > SmtpLimits::USER_MAX_LENGTH {
        return Err(SmtpError::UserTooLong {
            max: SmtpLimits::USER_MAX_LENGTH,
        });
    }
    if domain.len() > SmtpLimits::DOMAIN_MAX_LENGTH {
        return Err(SmtpError::DomainTooLong {
            max: SmtpLimits::DOMAIN_MAX_LENGTH,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helo_and_ehlo() {
        assert_eq!(
            Command::parse("HELO client.local").unwrap(),
            Command::Helo("client.local".to_string())
        );
        assert_eq!(
            Command::parse("ehlo client.local").unwrap(),
            Command::Ehlo("client.local".to_string())
        );
        assert!(matches!(
            Command::parse("HELO"),
            Err(SmtpError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_mail_from() {
        assert_eq!(
            Command::parse("MAIL FROM:<alice@example.com>").unwrap(),
            Command::Mail {
                from: "alice@example.com".to_string(),
                size: None
            }
        );
        assert_eq!(
            Command::parse("mail from: <alice@example.com> SIZE=2048 BODY=8BITMIME").unwrap(),
            Command::Mail {
                from: "alice@example.com".to_string(),
                size: Some(2048)
            }
        );
    }

    #[test]
    fn test_null_reverse_path() {
        assert_eq!(
            Command::parse("MAIL FROM:<>").unwrap(),
            Command::Mail {
                from: String::new(),
                size: None
            }
        );
    }

    #[test]
    fn test_rcpt_to() {
        assert_eq!(
            Command::parse("RCPT TO:<bob@example.com>").unwrap(),
            Command::Rcpt("bob@example.com".to_string())
        );
        assert_eq!(
            Command::parse("RCPT TO:<@relay.one,@relay.two:bob@example.com>").unwrap(),
            Command::Rcpt("bob@example.com".to_string())
        );
        assert!(matches!(
            Command::parse("RCPT TO:<>"),
            Err(SmtpError::InvalidSyntax(_))
        ));
        assert!(matches!(
            Command::parse("RCPT TO:bob@example.com"),
            Err(SmtpError::InvalidSyntax(_))
        ));
        assert!(matches!(
            Command::parse("RCPT FROM:<bob@example.com>"),
            Err(SmtpError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_address_limits() {
        let long_user = format!("<{}@example.com>", "a".repeat(SmtpLimits::USER_MAX_LENGTH + 1));
        assert!(matches!(
            Command::parse(&format!("RCPT TO:{long_user}")),
            Err(SmtpError::UserTooLong { .. })
        ));
        assert!(matches!(
            Command::parse("RCPT TO:<no-at-sign>"),
            Err(SmtpError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse("DATA").unwrap(), Command::Data);
        assert_eq!(Command::parse("rset").unwrap(), Command::Rset);
        assert_eq!(Command::parse("NOOP ignored").unwrap(), Command::Noop);
        assert_eq!(Command::parse("VRFY bob").unwrap(), Command::Vrfy);
        assert_eq!(Command::parse("HELP").unwrap(), Command::Help);
        assert_eq!(Command::parse("QUIT").unwrap(), Command::Quit);
        assert!(matches!(
            Command::parse("DATA now"),
            Err(SmtpError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_unknown_and_long_lines() {
        assert!(matches!(
            Command::parse("STARTTLS"),
            Err(SmtpError::InvalidCommand)
        ));
        let long = format!("NOOP {}", "x".repeat(SmtpLimits::COMMAND_LINE_MAX_LENGTH));
        assert!(matches!(
            Command::parse(&long),
            Err(SmtpError::LineTooLong { .. })
        ));
    }
}
