//! SMTP server: accepts connections and drives sessions.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::commands::Command;
use crate::error::{SmtpError, SmtpLimits};
use crate::handler::MailHandler;
use crate::response::SmtpResponse;
use crate::session::SmtpSession;

/// Default time a client may stay silent before the connection is closed.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Upper bound on bytes read for one line before it is treated as too long.
const MAX_READ_LINE: usize = 64 * 1024;

/// An SMTP server that hands accepted mail to a [`MailHandler`].
#[derive(Debug, Clone)]
pub struct SmtpServer {
    hostname: String,
    max_message_size: usize,
    idle_timeout: Duration,
}

impl SmtpServer {
    /// Create a server announcing the given host name.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            max_message_size: SmtpLimits::DEFAULT_MAX_MESSAGE_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Set the largest accepted message.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the idle timeout.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Host name used in the greeting.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Accept connections forever.
    pub async fn serve(
        self,
        listener: TcpListener,
        handler: Arc<dyn MailHandler>,
    ) -> Result<(), SmtpError> {
        self.serve_with_shutdown(listener, handler, std::future::pending())
            .await
    }

    /// Accept connections until `shutdown_signal` completes.
    ///
    /// Connections already in progress are left to finish on their own.
    pub async fn serve_with_shutdown<S>(
        self,
        listener: TcpListener,
        handler: Arc<dyn MailHandler>,
        shutdown_signal: S,
    ) -> Result<(), SmtpError>
    where
        S: Future<Output = ()> + Send,
    {
        info!(
            addr = %listener.local_addr()?,
            hostname = %self.hostname,
            "SMTP server listening"
        );

        let server = Arc::new(self);
        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, SMTP server stops accepting");
                    return Ok(());
                }

                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let server = Arc::clone(&server);
                            let handler = Arc::clone(&handler);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer, handler).await {
                                    warn!(%peer, "SMTP connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                        }
                    }
                }
            }
        }
    }

    /// Drive one SMTP conversation to completion.
    async fn handle_connection(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        handler: Arc<dyn MailHandler>,
    ) -> Result<(), SmtpError> {
        debug!(%peer, "SMTP connection opened");

        let (read_half, mut writer) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut session = SmtpSession::new(Some(peer), self.max_message_size);
        let mut line = Vec::new();
        // Set while the tail of an over-long line is still arriving.
        let mut discarding = false;

        send_response(&mut writer, &SmtpResponse::greeting(&self.hostname)).await?;

        loop {
            line.clear();

            let read = timeout(
                self.idle_timeout,
                (&mut reader)
                    .take(MAX_READ_LINE as u64)
                    .read_until(b'\n', &mut line),
            )
            .await;

            match read {
                Err(_elapsed) => {
                    debug!(%peer, "SMTP client idle, closing");
                    send_response(&mut writer, &SmtpResponse::from_error(&SmtpError::Timeout))
                        .await?;
                    break;
                }
                Ok(Err(e)) => return Err(SmtpError::Io(e)),
                Ok(Ok(0)) => break,
                Ok(Ok(_)) => {}
            }

            let complete = line.ends_with(b"\n");
            if discarding {
                discarding = !complete;
                continue;
            }
            if !complete {
                discarding = true;
                if session.in_data() {
                    session.mark_line_too_long();
                } else {
                    let err = SmtpError::LineTooLong {
                        max: SmtpLimits::COMMAND_LINE_MAX_LENGTH,
                    };
                    send_response(&mut writer, &SmtpResponse::from_error(&err)).await?;
                }
                continue;
            }

            let content = strip_line_ending(&line);

            if session.in_data() {
                if content == b"." {
                    let response = match session.finish_data() {
                        Ok(envelope) => {
                            info!(
                                %peer,
                                from = %envelope.mail_from,
                                recipients = envelope.rcpt_to.len(),
                                size = envelope.data_size(),
                                "Message received"
                            );
                            match handler.handle_mail(envelope).await {
                                Ok(()) => SmtpResponse::queued(),
                                Err(e) => {
                                    error!(%peer, "Mail handler failed: {}", e);
                                    SmtpResponse::local_error()
                                }
                            }
                        }
                        Err(e) => SmtpResponse::from_error(&e),
                    };
                    send_response(&mut writer, &response).await?;
                } else {
                    // Undo dot-stuffing.
                    let content = content.strip_prefix(b".").unwrap_or(content);
                    session.add_data_line(content);
                }
                continue;
            }

            let text = String::from_utf8_lossy(content);
            if text.trim().is_empty() {
                continue;
            }

            let response = match Command::parse(&text) {
                Ok(command) => {
                    debug!(%peer, ?command, "SMTP command");
                    self.execute(command, &mut session, handler.as_ref())
                        .await
                        .unwrap_or_else(|e| SmtpResponse::from_error(&e))
                }
                Err(e) => SmtpResponse::from_error(&e),
            };

            send_response(&mut writer, &response).await?;
            if response.closes_connection() {
                break;
            }
        }

        debug!(%peer, "SMTP connection closed");
        Ok(())
    }

    /// Apply a command to the session.
    async fn execute(
        &self,
        command: Command,
        session: &mut SmtpSession,
        handler: &dyn MailHandler,
    ) -> Result<SmtpResponse, SmtpError> {
        match command {
            Command::Helo(domain) => {
                let response = SmtpResponse::helo(&self.hostname, &domain);
                session.greet(domain);
                Ok(response)
            }
            Command::Ehlo(domain) => {
                let response = SmtpResponse::ehlo(&self.hostname, &domain, self.max_message_size);
                session.greet(domain);
                Ok(response)
            }
            Command::Mail { from, size } => {
                session.set_sender(from, size)?;
                Ok(SmtpResponse::ok())
            }
            Command::Rcpt(address) => {
                session.check_can_add_recipient()?;
                if !handler.accept_recipient(&address).await {
                    debug!(%address, "Recipient rejected");
                    return Err(SmtpError::RecipientRejected(address));
                }
                session.add_recipient(address)?;
                Ok(SmtpResponse::ok())
            }
            Command::Data => {
                session.start_data()?;
                Ok(SmtpResponse::data_start())
            }
            Command::Rset => {
                session.reset();
                Ok(SmtpResponse::ok())
            }
            Command::Noop => Ok(SmtpResponse::ok()),
            Command::Vrfy => Ok(SmtpResponse::cannot_verify()),
            Command::Help => Ok(SmtpResponse::help()),
            Command::Quit => Ok(SmtpResponse::quit()),
        }
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

async fn send_response(writer: &mut OwnedWriteHalf, response: &SmtpResponse) -> Result<(), SmtpError> {
    writer.write_all(response.format().as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
