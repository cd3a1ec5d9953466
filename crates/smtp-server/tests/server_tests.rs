//! End-to-end tests driving the SMTP server over TCP.

use std::sync::Arc;
use std::time::Duration;

use smtp_server::{async_trait, Envelope, HandlerError, MailHandler, SmtpServer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Records delivered envelopes; rejects recipients outside `example.com`.
#[derive(Default)]
struct RecordingHandler {
    delivered: Mutex<Vec<Envelope>>,
    fail: bool,
}

#[async_trait]
impl MailHandler for RecordingHandler {
    async fn accept_recipient(&self, address: &str) -> bool {
        address.to_ascii_lowercase().ends_with("@example.com")
    }

    async fn handle_mail(&self, envelope: Envelope) -> Result<(), HandlerError> {
        if self.fail {
            return Err("storage unavailable".into());
        }
        self.delivered.lock().await.push(envelope);
        Ok(())
    }
}

async fn start_server(handler: Arc<RecordingHandler>, server: SmtpServer) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.serve(listener, handler).await;
    });
    addr
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: &str) -> (Self, String) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer,
        };
        let greeting = client.read_reply().await;
        (client, greeting)
    }

    /// Read a full (possibly multiline) reply.
    async fn read_reply(&mut self) -> String {
        let mut reply = String::new();
        loop {
            let mut line = String::new();
            self.reader.read_line(&mut line).await.unwrap();
            reply.push_str(&line);
            if line.len() < 4 || line.as_bytes()[3] != b'-' {
                return reply;
            }
        }
    }

    async fn send_raw(&mut self, data: &str) {
        self.writer.write_all(data.as_bytes()).await.unwrap();
    }

    async fn command(&mut self, command: &str) -> String {
        self.send_raw(&format!("{command}\r\n")).await;
        self.read_reply().await
    }
}

#[tokio::test]
async fn test_full_transaction() {
    let handler = Arc::new(RecordingHandler::default());
    let addr = start_server(handler.clone(), SmtpServer::new("mx.test")).await;

    let (mut client, greeting) = Client::connect(&addr).await;
    assert!(greeting.starts_with("220 mx.test"));

    let ehlo = client.command("EHLO client.test").await;
    assert!(ehlo.starts_with("250-mx.test Hello client.test"));
    assert!(ehlo.contains("250-8BITMIME"));

    assert!(client.command("MAIL FROM:<alice@sender.org>").await.starts_with("250"));
    assert!(client.command("RCPT TO:<Box1@example.com>").await.starts_with("250"));
    assert!(client.command("RCPT TO:<box2@example.com>").await.starts_with("250"));
    assert!(client.command("DATA").await.starts_with("354"));

    client
        .send_raw("Subject: test\r\n\r\nfirst line\r\n\r\n..dotted\r\n.\r\n")
        .await;
    assert!(client.read_reply().await.starts_with("250"));
    assert!(client.command("QUIT").await.starts_with("221"));

    let delivered = handler.delivered.lock().await;
    assert_eq!(delivered.len(), 1);
    let envelope = &delivered[0];
    assert_eq!(envelope.mail_from, "alice@sender.org");
    assert_eq!(
        envelope.rcpt_to,
        vec!["Box1@example.com".to_string(), "box2@example.com".to_string()]
    );
    assert!(envelope.has_recipient("box1@example.com"));
    assert_eq!(
        envelope.data,
        b"Subject: test\r\n\r\nfirst line\r\n\r\n.dotted\r\n".to_vec()
    );
    assert_eq!(envelope.client_domain.as_deref(), Some("client.test"));
}

#[tokio::test]
async fn test_foreign_recipient_rejected() {
    let handler = Arc::new(RecordingHandler::default());
    let addr = start_server(handler.clone(), SmtpServer::new("mx.test")).await;

    let (mut client, _) = Client::connect(&addr).await;
    client.command("HELO client.test").await;
    client.command("MAIL FROM:<alice@sender.org>").await;

    let reply = client.command("RCPT TO:<victim@elsewhere.net>").await;
    assert!(reply.starts_with("550"));

    // No recipient accepted, so DATA is out of sequence.
    assert!(client.command("DATA").await.starts_with("503"));
}

#[tokio::test]
async fn test_bad_sequence_and_unknown_command() {
    let handler = Arc::new(RecordingHandler::default());
    let addr = start_server(handler, SmtpServer::new("mx.test")).await;

    let (mut client, _) = Client::connect(&addr).await;
    assert!(client.command("MAIL FROM:<a@b.c>").await.starts_with("503"));
    assert!(client.command("STARTTLS").await.starts_with("500"));
    assert!(client.command("HELO").await.starts_with("501"));
    assert!(client.command("NOOP").await.starts_with("250"));
    assert!(client.command("VRFY someone").await.starts_with("252"));
    assert!(client.command("HELP").await.starts_with("214"));
}

#[tokio::test]
async fn test_rset_discards_transaction() {
    let handler = Arc::new(RecordingHandler::default());
    let addr = start_server(handler, SmtpServer::new("mx.test")).await;

    let (mut client, _) = Client::connect(&addr).await;
    client.command("HELO client.test").await;
    client.command("MAIL FROM:<a@b.c>").await;
    client.command("RCPT TO:<x@example.com>").await;
    assert!(client.command("RSET").await.starts_with("250"));
    assert!(client.command("DATA").await.starts_with("503"));
    assert!(client.command("MAIL FROM:<a@b.c>").await.starts_with("250"));
}

#[tokio::test]
async fn test_oversized_message() {
    let handler = Arc::new(RecordingHandler::default());
    let server = SmtpServer::new("mx.test").with_max_message_size(32);
    let addr = start_server(handler.clone(), server).await;

    let (mut client, _) = Client::connect(&addr).await;
    client.command("EHLO client.test").await;
    assert!(client
        .command("MAIL FROM:<a@b.c> SIZE=100")
        .await
        .starts_with("552"));

    client.command("MAIL FROM:<a@b.c>").await;
    client.command("RCPT TO:<x@example.com>").await;
    client.command("DATA").await;
    client
        .send_raw("0123456789\r\n0123456789\r\n0123456789\r\n.\r\n")
        .await;
    assert!(client.read_reply().await.starts_with("552"));

    // The session is usable again after the failed transaction.
    assert!(client.command("MAIL FROM:<a@b.c>").await.starts_with("250"));
    assert!(handler.delivered.lock().await.is_empty());
}

#[tokio::test]
async fn test_overlong_data_line_does_not_end_data() {
    let handler = Arc::new(RecordingHandler::default());
    let addr = start_server(handler.clone(), SmtpServer::new("mx.test")).await;

    let (mut client, _) = Client::connect(&addr).await;
    client.command("EHLO client.test").await;
    client.command("MAIL FROM:<alice@sender.org>").await;
    client.command("RCPT TO:<x@example.com>").await;
    assert!(client.command("DATA").await.starts_with("354"));

    // The tail of the long line and the text after it are still message content.
    let mut data = "x".repeat(64 * 1024);
    data.push_str(".\r\n");
    data.push_str("MAIL FROM:<evil@b.c>\r\nRCPT TO:<y@example.com>\r\nDATA\r\n");
    data.push_str("Subject: second\r\n\r\nhi\r\n.\r\n");
    client.send_raw(&data).await;

    assert!(client.read_reply().await.starts_with("500"));
    // Exactly one reply was produced for the whole DATA section.
    assert!(client.command("NOOP").await.starts_with("250"));
    assert!(handler.delivered.lock().await.is_empty());
}

#[tokio::test]
async fn test_overlong_command_gets_single_reply() {
    let handler = Arc::new(RecordingHandler::default());
    let addr = start_server(handler, SmtpServer::new("mx.test")).await;

    let (mut client, _) = Client::connect(&addr).await;
    let mut line = "NOOP ".to_string();
    line.push_str(&"y".repeat(100 * 1024));
    line.push_str("\r\n");
    client.send_raw(&line).await;

    assert!(client.read_reply().await.starts_with("500"));
    assert!(client.command("HELO client.test").await.starts_with("250"));
}

#[tokio::test]
async fn test_handler_failure_is_temporary() {
    let handler = Arc::new(RecordingHandler {
        fail: true,
        ..Default::default()
    });
    let addr = start_server(handler, SmtpServer::new("mx.test")).await;

    let (mut client, _) = Client::connect(&addr).await;
    client.command("HELO client.test").await;
    client.command("MAIL FROM:<a@b.c>").await;
    client.command("RCPT TO:<x@example.com>").await;
    client.command("DATA").await;
    client.send_raw("hello\r\n.\r\n").await;
    assert!(client.read_reply().await.starts_with("451"));
}

#[tokio::test]
async fn test_idle_timeout() {
    let handler = Arc::new(RecordingHandler::default());
    let server = SmtpServer::new("mx.test").with_idle_timeout(Duration::from_millis(100));
    let addr = start_server(handler, server).await;

    let (mut client, _) = Client::connect(&addr).await;
    let reply = tokio::time::timeout(Duration::from_secs(5), client.read_reply())
        .await
        .unwrap();
    assert!(reply.starts_with("421"));
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let handler: Arc<RecordingHandler> = Arc::new(RecordingHandler::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        SmtpServer::new("mx.test")
            .serve_with_shutdown(listener, handler, async {
                let _ = rx.await;
            })
            .await
    });

    tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
