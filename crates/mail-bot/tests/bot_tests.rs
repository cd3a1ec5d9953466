//! Bot behaviour against a local fake of the Bot API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use database::{email, mailbox, user, Database, NewEmail};
use mail_bot::MailBot;
use relay::EmailNotice;
use serde_json::{json, Value};
use telegram_client::{BotConfig, TelegramClient, Update};
use tokio::net::TcpListener;

const TOKEN: &str = "42:FAKE";
const DOMAIN: &str = "tempmail.test";

#[derive(Clone, Default)]
struct FakeApi {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    not_modified: Arc<AtomicBool>,
}

impl FakeApi {
    fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn last(&self, method: &str) -> Value {
        self.calls_to(method).pop().unwrap_or(Value::Null)
    }
}

async fn handle(
    State(api): State<FakeApi>,
    Path((_bot, method)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    api.calls.lock().unwrap().push((method.clone(), body.clone()));

    let result = match method.as_str() {
        "getMe" => json!({"id": 1, "is_bot": true, "first_name": "Mail", "username": "mail_bot"}),
        "sendMessage" | "editMessageText" => {
            if method == "editMessageText" && api.not_modified.load(Ordering::SeqCst) {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "ok": false,
                        "error_code": 400,
                        "description": "Bad Request: message is not modified"
                    })),
                );
            }
            json!({
                "message_id": body["message_id"].as_i64().unwrap_or(500),
                "chat": {"id": body["chat_id"], "type": "private"},
                "date": 1700000000,
                "text": body["text"]
            })
        }
        "answerCallbackQuery" => json!(true),
        _ => json!(null),
    };
    (StatusCode::OK, Json(json!({"ok": true, "result": result})))
}

struct Harness {
    api: FakeApi,
    bot: MailBot,
    db: Database,
}

async fn setup() -> Harness {
    let api = FakeApi::default();
    let app = Router::new()
        .route("/:bot/:method", post(handle))
        .with_state(api.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = TelegramClient::connect(
        BotConfig::new(TOKEN).with_base_url(format!("http://{}", addr)),
    )
    .await
    .unwrap();

    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();

    Harness {
        api,
        bot: MailBot::new(client, db.clone(), DOMAIN),
        db,
    }
}

fn command(update_id: i64, telegram_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": telegram_id, "is_bot": false, "first_name": "Ann", "username": "ann"},
            "chat": {"id": telegram_id, "type": "private"},
            "date": 1700000000,
            "text": text
        }
    }))
    .unwrap()
}

fn press(update_id: i64, telegram_id: i64, data: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb{}", update_id),
            "from": {"id": telegram_id, "is_bot": false, "first_name": "Ann"},
            "message": {
                "message_id": 77,
                "chat": {"id": telegram_id, "type": "private"},
                "date": 1700000000
            },
            "data": data
        }
    }))
    .unwrap()
}

async fn store_mail(db: &Database, address: &str, subject: &str) -> i64 {
    let mb = mailbox::get_mailbox_by_address(db.pool(), address)
        .await
        .unwrap()
        .unwrap();
    email::save_email(
        db.pool(),
        &NewEmail {
            mailbox_id: mb.id,
            recipient: address.to_string(),
            sender_email: Some("shop@example.org".to_string()),
            subject: Some(subject.to_string()),
            body: Some("Your code is 1234".to_string()),
            body_html: Some(r#"<a href="https://example.org/c">Confirm</a>"#.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

async fn address_of(db: &Database, telegram_id: i64) -> String {
    let owner = user::get_user_by_telegram_id(db.pool(), telegram_id)
        .await
        .unwrap()
        .unwrap();
    mailbox::get_mailbox_for_user(db.pool(), owner.id)
        .await
        .unwrap()
        .unwrap()
        .address
}

#[tokio::test]
async fn test_start_registers_and_sends_dashboard() {
    let h = setup().await;

    h.bot.handle_update(&command(1, 100, "/start")).await.unwrap();
    let address = address_of(&h.db, 100).await;
    assert!(address.ends_with("@tempmail.test"));

    let sent = h.api.last("sendMessage");
    assert_eq!(sent["chat_id"], 100);
    assert_eq!(sent["parse_mode"], "HTML");
    assert!(sent["text"].as_str().unwrap().contains(&address));
    assert_eq!(sent["reply_markup"]["inline_keyboard"][0][0]["callback_data"], "noop");

    h.bot.handle_update(&command(2, 100, "/inbox")).await.unwrap();
    assert_eq!(address_of(&h.db, 100).await, address);
    assert_eq!(user::count_users(h.db.pool()).await.unwrap(), 1);
    assert_eq!(h.api.calls_to("sendMessage").len(), 2);
}

#[tokio::test]
async fn test_help_and_plain_text() {
    let h = setup().await;

    h.bot.handle_update(&command(1, 100, "/help")).await.unwrap();
    assert!(h.api.last("sendMessage")["text"].as_str().unwrap().contains("/inbox"));

    h.bot.handle_update(&command(2, 100, "hello")).await.unwrap();
    assert_eq!(h.api.calls_to("sendMessage").len(), 1);
}

#[tokio::test]
async fn test_change_address_edits_dashboard() {
    let h = setup().await;
    h.bot.handle_update(&command(1, 100, "/start")).await.unwrap();
    let old = address_of(&h.db, 100).await;
    store_mail(&h.db, &old, "Old mail").await;

    h.bot.handle_update(&press(2, 100, "change")).await.unwrap();
    let new = address_of(&h.db, 100).await;
    assert_ne!(old, new);
    assert!(mailbox::get_mailbox_by_address(h.db.pool(), &old).await.unwrap().is_none());

    let edited = h.api.last("editMessageText");
    assert_eq!(edited["message_id"], 77);
    assert!(edited["text"].as_str().unwrap().contains(&new));
    assert!(edited["text"].as_str().unwrap().contains("Messages: 0"));

    let answer = h.api.last("answerCallbackQuery");
    assert_eq!(answer["text"], format!("New address: {}", new));
}

#[tokio::test]
async fn test_refresh_ignores_not_modified() {
    let h = setup().await;
    h.bot.handle_update(&command(1, 100, "/start")).await.unwrap();
    h.api.not_modified.store(true, Ordering::SeqCst);

    h.bot.handle_update(&press(2, 100, "refresh")).await.unwrap();
    assert_eq!(h.api.last("answerCallbackQuery")["text"], "List updated");
}

#[tokio::test]
async fn test_open_mail_checks_ownership() {
    let h = setup().await;
    h.bot.handle_update(&command(1, 100, "/start")).await.unwrap();
    h.bot.handle_update(&command(2, 200, "/start")).await.unwrap();
    let own = store_mail(&h.db, &address_of(&h.db, 100).await, "Code & stuff").await;
    let foreign = store_mail(&h.db, &address_of(&h.db, 200).await, "Private").await;

    h.bot.handle_update(&press(3, 100, &format!("msg:{}", own))).await.unwrap();
    let shown = h.api.last("sendMessage");
    let text = shown["text"].as_str().unwrap();
    assert!(text.contains("Code &amp; stuff"));
    assert!(text.contains("<pre>Your code is 1234</pre>"));
    assert!(text.contains("https://example.org/c"));

    h.bot.handle_update(&press(4, 100, &format!("msg:{}", foreign))).await.unwrap();
    let answer = h.api.last("answerCallbackQuery");
    assert_eq!(answer["text"], "Mail not found");
    assert_eq!(answer["show_alert"], true);

    h.bot.handle_update(&press(5, 100, "msg:abc")).await.unwrap();
    assert_eq!(h.api.last("answerCallbackQuery")["text"], "Invalid request");

    h.bot.handle_update(&press(6, 100, "noop")).await.unwrap();
    assert_eq!(h.api.last("answerCallbackQuery")["text"], "No mail yet");
}

#[tokio::test]
async fn test_notify_owner_only() {
    let h = setup().await;
    h.bot.handle_update(&command(1, 100, "/start")).await.unwrap();
    let address = address_of(&h.db, 100).await;
    let id = store_mail(&h.db, &address, "Welcome").await;

    let notice = EmailNotice {
        email_id: id,
        recipient: address.clone(),
        sender: "Shop <shop@example.org>".to_string(),
        subject: "Welcome".to_string(),
        body_plain: "Your code is 1234".to_string(),
        body_html: r#"<a href="https://example.org/c">Confirm</a>"#.to_string(),
    };
    assert!(h.bot.notify(&notice).await.unwrap());

    let sent = h.api.last("sendMessage");
    assert_eq!(sent["chat_id"], 100);
    assert!(sent["text"].as_str().unwrap().contains("New mail"));
    assert_eq!(sent["reply_markup"]["inline_keyboard"][0][0]["url"], "https://example.org/c");
    assert_eq!(
        sent["reply_markup"]["inline_keyboard"][1][0]["callback_data"],
        format!("msg:{}", id)
    );

    let anonymous = mailbox::create_anonymous_mailbox(h.db.pool(), DOMAIN).await.unwrap();
    let skipped = EmailNotice {
        recipient: anonymous.address,
        ..notice
    };
    assert!(!h.bot.notify(&skipped).await.unwrap());
}
