//! Message texts and keyboards.

use database::{Mailbox, StoredEmail};
use relay::EmailNotice;
use telegram_client::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::formatting::{
    escape_html, extract_links, format_datetime, is_web_link, short, split_sender, truncate_body,
};

/// Mails listed on the dashboard.
pub const MESSAGE_LIMIT: i64 = 5;
/// Characters of body shown when a mail is opened.
pub const MAX_MESSAGE_LENGTH: usize = 3500;
/// Characters of body in a new-mail notification.
pub const PREVIEW_LENGTH: usize = 200;
/// Characters of a dashboard button title.
pub const BUTTON_TITLE_LENGTH: usize = 40;
/// Link buttons attached to a notification.
pub const MAX_LINK_BUTTONS: usize = 3;
/// Links listed under an opened mail.
pub const MAX_LISTED_LINKS: usize = 10;
/// Visible characters Telegram accepts in one message.
pub const TELEGRAM_TEXT_LIMIT: usize = 4096;
/// Characters of a sender or subject shown in a message header.
pub const HEADER_FIELD_LENGTH: usize = 200;
/// Characters of a listed link title.
pub const LINK_TITLE_LENGTH: usize = 80;

const NO_SUBJECT: &str = "(no subject)";
const EMPTY_BODY: &str = "[Empty body]";

/// Callback data of the dashboard buttons.
pub mod callback {
    pub const NOOP: &str = "noop";
    pub const REFRESH: &str = "refresh";
    pub const CHANGE: &str = "change";
    pub const MESSAGE_PREFIX: &str = "msg:";

    /// Callback data opening one mail.
    pub fn message(id: i64) -> String {
        format!("{}{}", MESSAGE_PREFIX, id)
    }
}

/// Reply to `/help`.
pub const HELP_TEXT: &str = "<b>Commands</b>\n\
    /start - open the main menu\n\
    /inbox - refresh the mail list\n\
    /help - this help";

/// The main menu: mailbox details and the most recent mails.
pub fn dashboard(
    mailbox: &Mailbox,
    total: i64,
    recent: &[StoredEmail],
) -> (String, InlineKeyboardMarkup) {
    let text = format!(
        "<b>Main menu</b>\n\n\
         <b>📧 {}</b>\n\
         <b>Password:</b> <code>{}</code>\n\
         <b>Messages: {}</b>\n\
         <b>Created: {}</b>",
        escape_html(&mailbox.address),
        escape_html(&mailbox.password),
        total,
        escape_html(&format_datetime(&mailbox.created_at)),
    );

    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    if recent.is_empty() {
        rows.push(vec![InlineKeyboardButton::callback(
            "📄 Mailbox is empty",
            callback::NOOP,
        )]);
    } else {
        for mail in recent {
            let sender = match mail.sender() {
                s if s.is_empty() => "No name".to_string(),
                s => s,
            };
            let subject = mail.subject.as_deref().unwrap_or(NO_SUBJECT);
            let title = short(&format!("{} - {}", sender, subject), BUTTON_TITLE_LENGTH);
            rows.push(vec![InlineKeyboardButton::callback(
                title,
                callback::message(mail.id),
            )]);
        }
    }
    rows.push(vec![InlineKeyboardButton::callback("↻ Refresh", callback::REFRESH)]);
    rows.push(vec![InlineKeyboardButton::callback(
        "✏️ Change address",
        callback::CHANGE,
    )]);

    (text, InlineKeyboardMarkup { inline_keyboard: rows })
}

/// A full mail.
///
/// Header and link list are capped first; the body gets the rest of the
/// message limit, up to [`MAX_MESSAGE_LENGTH`].
pub fn mail_view(mail: &StoredEmail) -> String {
    let sender = match mail.sender() {
        s if s.is_empty() => "Unknown".to_string(),
        s => s,
    };
    let sender = short(&sender, HEADER_FIELD_LENGTH);
    let subject = short(mail.subject.as_deref().unwrap_or(NO_SUBJECT), HEADER_FIELD_LENGTH);
    let received = format_datetime(&mail.received_at);

    // Visible characters, as Telegram counts them after parsing the markup.
    let mut used = format!("From: {}\nSubject: {}\nReceived: {}\n\n", sender, subject, received)
        .chars()
        .count();

    let mut link_list = String::new();
    let links = extract_links(mail.body_html.as_deref().unwrap_or_default());
    if !links.is_empty() {
        link_list.push_str("\n\n<b>Links:</b>");
        used += "\n\nLinks:".chars().count();
        for (idx, link) in links.iter().take(MAX_LISTED_LINKS).enumerate() {
            let title = short(&link.title, LINK_TITLE_LENGTH);
            let entry = format!("\n{}. {}", idx + 1, title);
            used += entry.chars().count();
            link_list.push_str(&format!(
                "\n{}. <a href=\"{}\">{}</a>",
                idx + 1,
                escape_html(&link.href),
                escape_html(&title),
            ));
        }
    }

    let budget = TELEGRAM_TEXT_LIMIT.saturating_sub(used).min(MAX_MESSAGE_LENGTH);
    let body = truncate_body(mail.body.as_deref().unwrap_or_default(), budget);
    let body = if body.is_empty() { EMPTY_BODY.to_string() } else { body };

    let mut text = format!(
        "<b>From:</b> {}\n\
         <b>Subject:</b> {}\n\
         <b>Received:</b> {}\n\n\
         <pre>{}</pre>",
        escape_html(&sender),
        escape_html(&subject),
        escape_html(&received),
        escape_html(&body),
    );
    text.push_str(&link_list);
    text
}

/// The announcement of a newly stored mail.
pub fn notification(notice: &EmailNotice) -> (String, InlineKeyboardMarkup) {
    let (name, address) = split_sender(&notice.sender);
    let name = short(&name, HEADER_FIELD_LENGTH);
    let address = short(&address, HEADER_FIELD_LENGTH);
    let subject = match notice.subject.trim() {
        "" => NO_SUBJECT.to_string(),
        s => short(s, HEADER_FIELD_LENGTH),
    };
    let preview = short(&notice.body_plain, PREVIEW_LENGTH);
    let preview = if preview.is_empty() { EMPTY_BODY.to_string() } else { preview };

    let text = format!(
        "<b>🔔 New mail</b>\n\
         ├ {} &lt;{}&gt;\n\
         └ <b>{}</b>\n\n\
         {}",
        escape_html(&name),
        escape_html(&address),
        escape_html(&subject),
        escape_html(&preview),
    );

    let mut rows: Vec<Vec<InlineKeyboardButton>> = extract_links(&notice.body_html)
        .into_iter()
        .filter(|link| is_web_link(&link.href))
        .take(MAX_LINK_BUTTONS)
        .map(|link| vec![InlineKeyboardButton::url(short(&link.title, 32), link.href)])
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "🔍 Open mail",
        callback::message(notice.email_id),
    )]);

    (text, InlineKeyboardMarkup { inline_keyboard: rows })
}
