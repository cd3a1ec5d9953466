//! Bot API wire types.

use serde::{Deserialize, Serialize};

use crate::error::TelegramError;

/// Envelope of every Bot API answer.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
}

impl<T> ApiResponse<T> {
    /// The result of a successful call, or the API error.
    pub fn into_result(self) -> Result<T, TelegramError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(TelegramError::Api {
                code: -1,
                description: "No result in response".to_string(),
            }),
            (false, _) => Err(TelegramError::Api {
                code: self.error_code.unwrap_or(-1),
                description: self.description.unwrap_or_default(),
            }),
        }
    }
}

/// An incoming update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: Chat,
    /// Unix time; 0 for messages the bot can no longer access.
    #[serde(default)]
    pub date: i64,
    pub text: Option<String>,
}

impl Message {
    /// The bot command this message starts with, without `/` and `@botname`.
    pub fn command(&self) -> Option<&str> {
        let text = self.text.as_deref()?.trim();
        let word = text.strip_prefix('/')?.split_whitespace().next()?;
        Some(word.split('@').next().unwrap_or(word))
    }
}

/// A chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub username: Option<String>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl TelegramUser {
    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Text formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    MarkdownV2,
}

/// Buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// One button per row.
    pub fn single_column(buttons: impl IntoIterator<Item = InlineKeyboardButton>) -> Self {
        Self {
            inline_keyboard: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// Append a row.
    pub fn row(mut self, buttons: Vec<InlineKeyboardButton>) -> Self {
        self.inline_keyboard.push(buttons);
        self
    }
}

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    /// A button that sends `data` back as a callback query.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    /// A button that opens a link.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessageParams {
    /// Plain text message.
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    /// HTML-formatted message.
    pub fn html(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            parse_mode: Some(ParseMode::Html),
            ..Self::text(chat_id, text)
        }
    }

    /// Attach an inline keyboard.
    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(keyboard);
        self
    }
}

/// Parameters for `editMessageText`.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageTextParams {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageTextParams {
    /// Replace a message with HTML-formatted text.
    pub fn html(chat_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
            parse_mode: Some(ParseMode::Html),
            reply_markup: None,
        }
    }

    /// Attach an inline keyboard.
    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(keyboard);
        self
    }
}

/// Parameters for `answerCallbackQuery`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQueryParams {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_alert: bool,
}

impl AnswerCallbackQueryParams {
    /// Acknowledge without any visible feedback.
    pub fn ack(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: None,
            show_alert: false,
        }
    }

    /// Acknowledge with a toast.
    pub fn toast(callback_query_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::ack(callback_query_id)
        }
    }

    /// Acknowledge with a modal alert.
    pub fn alert(callback_query_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            show_alert: true,
            ..Self::toast(callback_query_id, text)
        }
    }
}

/// Parameters for `getUpdates`.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Long-polling timeout in seconds.
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_message_update() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": {"id": 42, "is_bot": false, "first_name": "Ann", "last_name": "Lee", "username": "ann"},
                "chat": {"id": 42, "type": "private", "username": "ann"},
                "date": 1700000000,
                "text": "/start@tempmail_bot hello"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let message = update.message.unwrap();

        assert_eq!(update.update_id, 10);
        assert_eq!(message.chat.kind, "private");
        assert_eq!(message.command(), Some("start"));
        assert_eq!(message.from.unwrap().full_name(), "Ann Lee");
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn test_deserialize_callback_update() {
        let json = r#"{
            "update_id": 11,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
                "message": {"message_id": 6, "chat": {"id": 42, "type": "private"}, "date": 0},
                "data": "msg:3"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let query = update.callback_query.unwrap();

        assert_eq!(query.data.as_deref(), Some("msg:3"));
        assert_eq!(query.from.full_name(), "Ann");
        assert_eq!(query.message.unwrap().message_id, 6);
    }

    #[test]
    fn test_command_requires_slash() {
        let message: Message = serde_json::from_str(
            r#"{"message_id": 1, "chat": {"id": 1, "type": "private"}, "text": "start"}"#,
        )
        .unwrap();
        assert_eq!(message.command(), None);
    }

    #[test]
    fn test_serialize_send_params() {
        let params = SendMessageParams::html(42, "<b>hi</b>").with_keyboard(
            InlineKeyboardMarkup::single_column([InlineKeyboardButton::callback("Refresh", "refresh")])
                .row(vec![InlineKeyboardButton::url("Site", "https://example.org")]),
        );
        let value = serde_json::to_value(&params).unwrap();

        assert_eq!(value["parse_mode"], "HTML");
        assert_eq!(value["reply_markup"]["inline_keyboard"][0][0]["callback_data"], "refresh");
        assert!(value["reply_markup"]["inline_keyboard"][0][0].get("url").is_none());
        assert_eq!(value["reply_markup"]["inline_keyboard"][1][0]["url"], "https://example.org");
    }

    #[test]
    fn test_serialize_answer_params() {
        let ack = serde_json::to_value(AnswerCallbackQueryParams::ack("q")).unwrap();
        assert!(ack.get("show_alert").is_none());
        assert!(ack.get("text").is_none());

        let alert = serde_json::to_value(AnswerCallbackQueryParams::alert("q", "bad")).unwrap();
        assert_eq!(alert["show_alert"], true);
        assert_eq!(alert["text"], "bad");
    }

    #[test]
    fn test_api_response_error() {
        let response: ApiResponse<Message> = serde_json::from_str(
            r#"{"ok": false, "error_code": 403, "description": "Forbidden: bot was blocked by the user"}"#,
        )
        .unwrap();

        match response.into_result() {
            Err(TelegramError::Api { code, description }) => {
                assert_eq!(code, 403);
                assert!(description.contains("blocked"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
