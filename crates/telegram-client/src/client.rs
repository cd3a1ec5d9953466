//! Bot API HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::BotConfig;
use crate::error::TelegramError;
use crate::types::{
    AnswerCallbackQueryParams, ApiResponse, EditMessageTextParams, GetUpdatesParams, Message,
    SendMessageParams, TelegramUser, Update,
};

/// Body of methods that take no parameters.
#[derive(Serialize)]
struct NoParams {}

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    config: BotConfig,
    me: TelegramUser,
}

impl TelegramClient {
    /// Connect to the Bot API and verify the token with `getMe`.
    pub async fn connect(config: BotConfig) -> Result<Self, TelegramError> {
        if config.base_url.trim().is_empty() {
            return Err(TelegramError::Config("empty Bot API base URL".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(TelegramError::Http)?;

        let me: TelegramUser = call(&http, &config, "getMe", &NoParams {}, None).await?;
        info!(
            "Connected to Telegram as @{} ({})",
            me.username.as_deref().unwrap_or("?"),
            me.id
        );

        Ok(Self { http, config, me })
    }

    /// The bot account, as reported by `getMe` at connect time.
    pub fn me(&self) -> &TelegramUser {
        &self.me
    }

    /// Get the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Fetch the bot account again.
    pub async fn get_me(&self) -> Result<TelegramUser, TelegramError> {
        self.call("getMe", &NoParams {}).await
    }

    /// Send a message using the full parameter set.
    pub async fn send_message(&self, params: &SendMessageParams) -> Result<Message, TelegramError> {
        self.call("sendMessage", params).await
    }

    /// Send an HTML-formatted message without buttons.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        self.send_message(&SendMessageParams::html(chat_id, text)).await
    }

    /// Replace the text (and keyboard) of a sent message.
    pub async fn edit_message_text(
        &self,
        params: &EditMessageTextParams,
    ) -> Result<Message, TelegramError> {
        self.call("editMessageText", params).await
    }

    /// Acknowledge a callback query.
    pub async fn answer_callback_query(
        &self,
        params: &AnswerCallbackQueryParams,
    ) -> Result<(), TelegramError> {
        let _: bool = self.call("answerCallbackQuery", params).await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdatesParams {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: vec!["message".to_string(), "callback_query".to_string()],
        };
        // The request must outlive the server-side wait.
        let request_timeout = timeout + Duration::from_secs(10);
        call(&self.http, &self.config, "getUpdates", &params, Some(request_timeout)).await
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, TelegramError> {
        call(&self.http, &self.config, method, params, None).await
    }
}

async fn call<P: Serialize, R: DeserializeOwned>(
    http: &Client,
    config: &BotConfig,
    method: &str,
    params: &P,
    timeout: Option<Duration>,
) -> Result<R, TelegramError> {
    debug!("Bot API call: {}", method);

    let mut request = http.post(config.method_url(method)).json(params);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request
        .send()
        .await
        .map_err(|e| TelegramError::Http(e.without_url()))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TelegramError::Http(e.without_url()))?;

    match serde_json::from_str::<ApiResponse<R>>(&body) {
        Ok(api) => api.into_result(),
        Err(_) if !status.is_success() => Err(TelegramError::Api {
            code: i32::from(status.as_u16()),
            description: body,
        }),
        Err(e) => Err(TelegramError::Json(e)),
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.config.base_url)
            .field("bot_id", &self.me.id)
            .finish()
    }
}
