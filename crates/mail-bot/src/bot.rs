//! Update handling for the mail bot.

use async_trait::async_trait;
use database::{email, mailbox, user, Database, Mailbox, User};
use futures::StreamExt;
use relay::{EmailNotice, Notifier, NotifyError};
use telegram_client::{
    AnswerCallbackQueryParams, CallbackQuery, EditMessageTextParams, InlineKeyboardMarkup, Message,
    SendMessageParams, TelegramClient, TelegramUser, Update,
};
use tracing::{debug, error, info, warn};

use crate::error::{BotError, Result};
use crate::views::{self, callback};

/// Telegram front end for temporary mailboxes.
pub struct MailBot {
    client: TelegramClient,
    db: Database,
    domain: String,
}

impl MailBot {
    /// Create a bot issuing addresses on `domain`.
    pub fn new(client: TelegramClient, db: Database, domain: impl Into<String>) -> Self {
        Self {
            client,
            db,
            domain: domain.into(),
        }
    }

    /// Get a reference to the client.
    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    /// Process updates until the shutdown signal resolves.
    ///
    /// Errors while handling one update are logged and do not stop the loop.
    pub async fn run_with_shutdown<S>(&self, shutdown_signal: S) -> Result<()>
    where
        S: std::future::Future<Output = ()> + Send,
    {
        info!(
            "Starting mail bot @{}",
            self.client.me().username.as_deref().unwrap_or("?")
        );

        let mut updates = telegram_client::subscribe(&self.client);

        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping mail bot");
                    return Ok(());
                }

                result = updates.next() => {
                    match result {
                        Some(Ok(update)) => {
                            if let Err(e) = self.handle_update(&update).await {
                                warn!(update_id = update.update_id, "Error handling update: {}", e);
                            }
                        }
                        Some(Err(e)) => {
                            error!("Update stream error: {}", e);
                        }
                        None => {
                            warn!("Update stream ended");
                            return Err(BotError::StreamEnded);
                        }
                    }
                }
            }
        }
    }

    /// Dispatch one update.
    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        if let Some(message) = &update.message {
            return self.handle_message(message).await;
        }
        if let Some(query) = &update.callback_query {
            return self.handle_callback(query).await;
        }
        debug!(update_id = update.update_id, "Ignoring update without message or callback");
        Ok(())
    }

    async fn handle_message(&self, message: &Message) -> Result<()> {
        let Some(from) = &message.from else {
            return Ok(());
        };
        if from.is_bot {
            return Ok(());
        }

        match message.command() {
            Some("start") | Some("inbox") => {
                let user = self.register(from).await?;
                self.show_dashboard(message.chat.id, &user, None).await?;
            }
            Some("help") => {
                self.register(from).await?;
                self.client.send_text(message.chat.id, views::HELP_TEXT).await?;
            }
            Some(other) => debug!(command = other, "Ignoring unknown command"),
            None => debug!(chat_id = message.chat.id, "Ignoring plain message"),
        }
        Ok(())
    }

    async fn handle_callback(&self, query: &CallbackQuery) -> Result<()> {
        let Some(message) = &query.message else {
            self.answer(AnswerCallbackQueryParams::ack(&query.id)).await?;
            return Ok(());
        };
        let chat_id = message.chat.id;
        let data = query.data.as_deref().unwrap_or_default();

        match data {
            callback::NOOP => {
                self.answer(AnswerCallbackQueryParams::toast(&query.id, "No mail yet"))
                    .await?;
            }
            callback::REFRESH => {
                let user = self.register(&query.from).await?;
                self.show_dashboard(chat_id, &user, Some(message.message_id))
                    .await?;
                self.answer(AnswerCallbackQueryParams::toast(&query.id, "List updated"))
                    .await?;
            }
            callback::CHANGE => {
                let user = self.register(&query.from).await?;
                let mb = mailbox::change_mailbox(self.db.pool(), user.id, &self.domain).await?;
                info!(user_id = user.id, address = %mb.address, "Mailbox changed");
                self.show_dashboard(chat_id, &user, Some(message.message_id))
                    .await?;
                self.answer(AnswerCallbackQueryParams::toast(
                    &query.id,
                    format!("New address: {}", mb.address),
                ))
                .await?;
            }
            other => {
                let Some(id) = other
                    .strip_prefix(callback::MESSAGE_PREFIX)
                    .and_then(|id| id.parse::<i64>().ok())
                else {
                    self.answer(AnswerCallbackQueryParams::alert(&query.id, "Invalid request"))
                        .await?;
                    return Ok(());
                };

                let user = self.register(&query.from).await?;
                match self.find_own_mail(&user, id).await? {
                    Some(mail) => {
                        self.client
                            .send_message(&SendMessageParams::html(chat_id, views::mail_view(&mail)))
                            .await?;
                        self.answer(AnswerCallbackQueryParams::ack(&query.id)).await?;
                    }
                    None => {
                        self.answer(AnswerCallbackQueryParams::alert(&query.id, "Mail not found"))
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Record the Telegram user, logging first contacts.
    async fn register(&self, from: &TelegramUser) -> Result<User> {
        let name = from.full_name();
        let (user, created) =
            user::upsert_user(self.db.pool(), from.id, Some(&name), from.username.as_deref())
                .await?;
        if created {
            let total = user::count_users(self.db.pool()).await?;
            info!(
                telegram_id = from.id,
                username = from.username.as_deref().unwrap_or(""),
                total_users = total,
                "New user registered"
            );
        }
        Ok(user)
    }

    /// Send the main menu, or edit `message_id` into it.
    pub async fn show_dashboard(
        &self,
        chat_id: i64,
        user: &User,
        message_id: Option<i64>,
    ) -> Result<Mailbox> {
        let mb = mailbox::ensure_mailbox(self.db.pool(), user.id, &self.domain).await?;
        let total = email::count_messages(self.db.pool(), mb.id).await?;
        let recent = email::list_messages(self.db.pool(), mb.id, views::MESSAGE_LIMIT).await?;
        let (text, keyboard) = views::dashboard(&mb, total, &recent);

        match message_id {
            Some(message_id) => self.edit(chat_id, message_id, text, keyboard).await?,
            None => {
                self.client
                    .send_message(&SendMessageParams::html(chat_id, text).with_keyboard(keyboard))
                    .await?;
            }
        }
        Ok(mb)
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i64,
        text: String,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<()> {
        let params = EditMessageTextParams::html(chat_id, message_id, text).with_keyboard(keyboard);
        match self.client.edit_message_text(&params).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_modified() => {
                debug!(chat_id, message_id, "Dashboard unchanged");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A mail from the user's current mailbox.
    async fn find_own_mail(&self, user: &User, id: i64) -> Result<Option<database::StoredEmail>> {
        let Some(mb) = mailbox::get_mailbox_for_user(self.db.pool(), user.id).await? else {
            return Ok(None);
        };
        let mail = email::get_message(self.db.pool(), id).await?;
        Ok(mail.filter(|m| m.mailbox_id == mb.id))
    }

    async fn answer(&self, params: AnswerCallbackQueryParams) -> Result<()> {
        self.client.answer_callback_query(&params).await?;
        Ok(())
    }

    /// Tell the owner of the recipient mailbox about a new mail.
    ///
    /// Returns whether a notification was sent.
    pub async fn notify(&self, notice: &EmailNotice) -> Result<bool> {
        let owner = mailbox::get_owner(self.db.pool(), &notice.recipient).await?;
        let Some(telegram_id) = owner.and_then(|u| u.telegram_id) else {
            debug!(recipient = %notice.recipient, "No Telegram owner, skipping notification");
            return Ok(false);
        };

        let (text, keyboard) = views::notification(notice);
        self.client
            .send_message(&SendMessageParams::html(telegram_id, text).with_keyboard(keyboard))
            .await?;
        debug!(telegram_id, email_id = notice.email_id, "Notification sent");
        Ok(true)
    }
}

#[async_trait]
impl Notifier for MailBot {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify_new_email(&self, notice: &EmailNotice) -> std::result::Result<(), NotifyError> {
        self.notify(notice)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Channel(e.to_string()))
    }
}
