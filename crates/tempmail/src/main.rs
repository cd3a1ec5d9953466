//! Disposable email service.
//!
//! Receives mail over SMTP for generated addresses, stores it in SQLite and
//! shows it through a Telegram bot and a web inbox.

mod config;
mod retention;

use std::future::Future;
use std::sync::Arc;

use database::Database;
use mail_bot::MailBot;
use relay::Relay;
use secrecy::ExposeSecret;
use smtp_server::{MailHandler, SmtpServer};
use telegram_client::{BotConfig, TelegramClient};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

type ServiceResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(domain = %config.domain, "Starting tempmail");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut services: JoinSet<(&'static str, ServiceResult)> = JoinSet::new();

    let mut relay = Relay::new(db.clone(), &config.domain);

    match &config.telegram_token {
        Some(token) => {
            let bot_config =
                BotConfig::new(token.expose_secret()).with_base_url(&config.telegram_api_url);
            let client = TelegramClient::connect(bot_config).await?;
            let bot = Arc::new(MailBot::new(client, db.clone(), &config.domain));
            relay = relay.with_notifier(bot.clone());

            let signal = shutdown_signal(shutdown_rx.clone());
            services.spawn(async move {
                let result: ServiceResult =
                    bot.run_with_shutdown(signal).await.map_err(Into::into);
                ("telegram bot", result)
            });
        }
        None => info!("TELEGRAM_BOT_TOKEN not set, Telegram bot disabled"),
    }

    let smtp_listener = TcpListener::bind(config.smtp_addr).await?;
    let smtp = SmtpServer::new(&config.smtp_hostname);
    let handler: Arc<dyn MailHandler> = Arc::new(relay);
    let signal = shutdown_signal(shutdown_rx.clone());
    services.spawn(async move {
        let result: ServiceResult = smtp
            .serve_with_shutdown(smtp_listener, handler, signal)
            .await
            .map_err(Into::into);
        ("smtp server", result)
    });

    if config.web_enabled {
        let http_listener = TcpListener::bind(config.http_addr).await?;
        info!(addr = %config.http_addr, "Web server listening");
        let app = web::app(web::AppState::new(db.clone(), &config.domain));
        let signal = shutdown_signal(shutdown_rx.clone());
        services.spawn(async move {
            let result: ServiceResult = axum::serve(http_listener, app)
                .with_graceful_shutdown(signal)
                .await
                .map_err(Into::into);
            ("web server", result)
        });
    } else {
        info!("WEB_ENABLED=false, web server disabled");
    }

    match config.mailbox_ttl {
        Some(ttl) => {
            let signal = shutdown_signal(shutdown_rx.clone());
            let db = db.clone();
            services.spawn(async move {
                retention::run_sweeper(db, ttl, retention::SWEEP_INTERVAL, signal).await;
                ("retention sweeper", Ok(()))
            });
        }
        None => info!("MAILBOX_TTL_HOURS=0, retention disabled"),
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Shutdown requested");
        }
        Some(joined) = services.join_next() => {
            report(joined);
            warn!("A service stopped unexpectedly, shutting down");
        }
    }

    let _ = shutdown_tx.send(true);
    while let Some(joined) = services.join_next().await {
        report(joined);
    }

    db.close().await;
    info!("Stopped");
    Ok(())
}

/// Resolves once shutdown has been requested.
fn shutdown_signal(mut rx: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

fn report(joined: Result<(&'static str, ServiceResult), tokio::task::JoinError>) {
    match joined {
        Ok((name, Ok(()))) => info!(service = name, "Service stopped"),
        Ok((name, Err(e))) => error!(service = name, "Service failed: {}", e),
        Err(e) => error!("Service task panicked: {}", e),
    }
}
