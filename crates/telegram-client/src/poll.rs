//! Long polling for incoming updates.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{self, BoxStream, Stream};
use tracing::{debug, warn};

use crate::client::TelegramClient;
use crate::error::TelegramError;
use crate::types::Update;

/// Backoff between failed `getUpdates` calls.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Maximum number of consecutive failures (None = infinite).
    pub max_retries: Option<u32>,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl PollConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Check if we should retry after the given number of failures.
    pub fn should_retry(&self, failures: u32) -> bool {
        self.max_retries.map_or(true, |max| failures < max)
    }
}

struct PollState {
    client: TelegramClient,
    config: PollConfig,
    offset: Option<i64>,
    pending: VecDeque<Update>,
    failures: u32,
}

/// A stream of incoming updates.
///
/// Every yielded update is acknowledged on the next `getUpdates` call. Errors
/// are yielded too; the stream then waits out the backoff and polls again,
/// ending only once `max_retries` consecutive failures are reached.
pub struct UpdateStream {
    inner: BoxStream<'static, Result<Update, TelegramError>>,
}

impl UpdateStream {
    /// Create an update stream with custom backoff.
    pub fn with_config(client: &TelegramClient, config: PollConfig) -> Self {
        let state = PollState {
            client: client.clone(),
            config,
            offset: None,
            pending: VecDeque::new(),
            failures: 0,
        };

        let inner = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(update) = state.pending.pop_front() {
                    return Some((Ok(update), state));
                }

                if state.failures > 0 {
                    if !state.config.should_retry(state.failures) {
                        warn!("Giving up polling after {} failures", state.failures);
                        return None;
                    }
                    let delay = state.config.delay_for_attempt(state.failures - 1);
                    debug!("Retrying getUpdates in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }

                let timeout = state.client.config().poll_timeout;
                match state.client.get_updates(state.offset, timeout).await {
                    Ok(updates) => {
                        state.failures = 0;
                        if let Some(last) = updates.last() {
                            state.offset = Some(last.update_id + 1);
                        }
                        debug!("Received {} updates", updates.len());
                        state.pending.extend(updates);
                    }
                    Err(e) => {
                        state.failures += 1;
                        return Some((Err(e), state));
                    }
                }
            }
        });

        Self {
            inner: Box::pin(inner),
        }
    }
}

impl Stream for UpdateStream {
    type Item = Result<Update, TelegramError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Create an update stream with default backoff.
pub fn subscribe(client: &TelegramClient) -> UpdateStream {
    UpdateStream::with_config(client, PollConfig::default())
}

/// Create an update stream with custom backoff.
pub fn subscribe_with_config(client: &TelegramClient, config: PollConfig) -> UpdateStream {
    UpdateStream::with_config(client, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_for_attempt() {
        let config = PollConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(20), Duration::from_secs(30));
    }

    #[test]
    fn test_should_retry() {
        assert!(PollConfig::default().should_retry(1_000));

        let bounded = PollConfig {
            max_retries: Some(2),
            ..Default::default()
        };
        assert!(bounded.should_retry(1));
        assert!(!bounded.should_retry(2));
    }
}
