//! Periodic removal of expired mail and abandoned web mailboxes.

use std::future::Future;
use std::time::Duration;

use database::{email, mailbox, Database};
use tracing::{debug, info, warn};

/// Time between sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub emails: u64,
    pub mailboxes: u64,
}

/// Delete mail older than `ttl`, then anonymous mailboxes older than `ttl`.
pub async fn sweep(db: &Database, ttl: Duration) -> database::Result<SweepReport> {
    let emails = email::delete_older_than(db.pool(), ttl).await?;
    let mailboxes = mailbox::delete_anonymous_older_than(db.pool(), ttl).await?;
    Ok(SweepReport { emails, mailboxes })
}

/// Sweep every `interval` until the shutdown signal resolves.
pub async fn run_sweeper<S>(db: Database, ttl: Duration, interval: Duration, shutdown_signal: S)
where
    S: Future<Output = ()> + Send,
{
    info!(ttl_secs = ttl.as_secs(), "Starting retention sweeper");

    let mut ticker = tokio::time::interval(interval);
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown_signal => {
                info!("Shutdown signal received, stopping retention sweeper");
                return;
            }

            _ = ticker.tick() => {
                match sweep(&db, ttl).await {
                    Ok(report) if report == SweepReport::default() => {
                        debug!("Retention sweep removed nothing");
                    }
                    Ok(report) => {
                        info!(
                            emails = report.emails,
                            mailboxes = report.mailboxes,
                            "Retention sweep finished"
                        );
                    }
                    Err(e) => warn!("Retention sweep failed: {}", e),
                }
            }
        }
    }
}
