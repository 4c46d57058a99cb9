//! Durable expiry: removes lapsed token history and deactivates sessions past
//! their `expires_at`, on a fixed period until shutdown.

use std::time::Duration;

use cache::TokenManager;
use chrono::{DateTime, Utc};
use db::models::{attendance_session, token_history};
use sea_orm::DatabaseConnection;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub token_history_deleted: u64,
    pub sessions_deactivated: usize,
}

/// One pass. Deactivated sessions also lose their cache entry.
pub async fn sweep_expired(
    db: &DatabaseConnection,
    tokens: &TokenManager,
    now: DateTime<Utc>,
) -> AppResult<SweepReport> {
    let token_history_deleted = token_history::Model::delete_expired(db, now).await?;
    let codes = attendance_session::Model::deactivate_expired(db, now).await?;

    for code in &codes {
        if let Err(e) = tokens.invalidate_session(code).await {
            warn!(session_code = %code, error = %e, "Failed to drop cached copy of expired session");
        }
    }

    Ok(SweepReport {
        token_history_deleted,
        sessions_deactivated: codes.len(),
    })
}

/// Runs [`sweep_expired`] every `period` until `shutdown` flips to `true`.
pub fn spawn_expiry_sweeper(
    db: DatabaseConnection,
    tokens: TokenManager,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "Expiry sweeper started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match sweep_expired(&db, &tokens, Utc::now()).await {
                        Ok(report) if report != SweepReport::default() => info!(
                            token_history_deleted = report.token_history_deleted,
                            sessions_deactivated = report.sessions_deactivated,
                            "Expired records swept"
                        ),
                        Ok(_) => debug!("Nothing to sweep"),
                        Err(e) => error!(error = %e, "Expiry sweep failed"),
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    })
}
