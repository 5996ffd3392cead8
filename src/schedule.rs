//! Daily trigger driven by a cron expression
//!
//! Sleeps until the next scheduled time, runs the daily send, repeats. A run
//! that fails is logged and the loop waits for the next day; missed runs are
//! not replayed.

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Parsed send schedule
#[derive(Debug, Clone)]
pub struct SendSchedule {
    pub cron_expr: String,
    schedule: Schedule,
}

impl SendSchedule {
    /// Parse a 5-field (min hour dom month dow) or 6-field (with seconds)
    /// cron expression
    pub fn parse(cron_expr: &str) -> Result<Self> {
        let cron_expr = cron_expr.trim();

        // Cron crate needs 6 fields (sec min hour dom month dow)
        let full_cron = if cron_expr.split_whitespace().count() == 5 {
            format!("0 {}", cron_expr)
        } else {
            cron_expr.to_string()
        };

        let schedule = Schedule::from_str(&full_cron).map_err(|e| {
            Error::Config(format!("invalid cron expression '{}': {}", cron_expr, e))
        })?;

        Ok(Self {
            cron_expr: cron_expr.to_string(),
            schedule,
        })
    }

    /// Next fire time strictly after `after`
    pub fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

/// Run the daily send on schedule until the task is dropped
pub async fn run(schedule: SendSchedule, dispatcher: Arc<Dispatcher>) {
    info!(cron = %schedule.cron_expr, "Scheduler started");

    loop {
        let now = Utc::now();
        let Some(next) = schedule.next_fire(now) else {
            warn!(cron = %schedule.cron_expr, "Schedule has no upcoming fire time, stopping");
            return;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next, "Next daily send scheduled");
        tokio::time::sleep(wait).await;

        match dispatcher.send_daily(next).await {
            Ok(report) => info!(
                word = %report.word,
                sent = report.sent(),
                failed = report.failed(),
                "Scheduled send complete"
            ),
            Err(e) => error!(error = %e, "Scheduled send failed"),
        }
    }
}
