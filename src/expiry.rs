//! Daily expiry of good-for-day orders.
//!
//! A single long-lived worker sleeps until the next daily cutoff and then
//! cancels every resting good-for-day order in one critical section. The
//! worker never holds the book mutex while waiting, and a cancellation
//! token makes shutdown prompt whether it is sleeping or just woke up.

use crate::config;
use crate::matcher::Matcher;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use time::macros::format_description;
use time::{OffsetDateTime, Time, UtcOffset};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid cutoff time {0:?}, expected hh:mm")]
    InvalidCutoff(String),
    #[error("unsupported timezone {0:?}, expected \"local\" or \"utc\"")]
    UnsupportedTimezone(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Timezone {
    Local,
    Utc,
}

/// When the daily cutoff fires: a wall-clock time of day, a guard delay so
/// the worker wakes strictly after the cutoff, and the clock it is read on.
#[derive(Debug, Clone)]
pub struct Schedule {
    cutoff: Time,
    guard: Duration,
    timezone: Timezone,
}

impl Schedule {
    pub fn from_config(cfg: &config::ExpiryConfig) -> Result<Self, Error> {
        let format = format_description!("[hour]:[minute]");
        let cutoff = Time::parse(&cfg.cutoff_local_time, &format)
            .map_err(|_| Error::InvalidCutoff(cfg.cutoff_local_time.clone()))?;
        let timezone = match cfg.timezone.as_str() {
            "local" => Timezone::Local,
            "utc" => Timezone::Utc,
            other => return Err(Error::UnsupportedTimezone(other.to_string())),
        };
        Ok(Schedule {
            cutoff,
            guard: Duration::from_millis(cfg.guard_ms),
            timezone,
        })
    }

    fn now(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        match self.timezone {
            Timezone::Utc => now,
            Timezone::Local => match UtcOffset::current_local_offset() {
                Ok(offset) => now.to_offset(offset),
                Err(_) => {
                    warn!("local UTC offset unavailable, day-expiry cutoff runs on UTC");
                    now
                }
            },
        }
    }

    /// How long to sleep from `now` until the next cutoff plus guard.
    fn until_next_cutoff(&self, now: OffsetDateTime) -> Duration {
        let mut next = now.replace_time(self.cutoff);
        if next <= now {
            next += time::Duration::days(1);
        }
        let until = next - now;
        Duration::from_millis(until.whole_milliseconds() as u64) + self.guard
    }
}

/// Run the expiry worker until the token is cancelled.
pub async fn run(matcher: Arc<Matcher>, schedule: Schedule, shutdown: CancellationToken) {
    loop {
        let wait = schedule.until_next_cutoff(schedule.now());
        debug!(seconds = wait.as_secs(), "day-expiry worker sleeping until next cutoff");
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("day-expiry worker shutting down");
                return;
            }
            _ = tokio::time::sleep(wait) => {
                if shutdown.is_cancelled() {
                    return;
                }
                let expired = matcher.expire_day_orders();
                info!(count = expired.len(), "cancelled good-for-day orders at daily cutoff");
            }
        }
    }
}
