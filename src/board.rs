// src/board.rs - Counter queue board
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::announcer::{Announcement, AnnouncementSender};
use crate::config::BoardConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{CounterConfig, CounterStatus, CounterToken};

pub type SharedBoard = Arc<Mutex<CounterBoard>>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub doctor: String,
    pub department: String,
    pub counter: u32,
    pub token: u64,
    pub token_label: String,
    pub status: CounterStatus,
    pub status_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub clinic_name: String,
    pub time: String,
    pub rows: Vec<BoardRow>,
}

/// Per-counter token state for a fixed roster.
///
/// Each counter moves `queue -> in -> out -> in ...`; tokens only ever go
/// up, and one counter's actions never touch another's entry.
pub struct CounterBoard {
    clinic_name: String,
    token_prefix: String,
    roster: Vec<CounterConfig>,
    tokens: BTreeMap<u32, CounterToken>,
    time: String,
    announcements: Option<AnnouncementSender>,
}

impl CounterBoard {
    pub fn new(config: &BoardConfig, announcements: Option<AnnouncementSender>) -> Self {
        let tokens = config
            .counters
            .iter()
            .map(|entry| (entry.counter, CounterToken::new(entry.counter)))
            .collect();

        Self {
            clinic_name: config.clinic_name.clone(),
            token_prefix: config.token_prefix.clone(),
            roster: config.counters.clone(),
            tokens,
            time: format_time(Local::now()),
            announcements,
        }
    }

    pub fn shared(self) -> SharedBoard {
        Arc::new(Mutex::new(self))
    }

    pub fn token(&self, counter: u32) -> Option<CounterToken> {
        self.tokens.get(&counter).copied()
    }

    /// Calls the next token at `counter` and announces it.
    pub fn advance(&mut self, counter: u32) -> ApiResult<CounterToken> {
        let entry = self
            .tokens
            .get_mut(&counter)
            .ok_or_else(|| ApiError::counter_not_found(counter))?;

        entry.token += 1;
        entry.status = CounterStatus::In;
        let updated = *entry;

        if let Some(announcements) = &self.announcements {
            announcements.send(Announcement {
                counter,
                token: updated.token,
            });
        }

        log::info!("Counter {} called token {}", counter, self.token_label(updated.token));
        Ok(updated)
    }

    pub fn mark_out(&mut self, counter: u32) -> ApiResult<CounterToken> {
        let entry = self
            .tokens
            .get_mut(&counter)
            .ok_or_else(|| ApiError::counter_not_found(counter))?;

        entry.status = CounterStatus::Out;
        Ok(*entry)
    }

    pub fn set_time(&mut self, time: String) {
        self.time = time;
    }

    pub fn token_label(&self, token: u64) -> String {
        format!("{}-{}", self.token_prefix, token)
    }

    pub fn view(&self) -> BoardView {
        let rows = self
            .roster
            .iter()
            .map(|entry| {
                let state = self
                    .tokens
                    .get(&entry.counter)
                    .copied()
                    .unwrap_or_else(|| CounterToken::new(entry.counter));
                BoardRow {
                    doctor: entry.doctor.clone(),
                    department: entry.department.clone(),
                    counter: entry.counter,
                    token: state.token,
                    token_label: self.token_label(state.token),
                    status: state.status,
                    status_label: state.status.label(),
                }
            })
            .collect();

        BoardView {
            clinic_name: self.clinic_name.clone(),
            time: self.time.clone(),
            rows,
        }
    }
}

// ==================== CLOCK ====================

pub fn format_time(now: DateTime<Local>) -> String {
    now.format("%-I:%M:%S %p").to_string()
}

/// Owns the clock task; dropping it or calling `stop` ends the ticks.
pub struct ClockHandle {
    task: JoinHandle<()>,
}

impl ClockHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn start_clock(board: SharedBoard, tick: Duration) -> ClockHandle {
    start_clock_with(board, tick, || format_time(Local::now()))
}

pub fn start_clock_with<F>(board: SharedBoard, tick: Duration, now: F) -> ClockHandle
where
    F: Fn() -> String + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = interval(tick);
        loop {
            ticker.tick().await;
            board.lock().await.set_time(now());
        }
    });

    ClockHandle { task }
}
