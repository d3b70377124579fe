use std::{
    future::Future,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::fs::operations::{read_optional, write_atomic, DirectoryLock};

use super::entities::{CounterKind, DayCountersEntity, MonthCountersEntity};

pub const DAY_COUNTERS_FILE_NAME: &str = "prompt_counts.json";
pub const MONTH_COUNTERS_FILE_NAME: &str = "prompt_counts_month.json";

/// Interface for per-day and per-month reminder counters.
///
/// Reads always produce a value: they transparently roll over to zero when the stored record
/// belongs to another day or month. Writes report persistence failures, but the in-memory value
/// has already advanced by then, so the current process keeps enforcing the caps.
pub trait CounterStorage {
    fn get(&mut self, kind: CounterKind, today: NaiveDate) -> impl Future<Output = u32>;

    fn increment(
        &mut self,
        kind: CounterKind,
        today: NaiveDate,
    ) -> impl Future<Output = Result<u32>>;

    fn get_monthly(&mut self, today: NaiveDate) -> impl Future<Output = u32>;

    fn increment_monthly(&mut self, today: NaiveDate) -> impl Future<Output = Result<u32>>;

    /// Snapshot of today's counters, used by the gating engine.
    fn day_counters(&mut self, today: NaiveDate) -> impl Future<Output = DayCountersEntity>;

    fn month_counters(&mut self, today: NaiveDate) -> impl Future<Output = MonthCountersEntity>;
}

/// The main realization of [CounterStorage], backed by two small json documents.
pub struct CounterStorageImpl {
    dir: PathBuf,
    day: Option<DayCountersEntity>,
    month: Option<MonthCountersEntity>,
}

impl CounterStorageImpl {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            day: None,
            month: None,
        })
    }

    fn day_path(&self) -> PathBuf {
        self.dir.join(DAY_COUNTERS_FILE_NAME)
    }

    fn month_path(&self) -> PathBuf {
        self.dir.join(MONTH_COUNTERS_FILE_NAME)
    }

    /// Loads the day record from disk, merged with what this process already counted. A count
    /// whose write failed is never lost to an older file.
    async fn refresh_day(&mut self, today: NaiveDate) -> DayCountersEntity {
        let stored = match read_document::<DayCountersEntity>(&self.day_path()).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to read day counters, using in-memory copy: {e}");
                None
            }
        };
        let cached = self.day.take();
        let current = match (stored, cached) {
            (Some(stored), Some(cached)) if stored.date == cached.date => DayCountersEntity {
                on: stored.on.max(cached.on),
                off: stored.off.max(cached.off),
                sms: stored.sms.max(cached.sms),
                ..stored
            },
            (Some(stored), _) => stored,
            (None, cached) => cached.unwrap_or_else(|| DayCountersEntity::empty(today)),
        };
        if current.date != today {
            debug!("Day counters rolled over from {} to {today}", current.date);
        }
        let current = current.rolled_over(today);
        self.day = Some(current.clone());
        current
    }

    async fn refresh_month(&mut self, today: NaiveDate) -> MonthCountersEntity {
        let stored = match read_document::<MonthCountersEntity>(&self.month_path()).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to read month counters, using in-memory copy: {e}");
                None
            }
        };
        let cached = self.month.take();
        let current = match (stored, cached) {
            (Some(stored), Some(cached)) if stored.month == cached.month => MonthCountersEntity {
                sms: stored.sms.max(cached.sms),
                ..stored
            },
            (Some(stored), _) => stored,
            (None, cached) => cached.unwrap_or_else(|| MonthCountersEntity::empty(today)),
        }
        .rolled_over(today);
        self.month = Some(current.clone());
        current
    }
}

impl CounterStorage for CounterStorageImpl {
    async fn get(&mut self, kind: CounterKind, today: NaiveDate) -> u32 {
        self.refresh_day(today).await.get(kind)
    }

    async fn increment(&mut self, kind: CounterKind, today: NaiveDate) -> Result<u32> {
        let lock = DirectoryLock::acquire(&self.dir).await;
        if let Err(e) = &lock {
            warn!("Failed to lock counters, incrementing without it: {e}");
        }

        let mut current = self.refresh_day(today).await;
        let value = current.increment(kind);
        self.day = Some(current.clone());
        let written = write_document(&self.day_path(), &current).await;

        if let Ok(lock) = lock {
            lock.release().await?;
        }
        written.map(|_| value)
    }

    async fn get_monthly(&mut self, today: NaiveDate) -> u32 {
        self.refresh_month(today).await.sms
    }

    async fn increment_monthly(&mut self, today: NaiveDate) -> Result<u32> {
        let lock = DirectoryLock::acquire(&self.dir).await;
        if let Err(e) = &lock {
            warn!("Failed to lock counters, incrementing without it: {e}");
        }

        let mut current = self.refresh_month(today).await;
        current.sms = current.sms.saturating_add(1);
        let value = current.sms;
        self.month = Some(current.clone());
        let written = write_document(&self.month_path(), &current).await;

        if let Ok(lock) = lock {
            lock.release().await?;
        }
        written.map(|_| value)
    }

    async fn day_counters(&mut self, today: NaiveDate) -> DayCountersEntity {
        self.refresh_day(today).await
    }

    async fn month_counters(&mut self, today: NaiveDate) -> MonthCountersEntity {
        self.refresh_month(today).await
    }
}

/// Reads a json document. Corrupted documents are reported as absent, the same way a fresh
/// install would look.
async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, std::io::Error> {
    let Some(text) = read_optional(path).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<T>(&text) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            warn!("Ignoring corrupted document {path:?}: {e}");
            Ok(None)
        }
    }
}

async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    write_atomic(path, text.as_bytes())
        .await
        .inspect_err(|e| warn!("Failed to persist {path:?}: {e}"))?;
    Ok(())
}
