use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::time::month_key;

/// Whether the user currently considers themselves clocked in. Only explicit user actions change
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClockState {
    On,
    #[default]
    Off,
}

impl Display for ClockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockState::On => write!(f, "On"),
            ClockState::Off => write!(f, "Off"),
        }
    }
}

impl FromStr for ClockState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "On" => Ok(ClockState::On),
            "Off" => Ok(ClockState::Off),
            other => Err(anyhow!("Unknown clock state {other:?}")),
        }
    }
}

/// Events that are counted per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// "Still working?" shown while clocked in.
    On,
    /// "Forgot to clock in?" shown while clocked out.
    Off,
    Sms,
}

impl Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterKind::On => write!(f, "on"),
            CounterKind::Off => write!(f, "off"),
            CounterKind::Sms => write!(f, "sms"),
        }
    }
}

/// Reminders that are subject to a cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownKind {
    OnIdle,
    OffActive,
}

/// Counters for a single local calendar day, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCountersEntity {
    pub date: NaiveDate,
    #[serde(default, with = "count_ser")]
    pub on: u32,
    #[serde(default, with = "count_ser")]
    pub off: u32,
    #[serde(default, with = "count_ser")]
    pub sms: u32,
}

impl DayCountersEntity {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            on: 0,
            off: 0,
            sms: 0,
        }
    }

    pub fn get(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::On => self.on,
            CounterKind::Off => self.off,
            CounterKind::Sms => self.sms,
        }
    }

    pub fn increment(&mut self, kind: CounterKind) -> u32 {
        let slot = match kind {
            CounterKind::On => &mut self.on,
            CounterKind::Off => &mut self.off,
            CounterKind::Sms => &mut self.sms,
        };
        *slot = slot.saturating_add(1);
        *slot
    }

    /// Returns counters that are valid for `today`. Records of any other day start over.
    pub fn rolled_over(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::empty(today)
        }
    }
}

/// Counters for a calendar month. Only sms has a monthly budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCountersEntity {
    /// `YYYY-MM`
    pub month: String,
    #[serde(default, with = "count_ser")]
    pub sms: u32,
}

impl MonthCountersEntity {
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            month: month_key(today),
            sms: 0,
        }
    }

    pub fn rolled_over(self, today: NaiveDate) -> Self {
        if self.month == month_key(today) {
            self
        } else {
            Self::empty(today)
        }
    }
}

/// Counts written by older versions might be strings. Anything that isn't a non negative integer
/// is read as zero.
mod count_ser {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(count: &u32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(*count)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let count = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        Ok(count.map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX)))
    }
}
