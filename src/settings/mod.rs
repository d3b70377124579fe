//! User configuration of the reminders.
//!
//! The document is a flat JSON object persisted as `settings.json`. Decoding is lenient: unknown
//! keys are dropped, missing or malformed values fall back to their defaults, so a damaged file
//! can never stop the reminders from running. [Settings::validated] additionally brings every
//! value into its documented range before it reaches the gating engine.

pub mod store;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::phone::normalize_or_empty;

pub const DEFAULT_TRACKER_URL: &str = "https://app.healthboxhr.com/";

/// Days on which any reminder may be shown. Missing days are treated as their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyDays {
    pub mon: bool,
    pub tue: bool,
    pub wed: bool,
    pub thu: bool,
    pub fri: bool,
    pub sat: bool,
    pub sun: bool,
}

impl Default for NotifyDays {
    fn default() -> Self {
        Self {
            mon: true,
            tue: true,
            wed: true,
            thu: true,
            fri: true,
            sat: false,
            sun: false,
        }
    }
}

impl NotifyDays {
    pub fn is_enabled(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }
}

/// Complete reminder configuration. Field names are the keys of the persisted document.
///
/// Numeric values are kept as plain `i64` so that an out of range value written by hand survives
/// decoding and gets clamped by [Settings::validated] instead of discarding the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Clocked out while active: "Forgot to clock in?"
    pub enable_clock_in_reminder: bool,
    /// 1..=24, reminder is only shown before this hour. 24 means all day.
    pub clock_in_cutoff_hour: i64,
    pub active_threshold_off_min: i64,
    pub off_prompt_cooldown_min: i64,
    pub max_clock_in_per_day: i64,

    // Clocked in while idle: "Still working?"
    pub enable_clock_out_idle_reminder: bool,
    pub on_idle_threshold_min: i64,
    pub on_idle_prompt_cooldown_min: i64,
    /// 0..=23, reminder is only shown from this hour on. 0 means all day.
    pub on_idle_after_hour: i64,
    pub max_clock_out_per_day: i64,

    pub enable_sms_clock_out_reminder: bool,
    pub sms_phone_e164: String,
    /// Superseded by the sms window. Kept so that old documents round trip unchanged.
    pub sms_only_after_hour: i64,
    pub sms_idle_threshold_min: i64,
    pub sms_max_per_day: i64,
    /// 0..=23, inclusive.
    pub sms_window_start_hour: i64,
    /// 1..=24, exclusive. 24 means until midnight.
    pub sms_window_end_hour: i64,
    pub sms_max_per_month: i64,

    pub notify_days: NotifyDays,

    /// Idle time at or above which the activity streak is broken.
    pub active_idle_cutoff_sec: i64,

    /// Page opened when clocking in or out, also referenced in sms bodies.
    pub tracker_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_clock_in_reminder: true,
            clock_in_cutoff_hour: 15,
            active_threshold_off_min: 30,
            off_prompt_cooldown_min: 210,
            max_clock_in_per_day: 3,
            enable_clock_out_idle_reminder: true,
            on_idle_threshold_min: 45,
            on_idle_prompt_cooldown_min: 210,
            on_idle_after_hour: 0,
            max_clock_out_per_day: 3,
            enable_sms_clock_out_reminder: false,
            sms_phone_e164: String::new(),
            sms_only_after_hour: 0,
            sms_idle_threshold_min: 60,
            sms_max_per_day: 1,
            sms_window_start_hour: 12,
            sms_window_end_hour: 22,
            sms_max_per_month: 10,
            notify_days: NotifyDays::default(),
            active_idle_cutoff_sec: 300,
            tracker_url: DEFAULT_TRACKER_URL.into(),
        }
    }
}

impl Settings {
    /// Decodes a settings document. Never fails: anything that can't be used is replaced with the
    /// default for that key.
    pub fn from_document(document: &str) -> Settings {
        let loaded = match serde_json::from_str::<Value>(document) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                warn!("Settings document is not an object: {other}");
                Map::new()
            }
            Err(e) => {
                warn!("Settings document is not valid json: {e}");
                Map::new()
            }
        };
        Self::from_map(loaded)
    }

    pub fn from_map(loaded: Map<String, Value>) -> Settings {
        let Ok(mut merged) = serde_json::to_value(Settings::default()) else {
            return Settings::default();
        };
        overlay(&mut merged, &Value::Object(loaded), "");
        serde_json::from_value(merged)
            .inspect_err(|e| warn!("Merged settings failed to decode {e}"))
            .unwrap_or_default()
    }

    /// Brings every value into its documented range. Hours are clamped, caps can't go below
    /// zero, negative durations are replaced with defaults and an unusable phone number becomes
    /// empty, which disables sms.
    pub fn validated(self) -> Settings {
        let defaults = Settings::default();
        let non_negative_or = |value: i64, default: i64| if value < 0 { default } else { value };

        Settings {
            clock_in_cutoff_hour: self.clock_in_cutoff_hour.clamp(1, 24),
            active_threshold_off_min: non_negative_or(
                self.active_threshold_off_min,
                defaults.active_threshold_off_min,
            ),
            off_prompt_cooldown_min: non_negative_or(
                self.off_prompt_cooldown_min,
                defaults.off_prompt_cooldown_min,
            ),
            max_clock_in_per_day: self.max_clock_in_per_day.max(0),
            on_idle_threshold_min: non_negative_or(
                self.on_idle_threshold_min,
                defaults.on_idle_threshold_min,
            ),
            on_idle_prompt_cooldown_min: non_negative_or(
                self.on_idle_prompt_cooldown_min,
                defaults.on_idle_prompt_cooldown_min,
            ),
            on_idle_after_hour: self.on_idle_after_hour.clamp(0, 23),
            max_clock_out_per_day: self.max_clock_out_per_day.max(0),
            sms_phone_e164: normalize_or_empty(&self.sms_phone_e164),
            sms_only_after_hour: self.sms_only_after_hour.clamp(0, 23),
            sms_idle_threshold_min: non_negative_or(
                self.sms_idle_threshold_min,
                defaults.sms_idle_threshold_min,
            ),
            sms_max_per_day: self.sms_max_per_day.max(0),
            sms_window_start_hour: self.sms_window_start_hour.clamp(0, 23),
            sms_window_end_hour: self.sms_window_end_hour.clamp(1, 24),
            sms_max_per_month: self.sms_max_per_month.max(0),
            active_idle_cutoff_sec: if self.active_idle_cutoff_sec < 1 {
                defaults.active_idle_cutoff_sec
            } else {
                self.active_idle_cutoff_sec
            },
            tracker_url: if self.tracker_url.trim().is_empty() {
                defaults.tracker_url
            } else {
                self.tracker_url
            },
            ..self
        }
    }

    pub fn to_document(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Copies values from `candidate` into `target` wherever the kinds agree. `target` is the
/// serialized default document, so its shape defines the known keys.
fn overlay(target: &mut Value, candidate: &Value, path: &str) {
    if let (Value::Object(target), Value::Object(candidate)) = (&mut *target, candidate) {
        for (key, slot) in target.iter_mut() {
            if let Some(value) = candidate.get(key) {
                let nested = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                overlay(slot, value, &nested);
            }
        }
        return;
    }

    let accepted = match (&*target, candidate) {
        (Value::Bool(_), Value::Bool(_)) | (Value::String(_), Value::String(_)) => {
            Some(candidate.clone())
        }
        (Value::Number(_), _) => coerce_integer(candidate).map(Value::from),
        _ => None,
    };

    match accepted {
        Some(value) => *target = value,
        None => warn!("Ignoring malformed setting {path}: {candidate}, using {target}"),
    }
}

/// Accepts anything a user could reasonably mean as an integer: integers, floats (truncated) and
/// strings holding an integer.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
                .map(|v| v.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;
    use serde_json::json;

    use super::{NotifyDays, Settings};

    #[test]
    fn test_missing_document_is_default() {
        assert_eq!(Settings::from_document("{}"), Settings::default());
        assert_eq!(Settings::from_document("null"), Settings::default());
        assert_eq!(Settings::from_document("not json"), Settings::default());
        assert_eq!(Settings::from_document("[1, 2]"), Settings::default());
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let settings = Settings::from_document(
            &json!({ "on_idle_threshold_min": 20, "favourite_colour": "blue" }).to_string(),
        );
        assert_eq!(settings.on_idle_threshold_min, 20);
        let document = settings.to_document().unwrap();
        assert!(!document.contains("favourite_colour"));
    }

    #[test]
    fn test_malformed_values_fall_back_per_key() {
        let settings = Settings::from_document(
            &json!({
                "on_idle_threshold_min": "soon",
                "max_clock_in_per_day": 5,
                "enable_clock_in_reminder": "yes",
                "sms_phone_e164": 358,
            })
            .to_string(),
        );
        let defaults = Settings::default();
        assert_eq!(settings.on_idle_threshold_min, defaults.on_idle_threshold_min);
        assert_eq!(settings.max_clock_in_per_day, 5);
        assert_eq!(settings.enable_clock_in_reminder, defaults.enable_clock_in_reminder);
        assert_eq!(settings.sms_phone_e164, "");
    }

    #[test]
    fn test_numbers_are_coerced() {
        let settings = Settings::from_document(
            &json!({ "on_idle_threshold_min": "50", "sms_idle_threshold_min": 61.9 }).to_string(),
        );
        assert_eq!(settings.on_idle_threshold_min, 50);
        assert_eq!(settings.sms_idle_threshold_min, 61);
    }

    #[test]
    fn test_partial_notify_days() {
        let settings = Settings::from_document(
            &json!({ "notify_days": { "sat": true, "mon": "nope" } }).to_string(),
        );
        assert_eq!(
            settings.notify_days,
            NotifyDays {
                sat: true,
                ..NotifyDays::default()
            }
        );
        assert!(settings.notify_days.is_enabled(Weekday::Sat));
        assert!(!settings.notify_days.is_enabled(Weekday::Sun));
    }

    #[test]
    fn test_validation_clamps_hours() {
        let settings = Settings {
            clock_in_cutoff_hour: 0,
            on_idle_after_hour: 40,
            sms_window_start_hour: -3,
            sms_window_end_hour: 99,
            ..Settings::default()
        }
        .validated();
        assert_eq!(settings.clock_in_cutoff_hour, 1);
        assert_eq!(settings.on_idle_after_hour, 23);
        assert_eq!(settings.sms_window_start_hour, 0);
        assert_eq!(settings.sms_window_end_hour, 24);
    }

    #[test]
    fn test_validation_replaces_negative_durations() {
        let settings = Settings {
            on_idle_threshold_min: -1,
            off_prompt_cooldown_min: -10,
            max_clock_out_per_day: -2,
            active_idle_cutoff_sec: 0,
            ..Settings::default()
        }
        .validated();
        let defaults = Settings::default();
        assert_eq!(settings.on_idle_threshold_min, defaults.on_idle_threshold_min);
        assert_eq!(settings.off_prompt_cooldown_min, defaults.off_prompt_cooldown_min);
        assert_eq!(settings.max_clock_out_per_day, 0);
        assert_eq!(settings.active_idle_cutoff_sec, defaults.active_idle_cutoff_sec);
    }

    #[test]
    fn test_validation_normalizes_phone() {
        let settings = Settings {
            sms_phone_e164: "+358 40 123 4567".into(),
            ..Settings::default()
        }
        .validated();
        assert_eq!(settings.sms_phone_e164, "+358401234567");

        let settings = Settings {
            sms_phone_e164: "040 123".into(),
            ..Settings::default()
        }
        .validated();
        assert_eq!(settings.sms_phone_e164, "");
    }

    #[test]
    fn test_document_round_trip_keeps_known_keys() {
        let settings = Settings {
            enable_sms_clock_out_reminder: true,
            sms_phone_e164: "+358401234567".into(),
            ..Settings::default()
        };
        let decoded = Settings::from_document(&settings.to_document().unwrap());
        assert_eq!(decoded, settings);
    }
}
