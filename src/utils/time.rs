use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Key under which monthly counters are stored. Calendar month, local time.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Seconds since the unix epoch with sub-second precision. This is the format cooldown files use.
pub fn to_epoch_seconds<Tz: TimeZone>(moment: &DateTime<Tz>) -> f64 {
    moment.timestamp_millis() as f64 / 1000.
}

pub fn from_epoch_seconds(epoch: f64) -> Option<DateTime<Utc>> {
    if !epoch.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((epoch * 1000.).round() as i64)
}
