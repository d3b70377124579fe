use std::path::Path;

use ansi_term::Colour;
use anyhow::Result;
use chrono::NaiveDate;

use crate::{
    daemon::storage::{
        counter_storage::{CounterStorage, CounterStorageImpl},
        entities::{ClockState, DayCountersEntity, MonthCountersEntity},
        state_storage::{StateStorage, StateStorageImpl},
    },
    settings::{store::SettingsStore, Settings},
};

pub async fn print_status(dir: &Path, today: NaiveDate) -> Result<()> {
    let state = StateStorageImpl::new(dir.to_owned()).load_or_default().await;
    let settings = SettingsStore::new(dir).load().await;
    let mut counters = CounterStorageImpl::new(dir.to_owned())?;
    let day = counters.day_counters(today).await;
    let month = counters.month_counters(today).await;

    let state = match state {
        ClockState::On => Colour::Green.bold().paint(state.to_string()),
        ClockState::Off => Colour::Red.bold().paint(state.to_string()),
    };
    println!("Clocked: {state}");
    print!("{}", render_counters(&settings, &day, &month));
    Ok(())
}

/// Today's reminders against their caps.
pub fn render_counters(
    settings: &Settings,
    day: &DayCountersEntity,
    month: &MonthCountersEntity,
) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Forgot to clock in reminders today: {} / {}\n",
        day.off, settings.max_clock_in_per_day
    ));
    output.push_str(&format!(
        "Still working reminders today: {} / {}\n",
        day.on, settings.max_clock_out_per_day
    ));
    output.push_str(&format!(
        "Sms today: {} / {}\n",
        day.sms, settings.sms_max_per_day
    ));
    output.push_str(&format!(
        "Monthly SMS budget: {} / {}\n",
        month.sms, settings.sms_max_per_month
    ));
    if !settings.enable_sms_clock_out_reminder {
        output.push_str("Sms reminders are disabled\n");
    }
    output
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        daemon::storage::entities::{DayCountersEntity, MonthCountersEntity},
        settings::Settings,
    };

    use super::render_counters;

    #[test]
    fn test_counters_against_caps() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let day = DayCountersEntity {
            on: 2,
            off: 1,
            sms: 1,
            ..DayCountersEntity::empty(today)
        };
        let month = MonthCountersEntity {
            sms: 4,
            ..MonthCountersEntity::empty(today)
        };
        let output = render_counters(&Settings::default(), &day, &month);
        assert!(output.contains("Forgot to clock in reminders today: 1 / 3"));
        assert!(output.contains("Still working reminders today: 2 / 3"));
        assert!(output.contains("Sms today: 1 / 1"));
        assert!(output.contains("Monthly SMS budget: 4 / 10"));
        assert!(output.contains("disabled"));
    }
}
