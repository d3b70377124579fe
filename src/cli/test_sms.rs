use std::{fmt::Display, path::Path, time::Duration};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tokio::time::timeout;
use tracing::warn;

use crate::{
    daemon::{
        dispatch::SmsTransport,
        storage::{
            counter_storage::{CounterStorage, CounterStorageImpl},
            entities::CounterKind,
        },
    },
    phone::normalize_e164,
    settings::store::SettingsStore,
};

use super::config::INVALID_PHONE;

pub const TEST_SMS_BODY: &str = "Clocker Helper test. Still working? This is a test SMS.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSmsOutcome {
    Sent { month_used: u32, month_cap: i64 },
    DailyCapReached,
    MonthlyCapReached,
    Failed,
}

impl Display for TestSmsOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestSmsOutcome::Sent {
                month_used,
                month_cap,
            } => write!(
                f,
                "Test SMS sent (counted toward daily & monthly caps). Monthly SMS budget: {month_used} / {month_cap}"
            ),
            TestSmsOutcome::DailyCapReached => write!(f, "Daily SMS cap reached; test blocked."),
            TestSmsOutcome::MonthlyCapReached => {
                write!(f, "Monthly SMS cap reached; test blocked.")
            }
            TestSmsOutcome::Failed => write!(
                f,
                "SMS failed. Check Twilio creds, trial limits, or network."
            ),
        }
    }
}

/// Sends a test text to `phone`, or to the configured number. The test is held to the same daily
/// and monthly caps as real reminders and counts toward both.
pub async fn send_test_sms(
    dir: &Path,
    phone: Option<&str>,
    transport: &dyn SmsTransport,
    sms_timeout: Duration,
    today: NaiveDate,
) -> Result<TestSmsOutcome> {
    let settings = SettingsStore::new(dir).load().await;
    let to = normalize_e164(phone.unwrap_or(&settings.sms_phone_e164))
        .ok_or_else(|| anyhow!(INVALID_PHONE))?;

    let mut counters = CounterStorageImpl::new(dir.to_owned())?;
    if i64::from(counters.get_monthly(today).await) >= settings.sms_max_per_month {
        return Ok(TestSmsOutcome::MonthlyCapReached);
    }
    let day = counters.day_counters(today).await;
    if i64::from(day.sms) >= settings.sms_max_per_day {
        return Ok(TestSmsOutcome::DailyCapReached);
    }

    let sent = timeout(sms_timeout, transport.send_sms(&to, TEST_SMS_BODY))
        .await
        .unwrap_or_else(|_| {
            warn!("Test sms was not sent within {sms_timeout:?}");
            false
        });
    if !sent {
        return Ok(TestSmsOutcome::Failed);
    }

    counters.increment(CounterKind::Sms, today).await?;
    let month_used = counters.increment_monthly(today).await?;
    Ok(TestSmsOutcome::Sent {
        month_used,
        month_cap: settings.sms_max_per_month,
    })
}
