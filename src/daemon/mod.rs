use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use dispatch::{
    desktop::DesktopNotifier,
    twilio::{TwilioCredentials, TwilioTransport},
    Dispatcher, Notifier, SmsTransport, APP_TITLE,
};
use monitor::ReminderMonitor;
use status::ClockStateHandle;
use storage::{
    cooldown_storage::CooldownStorageImpl, counter_storage::CounterStorageImpl,
    state_storage::StateStorageImpl,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    idle_api::{GenericIdleSensor, IdleSensor, NullIdleSensor},
    settings::store::{SettingsHandle, SettingsStore},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod dispatch;
pub mod engine;
pub mod monitor;
pub mod shutdown;
pub mod status;
pub mod storage;

/// Tunables of the background process that aren't part of the user settings.
#[derive(Debug, Clone, Copy)]
pub struct DaemonOptions {
    pub poll_interval: Duration,
    pub sms_timeout: Duration,
}

impl Default for DaemonOptions {
    fn default() -> Self {
        Self {
            poll_interval: monitor::DEFAULT_POLL_INTERVAL,
            sms_timeout: dispatch::twilio::DEFAULT_SMS_TIMEOUT,
        }
    }
}

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf, options: DaemonOptions) -> Result<()> {
    let sensor: Box<dyn IdleSensor> = match GenericIdleSensor::new() {
        Ok(v) => Box::new(v),
        Err(e) => {
            warn!("Idle time is unavailable, the user will always look active {e:?}");
            Box::new(NullIdleSensor)
        }
    };
    let sms = TwilioTransport::new(TwilioCredentials::from_env(), options.sms_timeout)?;
    if !sms.is_configured() {
        warn!("Twilio credentials are not set, sms reminders will fail");
    }

    let shutdown_token = CancellationToken::new();

    let monitor = create_monitor(
        dir,
        sensor,
        Box::new(DesktopNotifier::new(APP_TITLE)),
        Box::new(sms),
        &shutdown_token,
        options,
        DefaultClock,
    )
    .await?;
    let clock_state = monitor.clock_state().subscribe();

    info!("Monitoring with a poll interval of {:?}", options.poll_interval);
    let (_, _, monitor_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        status::report_clock_state(clock_state, shutdown_token.clone()),
        monitor.run(),
    );

    monitor_result
}

async fn create_monitor(
    dir: PathBuf,
    sensor: Box<dyn IdleSensor>,
    notifier: Box<dyn Notifier>,
    sms: Box<dyn SmsTransport>,
    shutdown_token: &CancellationToken,
    options: DaemonOptions,
    clock: impl Clock,
) -> Result<ReminderMonitor<CounterStorageImpl, CooldownStorageImpl>> {
    let settings_store = SettingsStore::new(&dir);
    if let Err(e) = settings_store.ensure_exists().await {
        warn!("Failed to create default settings {e:?}");
    }
    let settings = SettingsHandle::open(settings_store).await;
    let clock_state = ClockStateHandle::open(StateStorageImpl::new(dir.clone())).await;

    Ok(ReminderMonitor::new(
        settings,
        clock_state,
        CounterStorageImpl::new(dir.clone())?,
        CooldownStorageImpl::new(dir)?,
        sensor,
        Dispatcher::new(notifier, sms, options.sms_timeout),
        shutdown_token.clone(),
        options.poll_interval,
        Box::new(clock),
    ))
}
