use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    idle_api::{idle_seconds, IdleSensor},
    settings::store::SettingsHandle,
    utils::clock::Clock,
};

use super::{
    dispatch::Dispatcher,
    engine::gating::{Cooldowns, GatingEngine, ReminderAction, ReminderInputs},
    status::ClockStateHandle,
    storage::{
        cooldown_storage::CooldownStorage,
        counter_storage::CounterStorage,
        entities::{CooldownKind, CounterKind},
    },
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// What a single tick did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Reminders that reached the user and were recorded.
    pub fired: Vec<ReminderAction>,
    /// Reminders that were due but couldn't be delivered. They are not counted.
    pub failed: Vec<ReminderAction>,
}

/// Polls the user's state on a fixed interval and fires reminders the engine decides on.
pub struct ReminderMonitor<C, D> {
    engine: GatingEngine,
    settings: SettingsHandle,
    clock_state: ClockStateHandle,
    counters: C,
    cooldowns: D,
    sensor: Box<dyn IdleSensor>,
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
    poll_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl<C: CounterStorage, D: CooldownStorage> ReminderMonitor<C, D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: SettingsHandle,
        clock_state: ClockStateHandle,
        counters: C,
        cooldowns: D,
        sensor: Box<dyn IdleSensor>,
        dispatcher: Dispatcher,
        shutdown: CancellationToken,
        poll_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            engine: GatingEngine::new(poll_interval),
            settings,
            clock_state,
            counters,
            cooldowns,
            sensor,
            dispatcher,
            shutdown,
            poll_interval,
            time_provider,
        }
    }

    pub fn clock_state(&self) -> &ClockStateHandle {
        &self.clock_state
    }

    pub fn activity_streak_seconds(&self) -> f64 {
        self.engine.streak_seconds()
    }

    /// One full evaluation of every reminder. An error means something could not be recorded;
    /// every due reminder has still been attempted.
    pub async fn tick(&mut self) -> Result<TickReport> {
        if self.settings.refresh_if_changed().await {
            info!("Reloaded settings");
        }
        if self.clock_state.sync_from_disk().await {
            info!("Clock state changed to {}", self.clock_state.current());
        }

        let settings = self.settings.current();
        let clock_state = self.clock_state.current();
        let idle_seconds = idle_seconds(self.sensor.as_mut());
        let now = self.time_provider.time();
        let today = now.date_naive();

        let day = self.counters.day_counters(today).await;
        let month = self.counters.month_counters(today).await;
        let cooldowns = Cooldowns {
            on_idle: self.cooldowns.last_fired(CooldownKind::OnIdle).await,
            off_active: self.cooldowns.last_fired(CooldownKind::OffActive).await,
        };

        let inputs = ReminderInputs {
            clock_state,
            idle_seconds,
            now,
            settings: &settings,
            day: &day,
            month: &month,
            cooldowns,
        };
        let actions = self.engine.tick(&inputs);
        debug!(
            "State {clock_state}, idle {idle_seconds:.0}s, streak {:.0}s, due {actions:?}",
            self.engine.streak_seconds()
        );

        let mut report = TickReport::default();
        let mut failures = Vec::new();
        for action in actions {
            if !self.dispatcher.execute(&action).await {
                warn!("Reminder {action:?} was not delivered");
                report.failed.push(action);
                continue;
            }
            info!("Delivered reminder {action:?}");
            if let Err(e) = self.record(&action, now).await {
                failures.push(e);
            }
            report.fired.push(action);
        }

        match failures.len() {
            0 => Ok(report),
            n => Err(anyhow!(
                "{n} reminder(s) were delivered but not fully recorded: {failures:?}"
            )),
        }
    }

    /// Counts a delivered reminder. Every store is updated even if an earlier one fails.
    async fn record(&mut self, action: &ReminderAction, now: DateTime<Local>) -> Result<()> {
        let today = now.date_naive();
        let mut result = self.counters.increment(action.counter(), today).await.map(|_| ());
        if action.counter() == CounterKind::Sms {
            result = result.and(self.counters.increment_monthly(today).await.map(|_| ()));
        }
        if let Some(kind) = action.cooldown() {
            result = result.and(
                self.cooldowns
                    .set_last_fired(kind, now.with_timezone(&Utc))
                    .await,
            );
        }
        result
    }

    /// Executes the monitor event loop. A failing tick is logged and the loop simply waits for the
    /// next one, only cancellation stops it.
    pub async fn run(mut self) -> Result<()> {
        let mut tick_point = self.time_provider.instant();
        loop {
            tick_point += self.poll_interval;

            let span = info_span!("Reminder tick");
            match self.tick().instrument(span).await {
                Ok(report) if report.fired.is_empty() && report.failed.is_empty() => {}
                Ok(report) => debug!("Tick finished {report:?}"),
                Err(e) => error!("Reminder tick failed, continuing with the next one {e:?}"),
            }

            // A tick that overran (a slow sms for example) skips the intervals it missed instead
            // of running them back to back.
            let now = self.time_provider.instant();
            while tick_point <= now {
                warn!("Skipping a tick that was missed");
                tick_point += self.poll_interval;
            }

            tokio::select! {
                // Cancelation means we stop execution of the event loop.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(tick_point) => ()
            }
        }
    }
}
