use std::time::Duration;

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use tracing::{debug, trace};

use crate::{
    daemon::storage::entities::{
        ClockState, CooldownKind, CounterKind, DayCountersEntity, MonthCountersEntity,
    },
    phone::normalize_e164,
    settings::Settings,
    utils::time::to_epoch_seconds,
};

use super::{
    rules::{is_after_hour, is_before_cutoff, is_in_hour_window},
    streak::ActivityStreak,
};

/// Last time each cooldown bound reminder fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooldowns {
    pub on_idle: Option<DateTime<Utc>>,
    pub off_active: Option<DateTime<Utc>>,
}

impl Cooldowns {
    pub fn get(&self, kind: CooldownKind) -> Option<DateTime<Utc>> {
        match kind {
            CooldownKind::OnIdle => self.on_idle,
            CooldownKind::OffActive => self.off_active,
        }
    }
}

/// Everything a single evaluation looks at.
#[derive(Debug, Clone)]
pub struct ReminderInputs<'a> {
    pub clock_state: ClockState,
    pub idle_seconds: f64,
    pub now: DateTime<Local>,
    pub settings: &'a Settings,
    pub day: &'a DayCountersEntity,
    pub month: &'a MonthCountersEntity,
    pub cooldowns: Cooldowns,
}

/// A reminder the engine decided should go out. Executing it is up to the caller, and so is
/// recording it once it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderAction {
    /// Idle while clocked in.
    StillWorking,
    /// Active while clocked out.
    ForgotToClockIn,
    SendSms { to: String, body: String },
}

impl ReminderAction {
    pub fn counter(&self) -> CounterKind {
        match self {
            ReminderAction::StillWorking => CounterKind::On,
            ReminderAction::ForgotToClockIn => CounterKind::Off,
            ReminderAction::SendSms { .. } => CounterKind::Sms,
        }
    }

    pub fn cooldown(&self) -> Option<CooldownKind> {
        match self {
            ReminderAction::StillWorking => Some(CooldownKind::OnIdle),
            ReminderAction::ForgotToClockIn => Some(CooldownKind::OffActive),
            ReminderAction::SendSms { .. } => None,
        }
    }
}

pub fn sms_reminder_body(tracker_url: &str) -> String {
    format!(
        "Still working? You are idle while clocked in. Open your time tracker to clock out: {tracker_url}"
    )
}

/// Evaluates every reminder independently against `inputs`. Several reminders may fire in the
/// same tick. Nothing is fired at all on days disabled in `notify_days`.
pub fn evaluate(inputs: &ReminderInputs<'_>, streak_seconds: f64) -> Vec<ReminderAction> {
    let mut actions = Vec::new();
    if !inputs.settings.notify_days.is_enabled(inputs.now.weekday()) {
        return actions;
    }
    if still_working_due(inputs) {
        actions.push(ReminderAction::StillWorking);
    }
    if forgot_to_clock_in_due(inputs, streak_seconds) {
        actions.push(ReminderAction::ForgotToClockIn);
    }
    if let Some(to) = sms_recipient(inputs) {
        actions.push(ReminderAction::SendSms {
            to,
            body: sms_reminder_body(&inputs.settings.tracker_url),
        });
    }
    actions
}

fn minutes(value: i64) -> f64 {
    value as f64 * 60.
}

fn below_cap(count: u32, cap: i64) -> bool {
    i64::from(count) < cap
}

fn cooldown_elapsed(inputs: &ReminderInputs<'_>, kind: CooldownKind, cooldown_min: i64) -> bool {
    match inputs.cooldowns.get(kind) {
        None => true,
        Some(last) => {
            to_epoch_seconds(&inputs.now) - to_epoch_seconds(&last) >= minutes(cooldown_min)
        }
    }
}

fn still_working_due(inputs: &ReminderInputs<'_>) -> bool {
    let settings = inputs.settings;
    inputs.clock_state == ClockState::On
        && settings.enable_clock_out_idle_reminder
        && inputs.idle_seconds >= minutes(settings.on_idle_threshold_min)
        && is_after_hour(settings.on_idle_after_hour, inputs.now.hour())
        && below_cap(inputs.day.on, settings.max_clock_out_per_day)
        && cooldown_elapsed(
            inputs,
            CooldownKind::OnIdle,
            settings.on_idle_prompt_cooldown_min,
        )
}

fn forgot_to_clock_in_due(inputs: &ReminderInputs<'_>, streak_seconds: f64) -> bool {
    let settings = inputs.settings;
    inputs.clock_state == ClockState::Off
        && settings.enable_clock_in_reminder
        && streak_seconds >= minutes(settings.active_threshold_off_min)
        && is_before_cutoff(settings.clock_in_cutoff_hour, inputs.now.hour())
        && below_cap(inputs.day.off, settings.max_clock_in_per_day)
        && cooldown_elapsed(
            inputs,
            CooldownKind::OffActive,
            settings.off_prompt_cooldown_min,
        )
}

/// Phone number to text, if an sms reminder is due.
fn sms_recipient(inputs: &ReminderInputs<'_>) -> Option<String> {
    let settings = inputs.settings;
    if inputs.clock_state != ClockState::On || !settings.enable_sms_clock_out_reminder {
        return None;
    }
    let to = normalize_e164(&settings.sms_phone_e164)?;
    let due = inputs.idle_seconds >= minutes(settings.sms_idle_threshold_min)
        && is_in_hour_window(
            settings.sms_window_start_hour,
            settings.sms_window_end_hour,
            inputs.now.hour(),
        )
        && below_cap(inputs.day.sms, settings.sms_max_per_day)
        && below_cap(inputs.month.sms, settings.sms_max_per_month);
    due.then_some(to)
}

/// Stateful wrapper around [evaluate] that owns the activity streak. Clock state changes are
/// detected between ticks and always reset the streak.
#[derive(Debug)]
pub struct GatingEngine {
    streak: ActivityStreak,
    poll_interval: Duration,
    last_clock_state: Option<ClockState>,
}

impl GatingEngine {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            streak: ActivityStreak::default(),
            poll_interval,
            last_clock_state: None,
        }
    }

    pub fn streak_seconds(&self) -> f64 {
        self.streak.seconds()
    }

    /// Must be called whenever the user clocks in or out.
    pub fn observe_clock_state(&mut self, state: ClockState) {
        match self.last_clock_state.replace(state) {
            Some(previous) if previous != state => {
                debug!("Clock state changed {previous} -> {state}, resetting activity streak");
                self.streak.reset();
            }
            _ => {}
        }
    }

    pub fn tick(&mut self, inputs: &ReminderInputs<'_>) -> Vec<ReminderAction> {
        self.observe_clock_state(inputs.clock_state);

        let settings = inputs.settings;
        if !settings.notify_days.is_enabled(inputs.now.weekday()) {
            // The streak is frozen rather than reset, so it continues where it was once
            // reminders are allowed again.
            trace!("Reminders are disabled on {}", inputs.now.weekday());
            return Vec::new();
        }

        if inputs.clock_state == ClockState::Off && settings.enable_clock_in_reminder {
            let streak = self.streak.observe(
                inputs.idle_seconds,
                settings.active_idle_cutoff_sec as f64,
                self.poll_interval,
            );
            trace!("Activity streak is {streak}s");
        }

        evaluate(inputs, self.streak.seconds())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

    use crate::{
        daemon::{
            engine::gating::{
                evaluate, sms_reminder_body, Cooldowns, GatingEngine, ReminderAction,
                ReminderInputs,
            },
            storage::entities::{ClockState, DayCountersEntity, MonthCountersEntity},
        },
        settings::{NotifyDays, Settings},
    };

    const POLL: Duration = Duration::from_secs(10);

    /// 2025-09-10 is a Wednesday.
    fn wednesday_at(hour: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 9, 10, hour, 0, 0)
            .single()
            .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 10).unwrap()
    }

    struct Fixture {
        settings: Settings,
        day: DayCountersEntity,
        month: MonthCountersEntity,
    }

    impl Fixture {
        fn new(settings: Settings) -> Self {
            Self {
                settings,
                day: DayCountersEntity::empty(today()),
                month: MonthCountersEntity::empty(today()),
            }
        }

        fn inputs(&self, clock_state: ClockState, idle_seconds: f64, now: DateTime<Local>) -> ReminderInputs<'_> {
            ReminderInputs {
                clock_state,
                idle_seconds,
                now,
                settings: &self.settings,
                day: &self.day,
                month: &self.month,
                cooldowns: Cooldowns::default(),
            }
        }
    }

    fn sms_settings() -> Settings {
        Settings {
            enable_clock_out_idle_reminder: false,
            enable_sms_clock_out_reminder: true,
            sms_phone_e164: "+358401234567".into(),
            sms_idle_threshold_min: 60,
            sms_window_start_hour: 0,
            sms_window_end_hour: 24,
            sms_max_per_day: 1,
            sms_max_per_month: 10,
            ..Settings::default()
        }
    }

    #[test]
    fn test_clock_out_reminder_fires_when_idle() {
        let fixture = Fixture::new(Settings {
            on_idle_threshold_min: 45,
            on_idle_after_hour: 0,
            on_idle_prompt_cooldown_min: 0,
            max_clock_out_per_day: 3,
            ..Settings::default()
        });
        let inputs = fixture.inputs(ClockState::On, 2700., wednesday_at(10));
        assert_eq!(evaluate(&inputs, 0.), vec![ReminderAction::StillWorking]);

        let inputs = fixture.inputs(ClockState::On, 2699., wednesday_at(10));
        assert!(evaluate(&inputs, 0.).is_empty());

        let inputs = fixture.inputs(ClockState::Off, 2700., wednesday_at(10));
        assert!(!evaluate(&inputs, 0.).contains(&ReminderAction::StillWorking));
    }

    #[test]
    fn test_clock_out_reminder_respects_after_hour() {
        let fixture = Fixture::new(Settings {
            on_idle_after_hour: 17,
            ..Settings::default()
        });
        let inputs = fixture.inputs(ClockState::On, 3600., wednesday_at(16));
        assert!(evaluate(&inputs, 0.).is_empty());
        let inputs = fixture.inputs(ClockState::On, 3600., wednesday_at(17));
        assert_eq!(evaluate(&inputs, 0.), vec![ReminderAction::StillWorking]);
    }

    #[test]
    fn test_cooldown_boundary() {
        let fixture = Fixture::new(Settings {
            on_idle_prompt_cooldown_min: 30,
            ..Settings::default()
        });
        let fired_at = wednesday_at(10).with_timezone(&Utc);
        let mut inputs = fixture.inputs(ClockState::On, 3600., wednesday_at(10));
        inputs.cooldowns = Cooldowns {
            on_idle: Some(fired_at),
            off_active: None,
        };

        for offset in [0, 60, 30 * 60 - 1] {
            inputs.now = wednesday_at(10) + chrono::Duration::seconds(offset);
            assert!(evaluate(&inputs, 0.).is_empty(), "fired {offset}s after");
        }
        for offset in [30 * 60, 30 * 60 + 1, 3 * 60 * 60] {
            inputs.now = wednesday_at(10) + chrono::Duration::seconds(offset);
            assert_eq!(evaluate(&inputs, 0.), vec![ReminderAction::StillWorking]);
        }
    }

    #[test]
    fn test_daily_cap_blocks_until_rollover() {
        let mut fixture = Fixture::new(Settings {
            on_idle_prompt_cooldown_min: 0,
            max_clock_out_per_day: 3,
            ..Settings::default()
        });
        fixture.day.on = 3;
        let inputs = fixture.inputs(ClockState::On, 3600., wednesday_at(10));
        assert!(evaluate(&inputs, 0.).is_empty());

        fixture.day = fixture.day.clone().rolled_over(today().succ_opt().unwrap());
        let inputs = fixture.inputs(ClockState::On, 3600., wednesday_at(10) + chrono::Duration::days(1));
        assert_eq!(evaluate(&inputs, 0.), vec![ReminderAction::StillWorking]);
    }

    #[test]
    fn test_zero_cap_never_fires() {
        let fixture = Fixture::new(Settings {
            max_clock_out_per_day: 0,
            ..Settings::default()
        });
        let inputs = fixture.inputs(ClockState::On, 36000., wednesday_at(10));
        assert!(evaluate(&inputs, 0.).is_empty());
    }

    #[test]
    fn test_clock_in_reminder_respects_cutoff() {
        let fixture = Fixture::new(Settings {
            active_threshold_off_min: 30,
            clock_in_cutoff_hour: 15,
            ..Settings::default()
        });
        let inputs = fixture.inputs(ClockState::Off, 0., wednesday_at(14));
        assert_eq!(evaluate(&inputs, 1800.), vec![ReminderAction::ForgotToClockIn]);
        assert!(evaluate(&inputs, 1790.).is_empty());

        let inputs = fixture.inputs(ClockState::Off, 0., wednesday_at(16));
        assert!(evaluate(&inputs, 1800.).is_empty());
    }

    #[test]
    fn test_clock_in_cutoff_of_24_allows_every_hour() {
        let fixture = Fixture::new(Settings {
            clock_in_cutoff_hour: 24,
            ..Settings::default()
        });
        for hour in 0..24 {
            let Some(now) = Local.with_ymd_and_hms(2025, 9, 10, hour, 30, 0).single() else {
                continue;
            };
            let inputs = fixture.inputs(ClockState::Off, 0., now);
            assert_eq!(evaluate(&inputs, 1800.), vec![ReminderAction::ForgotToClockIn], "{hour}");
        }
    }

    #[test]
    fn test_disabled_weekday_blocks_everything() {
        let mut settings = sms_settings();
        settings.enable_clock_out_idle_reminder = true;
        settings.notify_days = NotifyDays {
            wed: false,
            ..NotifyDays::default()
        };
        let fixture = Fixture::new(settings);
        let inputs = fixture.inputs(ClockState::On, 36000., wednesday_at(14));
        assert!(evaluate(&inputs, 0.).is_empty());
    }

    #[test]
    fn test_sms_and_desktop_fire_together() {
        let mut settings = sms_settings();
        settings.enable_clock_out_idle_reminder = true;
        let fixture = Fixture::new(settings);
        let inputs = fixture.inputs(ClockState::On, 3600., wednesday_at(14));
        assert_eq!(
            evaluate(&inputs, 0.),
            vec![
                ReminderAction::StillWorking,
                ReminderAction::SendSms {
                    to: "+358401234567".into(),
                    body: sms_reminder_body(&fixture.settings.tracker_url),
                }
            ]
        );
    }

    #[test]
    fn test_sms_requires_both_caps() {
        let mut fixture = Fixture::new(sms_settings());
        let fire = |fixture: &Fixture| {
            let inputs = fixture.inputs(ClockState::On, 3600., wednesday_at(14));
            !evaluate(&inputs, 0.).is_empty()
        };
        assert!(fire(&fixture));

        fixture.day.sms = 1;
        assert!(!fire(&fixture));

        // New day, but the month is used up.
        fixture.day = DayCountersEntity::empty(today());
        fixture.month.sms = 10;
        assert!(!fire(&fixture));

        fixture.month.sms = 9;
        assert!(fire(&fixture));
    }

    #[test]
    fn test_sms_window_and_phone() {
        let mut fixture = Fixture::new(Settings {
            sms_window_start_hour: 12,
            sms_window_end_hour: 22,
            ..sms_settings()
        });
        let at = |fixture: &Fixture, hour| {
            let inputs = fixture.inputs(ClockState::On, 3600., wednesday_at(hour));
            evaluate(&inputs, 0.).len()
        };
        assert_eq!(at(&fixture, 11), 0);
        assert_eq!(at(&fixture, 12), 1);
        assert_eq!(at(&fixture, 22), 0);

        fixture.settings.sms_phone_e164 = "12345".into();
        assert_eq!(at(&fixture, 12), 0);
    }

    #[test]
    fn test_engine_streak_scenario() {
        let fixture = Fixture::new(Settings {
            active_threshold_off_min: 30,
            clock_in_cutoff_hour: 15,
            ..Settings::default()
        });
        let mut engine = GatingEngine::new(POLL);
        let mut fired = Vec::new();
        for _ in 0..180 {
            fired = engine.tick(&fixture.inputs(ClockState::Off, 1., wednesday_at(14)));
        }
        assert_eq!(engine.streak_seconds(), 1800.);
        assert_eq!(fired, vec![ReminderAction::ForgotToClockIn]);

        let late = engine.tick(&fixture.inputs(ClockState::Off, 1., wednesday_at(16)));
        assert!(late.is_empty());
    }

    #[test]
    fn test_engine_resets_streak_on_clock_change_and_idle() {
        let fixture = Fixture::new(Settings::default());
        let mut engine = GatingEngine::new(POLL);
        for _ in 0..10 {
            engine.tick(&fixture.inputs(ClockState::Off, 0., wednesday_at(10)));
        }
        assert_eq!(engine.streak_seconds(), 100.);

        engine.tick(&fixture.inputs(ClockState::Off, 300., wednesday_at(10)));
        assert_eq!(engine.streak_seconds(), 0.);

        engine.tick(&fixture.inputs(ClockState::Off, 0., wednesday_at(10)));
        assert_eq!(engine.streak_seconds(), 10.);

        engine.tick(&fixture.inputs(ClockState::On, 0., wednesday_at(10)));
        assert_eq!(engine.streak_seconds(), 0.);
    }

    #[test]
    fn test_engine_freezes_streak_on_disabled_day() {
        let fixture = Fixture::new(Settings::default());
        let mut engine = GatingEngine::new(POLL);
        engine.tick(&fixture.inputs(ClockState::Off, 0., wednesday_at(10)));

        // 2025-09-13 is a Saturday, disabled by default.
        let saturday = Local.with_ymd_and_hms(2025, 9, 13, 10, 0, 0).single().unwrap();
        engine.tick(&fixture.inputs(ClockState::Off, 0., saturday));
        engine.tick(&fixture.inputs(ClockState::Off, 1000., saturday));
        assert_eq!(engine.streak_seconds(), 10.);
    }
}
