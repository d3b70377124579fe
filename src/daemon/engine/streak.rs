use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakPhase {
    Accumulating,
    IdleReset,
}

/// Continuous active time while clocked out. Lives only in memory, a restart starts from zero.
#[derive(Debug, Clone)]
pub struct ActivityStreak {
    seconds: f64,
    phase: StreakPhase,
}

impl Default for ActivityStreak {
    fn default() -> Self {
        Self {
            seconds: 0.,
            phase: StreakPhase::Accumulating,
        }
    }
}

impl ActivityStreak {
    /// Accounts for one poll. Idle time below `idle_cutoff_seconds` extends the streak by
    /// `elapsed`, anything else breaks it.
    pub fn observe(&mut self, idle_seconds: f64, idle_cutoff_seconds: f64, elapsed: Duration) -> f64 {
        if idle_seconds < idle_cutoff_seconds {
            if self.phase == StreakPhase::IdleReset {
                self.seconds = 0.;
                self.phase = StreakPhase::Accumulating;
            }
            self.seconds += elapsed.as_secs_f64();
        } else {
            self.seconds = 0.;
            self.phase = StreakPhase::IdleReset;
        }
        self.seconds
    }

    /// Explicit clock in/out always starts over.
    pub fn reset(&mut self) {
        self.seconds = 0.;
        self.phase = StreakPhase::Accumulating;
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn phase(&self) -> StreakPhase {
        self.phase
    }
}
