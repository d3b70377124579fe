//! Decision core of the reminders. [gating::GatingEngine] turns a snapshot of the current state
//! into [gating::ReminderAction]s. It never dispatches anything itself and never touches storage.

pub mod gating;
pub mod rules;
pub mod streak;
