//!  Storage of everything the reminders need to remember between ticks and restarts.
//!  The basic idea is:
//!   - All files live directly in the application directory.
//!   - Counters are json documents keyed by the local day or month they belong to. Reading a
//!     record of another period yields zeros.
//!   - Cooldowns and the clock state are single plain text values.
//!   - Every write replaces the whole file atomically.

pub mod cooldown_storage;
pub mod counter_storage;
pub mod entities;
pub mod state_storage;
