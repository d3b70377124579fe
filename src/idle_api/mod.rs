//! Contains logic for finding out how long the user has been away from their input devices.
//! [GenericIdleSensor] is the main artifact of this module that abstracts the platforms.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// Intended to serve as a contract windows and linux systems must implement.
#[cfg_attr(test, mockall::automock)]
pub trait IdleSensor {
    /// Time since the last keyboard or mouse input.
    fn idle_time(&mut self) -> Result<Duration>;
}

/// Idle seconds as seen by the reminders. A sensor that fails reports the user as present, the
/// reminders never stall because of a platform error.
pub fn idle_seconds(sensor: &mut dyn IdleSensor) -> f64 {
    match sensor.idle_time() {
        Ok(v) => v.as_secs_f64(),
        Err(e) => {
            warn!("Failed to query idle time, assuming user is present {e:?}");
            0.
        }
    }
}

/// Used when no platform backend is compiled in. Always reports an active user.
pub struct NullIdleSensor;

impl IdleSensor for NullIdleSensor {
    fn idle_time(&mut self) -> Result<Duration> {
        Ok(Duration::ZERO)
    }
}

/// Serves as a cross-compatible IdleSensor implementation.
pub struct GenericIdleSensor {
    inner: Box<dyn IdleSensor>,
}

impl GenericIdleSensor {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsIdleSensor;
                Ok(Self {
                    inner: Box::new(WindowsIdleSensor::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::X11IdleSensor;
                Ok(Self {
                    inner: Box::new(X11IdleSensor::new()?),
                })
            }
            else {
                warn!("No idle time backend was compiled in, the user will always look active");
                Ok(Self {
                    inner: Box::new(NullIdleSensor),
                })
            }
        }
    }
}

impl IdleSensor for GenericIdleSensor {
    fn idle_time(&mut self) -> Result<Duration> {
        self.inner.idle_time()
    }
}
