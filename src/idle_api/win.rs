use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::error;
use windows::Win32::{
    System::SystemInformation::GetTickCount64,
    UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO},
};

use super::IdleSensor;

pub fn get_idle_time() -> Result<Duration> {
    let mut last: LASTINPUTINFO = LASTINPUTINFO {
        cbSize: size_of::<LASTINPUTINFO>() as u32,
        dwTime: 0,
    };
    let is_success = unsafe { GetLastInputInfo(&mut last) };
    if !is_success.as_bool() {
        return Err(anyhow!("Failed to retrieve user idle time"));
    }

    // dwTime is the 32 bit tick count, so it wraps every ~49.7 days. Comparing against the low
    // half of the 64 bit counter keeps the difference correct across the wrap.
    let tick_count = unsafe { GetTickCount64() } as u32;
    let millis = tick_count.wrapping_sub(last.dwTime);
    Ok(Duration::from_millis(u64::from(millis)))
}

pub struct WindowsIdleSensor {}

impl WindowsIdleSensor {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsIdleSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleSensor for WindowsIdleSensor {
    fn idle_time(&mut self) -> Result<Duration> {
        get_idle_time().inspect_err(|e| error!("Failed to get idle time {e:?}"))
    }
}
