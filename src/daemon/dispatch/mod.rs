//! Delivery of reminders to the user. The gating engine only decides, implementations here
//! actually show a notification or send a text, and report whether it worked so that failed
//! attempts don't consume any budget.

pub mod desktop;
pub mod twilio;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{error, warn};

use super::engine::gating::ReminderAction;

pub const APP_TITLE: &str = "Clocker Helper";

/// Desktop notifications.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Sms delivery. Implementations never fail loudly: anything from missing credentials to a
/// network error is reported as `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsTransport: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> bool;
}

/// Executes [ReminderAction]s decided by the gating engine.
pub struct Dispatcher {
    notifier: Box<dyn Notifier>,
    sms: Box<dyn SmsTransport>,
    sms_timeout: Duration,
}

impl Dispatcher {
    pub fn new(notifier: Box<dyn Notifier>, sms: Box<dyn SmsTransport>, sms_timeout: Duration) -> Self {
        Self {
            notifier,
            sms,
            sms_timeout,
        }
    }

    /// Returns whether the reminder reached the user. Only successful reminders are counted.
    pub async fn execute(&self, action: &ReminderAction) -> bool {
        match action {
            ReminderAction::StillWorking => self.notify("Still working?"),
            ReminderAction::ForgotToClockIn => self.notify("Forgot to clock in?"),
            ReminderAction::SendSms { to, body } => {
                let sent = match timeout(self.sms_timeout, self.sms.send_sms(to, body)).await {
                    Ok(sent) => sent,
                    Err(_) => {
                        warn!("Sms was not sent within {:?}", self.sms_timeout);
                        false
                    }
                };
                if sent {
                    // Confirmation is a courtesy, the sms already counts.
                    let _ = self.notify("SMS clock-out reminder sent");
                }
                sent
            }
        }
    }

    fn notify(&self, message: &str) -> bool {
        match self.notifier.notify(APP_TITLE, message) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to show notification {message:?}: {e:?}");
                false
            }
        }
    }
}
