use anyhow::Result;
use notify_rust::Notification;
use tracing::instrument;

use super::Notifier;

/// Shows notifications through the platform notification service.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    #[instrument(skip(self))]
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .show()?;
        Ok(())
    }
}
