use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::instrument;
use xcb::{
    screensaver::{QueryInfo, QueryInfoReply},
    x::Drawable,
    Connection,
};

use super::IdleSensor;

/// Reads idle time through the MIT-SCREEN-SAVER extension.
pub struct X11IdleSensor {
    connection: Connection,
    preferred_screen: i32,
}

impl X11IdleSensor {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) =
            Connection::connect_with_extensions(None, &[xcb::Extension::ScreenSaver], &[])?;
        Ok(Self {
            connection,
            preferred_screen,
        })
    }
}

impl IdleSensor for X11IdleSensor {
    #[instrument(skip(self))]
    fn idle_time(&mut self) -> Result<Duration> {
        let setup = self.connection.get_setup();
        let root = setup
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .ok_or_else(|| anyhow!("Screen {} is not available", self.preferred_screen))?
            .root();
        let cookie = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(root),
        });
        let reply: QueryInfoReply = self.connection.wait_for_reply(cookie)?;
        Ok(Duration::from_millis(u64::from(reply.ms_since_user_input())))
    }
}
