use std::{future::Future, path::PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::fs::operations::{read_optional, write_atomic};

use super::entities::ClockState;

pub const STATE_FILE_NAME: &str = "status.txt";

/// Persistence of the [ClockState]. The file holds the plain text `On` or `Off`.
pub trait StateStorage {
    /// `None` if nothing was stored yet. Unreadable or unparsable state is an error, so callers
    /// can keep what they already know.
    fn load(&self) -> impl Future<Output = Result<Option<ClockState>>>;

    /// Startup view of the state: anything but a stored value is [ClockState::Off].
    fn load_or_default(&self) -> impl Future<Output = ClockState> {
        async move {
            self.load()
                .await
                .inspect_err(|e| warn!("Failed to load clock state, assuming Off: {e:?}"))
                .ok()
                .flatten()
                .unwrap_or_default()
        }
    }

    fn save(&self, state: ClockState) -> impl Future<Output = Result<()>>;
}

#[derive(Debug, Clone)]
pub struct StateStorageImpl {
    path: PathBuf,
}

impl StateStorageImpl {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(STATE_FILE_NAME),
        }
    }
}

impl StateStorage for StateStorageImpl {
    async fn load(&self) -> Result<Option<ClockState>> {
        let Some(text) = read_optional(&self.path)
            .await
            .with_context(|| format!("Failed to read clock state {:?}", self.path))?
        else {
            return Ok(None);
        };
        Ok(Some(text.parse()?))
    }

    async fn save(&self, state: ClockState) -> Result<()> {
        write_atomic(&self.path, state.to_string().as_bytes()).await?;
        Ok(())
    }
}
