use std::{future::Future, path::PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{
    fs::operations::{read_optional, write_atomic},
    utils::time::{from_epoch_seconds, to_epoch_seconds},
};

use super::entities::CooldownKind;

/// Remembers when each reminder last fired. Timestamps are stored as plain epoch seconds text.
pub trait CooldownStorage {
    /// `None` if the reminder never fired, or the stored timestamp can't be read.
    fn last_fired(&mut self, kind: CooldownKind) -> impl Future<Output = Option<DateTime<Utc>>>;

    fn set_last_fired(
        &mut self,
        kind: CooldownKind,
        moment: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>>;
}

pub struct CooldownStorageImpl {
    dir: PathBuf,
    on_idle: Option<DateTime<Utc>>,
    off_active: Option<DateTime<Utc>>,
}

impl CooldownStorageImpl {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            on_idle: None,
            off_active: None,
        })
    }

    fn path(&self, kind: CooldownKind) -> PathBuf {
        self.dir.join(match kind {
            CooldownKind::OnIdle => "last_on_prompt.txt",
            CooldownKind::OffActive => "last_off_prompt.txt",
        })
    }

    fn cached(&mut self, kind: CooldownKind) -> &mut Option<DateTime<Utc>> {
        match kind {
            CooldownKind::OnIdle => &mut self.on_idle,
            CooldownKind::OffActive => &mut self.off_active,
        }
    }
}

impl CooldownStorage for CooldownStorageImpl {
    async fn last_fired(&mut self, kind: CooldownKind) -> Option<DateTime<Utc>> {
        let path = self.path(kind);
        match read_optional(&path).await {
            Ok(Some(text)) => match text.trim().parse::<f64>().ok().and_then(from_epoch_seconds) {
                Some(moment) => {
                    // Another process may have fired more recently than this one knows about.
                    let cached = self.cached(kind);
                    let latest = cached.map_or(moment, |v| v.max(moment));
                    *cached = Some(latest);
                    Some(latest)
                }
                None => {
                    warn!("Ignoring unreadable cooldown timestamp in {path:?}: {text:?}");
                    *self.cached(kind)
                }
            },
            Ok(None) => *self.cached(kind),
            Err(e) => {
                warn!("Failed to read cooldown {path:?}, using in-memory copy: {e}");
                *self.cached(kind)
            }
        }
    }

    async fn set_last_fired(&mut self, kind: CooldownKind, moment: DateTime<Utc>) -> Result<()> {
        *self.cached(kind) = Some(moment);
        let path = self.path(kind);
        write_atomic(&path, to_epoch_seconds(&moment).to_string().as_bytes())
            .await
            .inspect_err(|e| warn!("Failed to persist cooldown {path:?}: {e}"))?;
        Ok(())
    }
}
