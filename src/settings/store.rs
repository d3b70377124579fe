use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::fs::operations::{read_optional, write_atomic};

use super::Settings;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// File backed persistence of [Settings].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(app_dir: &Path) -> Self {
        Self {
            path: app_dir.join(SETTINGS_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the default document if there is no settings file yet, so users have something to
    /// edit.
    pub async fn ensure_exists(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        info!("Creating default settings at {:?}", self.path);
        self.save(&Settings::default()).await
    }

    /// Loads and validates the document. A missing or unreadable file yields defaults.
    pub async fn load(&self) -> Settings {
        let settings = match read_optional(&self.path).await {
            Ok(Some(document)) => Settings::from_document(&document),
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("Failed to read settings {:?}: {e}", self.path);
                Settings::default()
            }
        };
        settings.validated()
    }

    /// Persists only known keys, with values already brought into range.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        let document = settings.clone().validated().to_document()?;
        write_atomic(&self.path, document.as_bytes()).await?;
        Ok(())
    }

    pub async fn modified(&self) -> Option<SystemTime> {
        let metadata = tokio::fs::metadata(&self.path).await.ok()?;
        metadata.modified().ok()
    }
}

/// Owner of the current settings snapshot. Readers subscribe and always see a complete
/// [Settings]; replacing it is a single send on a watch channel.
pub struct SettingsHandle {
    store: SettingsStore,
    sender: watch::Sender<Arc<Settings>>,
    last_modified: Option<SystemTime>,
}

impl SettingsHandle {
    pub async fn open(store: SettingsStore) -> Self {
        let last_modified = store.modified().await;
        let settings = store.load().await;
        let (sender, _) = watch::channel(Arc::new(settings));
        Self {
            store,
            sender,
            last_modified,
        }
    }

    pub fn current(&self) -> Arc<Settings> {
        self.sender.borrow().clone()
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Persists `settings` and publishes them. The snapshot is replaced even if writing fails so
    /// the running process keeps using what the user asked for.
    pub async fn save(&mut self, settings: Settings) -> Result<Arc<Settings>> {
        let settings = Arc::new(settings.validated());
        self.sender.send_replace(settings.clone());
        let result = self.store.save(&settings).await;
        self.last_modified = self.store.modified().await;
        result.map(|_| settings)
    }

    /// Reloads the document if the file changed since the last look. Returns whether a new
    /// snapshot was published.
    pub async fn refresh_if_changed(&mut self) -> bool {
        let modified = self.store.modified().await;
        if modified == self.last_modified {
            return false;
        }
        self.last_modified = modified;

        let settings = self.store.load().await;
        let changed = **self.sender.borrow() != settings;
        if changed {
            debug!("Settings changed on disk, publishing new snapshot");
            self.sender.send_replace(Arc::new(settings));
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;

    use crate::settings::{
        store::{SettingsHandle, SettingsStore},
        Settings,
    };

    #[tokio::test]
    async fn test_ensure_exists_writes_defaults_once() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::new(dir.path());

        store.ensure_exists().await?;
        let document = tokio::fs::read_to_string(store.path()).await?;
        assert_eq!(Settings::from_document(&document), Settings::default());

        tokio::fs::write(store.path(), r#"{"max_clock_in_per_day": 1}"#).await?;
        store.ensure_exists().await?;
        assert_eq!(store.load().await.max_clock_in_per_day, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_publishes_snapshot() -> Result<()> {
        let dir = tempdir()?;
        let mut handle = SettingsHandle::open(SettingsStore::new(dir.path())).await;
        let before = handle.current();

        let saved = handle
            .save(Settings {
                on_idle_threshold_min: 5,
                sms_window_end_hour: 99,
                ..Settings::default()
            })
            .await?;

        assert_eq!(saved.sms_window_end_hour, 24);
        assert_eq!(handle.current(), saved);
        assert_eq!(before.on_idle_threshold_min, 45);
        assert_eq!(handle.store().load().await.on_idle_threshold_min, 5);
        // A save from this process isn't reported as an outside edit.
        assert!(!handle.refresh_if_changed().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_picks_up_external_edit() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::new(dir.path());
        store.ensure_exists().await?;
        let mut handle = SettingsHandle::open(store.clone()).await;

        assert!(!handle.refresh_if_changed().await);

        // Make sure the modification time moves even on coarse filesystems.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        tokio::fs::write(store.path(), r#"{"sms_max_per_month": 3}"#).await?;

        assert!(handle.refresh_if_changed().await);
        assert_eq!(handle.current().sms_max_per_month, 3);
        Ok(())
    }
}
