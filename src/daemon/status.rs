use anyhow::Result;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::storage::{
    entities::ClockState,
    state_storage::{StateStorage, StateStorageImpl},
};

/// Single writer of the [ClockState]. Everything else only reads it through [Self::subscribe].
pub struct ClockStateHandle<S: StateStorage = StateStorageImpl> {
    storage: S,
    sender: watch::Sender<ClockState>,
}

impl<S: StateStorage> ClockStateHandle<S> {
    pub async fn open(storage: S) -> Self {
        let state = storage.load_or_default().await;
        let (sender, _) = watch::channel(state);
        Self { storage, sender }
    }

    pub fn current(&self) -> ClockState {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClockState> {
        self.sender.subscribe()
    }

    /// Clocks in or out. Readers see the new state even if it couldn't be persisted.
    pub async fn set(&self, state: ClockState) -> Result<()> {
        self.sender.send_replace(state);
        self.storage.save(state).await
    }

    /// Picks up a state written by another process, for example the cli. Returns whether the
    /// state changed. A missing or unreadable file keeps the current state, only a stored value
    /// can change it.
    pub async fn sync_from_disk(&self) -> bool {
        let stored = match self.storage.load().await {
            Ok(Some(v)) => v,
            Ok(None) => return false,
            Err(e) => {
                warn!("Keeping clock state {}: {e:?}", self.current());
                return false;
            }
        };
        self.sender.send_if_modified(|current| {
            if *current == stored {
                false
            } else {
                *current = stored;
                true
            }
        })
    }
}

/// Read-only consumer of the clock state. Reports transitions until shutdown.
pub async fn report_clock_state(
    mut receiver: watch::Receiver<ClockState>,
    shutdown: CancellationToken,
) {
    info!("Clock state is {}", *receiver.borrow_and_update());
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            changed = receiver.changed() => {
                if changed.is_err() {
                    warn!("Clock state publisher is gone");
                    return;
                }
                info!("Clock state is now {}", *receiver.borrow_and_update());
            }
        }
    }
}
