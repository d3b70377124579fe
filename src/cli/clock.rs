use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    daemon::{
        status::ClockStateHandle,
        storage::{entities::ClockState, state_storage::StateStorageImpl},
    },
    settings::store::SettingsStore,
};

/// Clocks in or out. A running daemon picks the change up on its next poll and starts the
/// activity streak over. The tracker page is opened so the user can clock in there as well.
pub async fn set_clock_state(dir: &Path, state: ClockState, open_browser: bool) -> Result<()> {
    let handle = ClockStateHandle::open(StateStorageImpl::new(dir.to_owned())).await;
    let previous = handle.current();
    handle.set(state).await?;
    if previous == state {
        info!("Clock state was already {state}");
    }
    info!("Clock state set to {state}");
    println!("Clocked {}", state.to_string().to_lowercase());

    if open_browser {
        let url = SettingsStore::new(dir).load().await.tracker_url;
        if let Err(e) = open::that(&url) {
            warn!("Failed to open {url}: {e}");
            println!("Open {url} to update the tracker");
        }
    }
    Ok(())
}
