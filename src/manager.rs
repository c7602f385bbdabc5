use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{model::cue::CueDescriptor, sync::BridgeState};

/// Shared handle on the bridge state; the controller writes, the API reads.
#[derive(Clone, Default)]
pub struct BridgeStateManager {
    state: Arc<RwLock<BridgeState>>,
}

impl BridgeStateManager {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BridgeState::new())),
        }
    }

    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, BridgeState> {
        self.state.read().await
    }

    pub async fn write_with<F, R>(&self, updater: F) -> R
    where
        F: FnOnce(&mut BridgeState) -> R,
    {
        let mut guard = self.state.write().await;
        updater(&mut guard)
    }

    pub async fn get_cue_by_id(&self, cue_id: &str) -> Option<CueDescriptor> {
        self.read()
            .await
            .mirror
            .cues
            .iter()
            .find(|c| c.id == cue_id)
            .cloned()
    }
}
