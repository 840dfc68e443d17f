// Shared handle to the session token.
//
// The controller owns the session; the moderation client gets a clone of this
// handle so it can attach and refresh the token without seeing the history.
// Every reset bumps the epoch so late responses from an earlier session can be
// recognized and dropped.

use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct SessionSlot {
    token: Option<String>,
    epoch: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    slot: Arc<RwLock<SessionSlot>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token and epoch read together, as a submission sees them when it starts.
    pub async fn current(&self) -> (Option<String>, u64) {
        let slot = self.slot.read().await;
        (slot.token.clone(), slot.epoch)
    }

    pub async fn token(&self) -> Option<String> {
        self.slot.read().await.token.clone()
    }

    pub async fn epoch(&self) -> u64 {
        self.slot.read().await.epoch
    }

    /// Adopt a token issued by the service (last write wins).
    ///
    /// Returns false and leaves the slot alone if a reset happened since `epoch`.
    pub async fn adopt(&self, epoch: u64, token: String) -> bool {
        let mut slot = self.slot.write().await;
        if slot.epoch != epoch {
            return false;
        }
        slot.token = Some(token);
        true
    }

    /// Drop the token and start a new epoch. Returns the token that was held.
    pub async fn invalidate(&self) -> Option<String> {
        let mut slot = self.slot.write().await;
        slot.epoch += 1;
        slot.token.take()
    }
}
