use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    dao::{models::ScoreState, storage::StorageError},
    state::score::StaleResponse,
};

/// What happened to one score request.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// The ledger answered and the cache took the totals.
    Applied(ScoreState),
    /// The ledger answered but a newer request or a session change won.
    Stale(StaleResponse),
    /// No user is active; nothing was sent.
    Idle,
    /// The request failed; the cache kept its previous value.
    Failed(Arc<StorageError>),
}

impl SyncOutcome {
    pub(crate) fn from_apply(result: Result<ScoreState, StaleResponse>) -> Self {
        match result {
            Ok(score) => SyncOutcome::Applied(score),
            Err(stale) => SyncOutcome::Stale(stale),
        }
    }

    pub(crate) fn failed(err: StorageError) -> Self {
        SyncOutcome::Failed(Arc::new(err))
    }

    pub fn applied(&self) -> Option<ScoreState> {
        match self {
            SyncOutcome::Applied(score) => Some(*score),
            _ => None,
        }
    }
}

/// Notification published by the running core.
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A countdown expiry was dispatched to the ledger.
    Scored { round: u64, outcome: SyncOutcome },
    /// A reconciliation poll finished.
    Reconciled(SyncOutcome),
}

/// Simple broadcast hub fanning core events out to observers.
pub struct EventHub {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn publish(&self, event: CoreEvent) {
        let _ = self.sender.send(event);
    }
}
