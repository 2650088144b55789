pub mod countdown;
pub mod score;
pub mod session;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    config::ConversionPolicy,
    dao::{ledger::memory::MemoryLedger, models::UserId},
};

pub type SharedState = Arc<AppState>;

/// Opaque per-client session key carried in the `sid` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(pub Uuid);

/// Central state of the reference ledger server.
pub struct AppState {
    ledger: MemoryLedger,
    sessions: DashMap<SessionKey, UserId>,
    conversion: ConversionPolicy,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(conversion: ConversionPolicy) -> SharedState {
        Self::with_ledger(MemoryLedger::new(), conversion)
    }

    /// Serve an existing ledger.
    pub fn with_ledger(ledger: MemoryLedger, conversion: ConversionPolicy) -> SharedState {
        Arc::new(Self {
            ledger,
            sessions: DashMap::new(),
            conversion,
        })
    }

    /// Registry and balances.
    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn conversion(&self) -> ConversionPolicy {
        self.conversion
    }

    /// User currently selected by the client holding `key`.
    pub fn session_user(&self, key: SessionKey) -> Option<UserId> {
        self.sessions.get(&key).map(|entry| *entry)
    }

    /// Point the client's session at `user_id`.
    pub fn bind_session(&self, key: SessionKey, user_id: UserId) {
        self.sessions.insert(key, user_id);
    }
}
