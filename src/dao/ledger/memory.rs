//! In-process collaborators backing the reference server and the test suite.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::dao::{
    ledger::{ScoreLedger, SessionStore, UserRegistry},
    models::{ScoreState, User, UserId},
    storage::{StorageError, StorageResult},
};

/// Registry and ledger kept in memory. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    users: RwLock<IndexMap<UserId, User>>,
    last_id: AtomicU64,
    scores: DashMap<UserId, ScoreState>,
}

/// Summary of one conversion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Users whose balance changed.
    pub users: usize,
    /// Action points minted across all users.
    pub minted: u64,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a user up by id.
    pub async fn find_user(&self, user_id: UserId) -> Option<User> {
        self.inner.users.read().await.get(&user_id).cloned()
    }

    /// Register a user and open an empty balance for them.
    pub async fn register(&self, username: String) -> User {
        let mut users = self.inner.users.write().await;
        let id = self.inner.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User { id, username };
        users.insert(id, user.clone());
        self.inner.scores.insert(id, ScoreState::default());
        user
    }

    /// Snapshot the registry in creation order.
    pub async fn users(&self) -> Vec<User> {
        self.inner.users.read().await.values().cloned().collect()
    }

    /// Current totals of a user.
    pub fn score(&self, user_id: UserId) -> StorageResult<ScoreState> {
        self.inner
            .scores
            .get(&user_id)
            .map(|entry| *entry)
            .ok_or_else(|| unknown_user(user_id))
    }

    /// Add points to a user's balance, returning the new totals.
    pub fn add_points(&self, user_id: UserId, increment: u64) -> StorageResult<ScoreState> {
        let mut entry = self
            .inner
            .scores
            .get_mut(&user_id)
            .ok_or_else(|| unknown_user(user_id))?;
        entry.points = entry.points.saturating_add(increment);
        Ok(*entry)
    }

    /// Move every full block of `rate` points into one action point, for every user.
    ///
    /// A `rate` of zero disables conversion.
    pub fn convert(&self, rate: u64) -> ConversionReport {
        let mut report = ConversionReport::default();
        if rate == 0 {
            return report;
        }

        for mut entry in self.inner.scores.iter_mut() {
            let minted = entry.points / rate;
            if minted == 0 {
                continue;
            }
            entry.points -= minted * rate;
            entry.action_points = entry.action_points.saturating_add(minted);
            report.users += 1;
            report.minted += minted;
        }

        report
    }
}

fn unknown_user(user_id: UserId) -> StorageError {
    StorageError::NotFound(format!("user `{user_id}`"))
}

impl UserRegistry for MemoryLedger {
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<User>>> {
        let ledger = self.clone();
        Box::pin(async move { Ok(ledger.users().await) })
    }

    fn create_user(&self, username: String) -> BoxFuture<'static, StorageResult<User>> {
        let ledger = self.clone();
        Box::pin(async move { Ok(ledger.register(username).await) })
    }
}

impl ScoreLedger for MemoryLedger {
    fn get_score(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<ScoreState>> {
        let ledger = self.clone();
        Box::pin(async move { ledger.score(user_id) })
    }

    fn increment_score(
        &self,
        user_id: UserId,
        increment: u64,
    ) -> BoxFuture<'static, StorageResult<ScoreState>> {
        let ledger = self.clone();
        Box::pin(async move { ledger.add_points(user_id, increment) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Single-slot session pointer validated against a [`MemoryLedger`].
#[derive(Clone)]
pub struct MemorySessionStore {
    ledger: MemoryLedger,
    current: Arc<RwLock<Option<UserId>>>,
}

impl MemorySessionStore {
    /// Create an unresolved session over `ledger`.
    pub fn new(ledger: MemoryLedger) -> Self {
        Self {
            ledger,
            current: Arc::new(RwLock::new(None)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn current_user(&self) -> BoxFuture<'static, StorageResult<Option<User>>> {
        let store = self.clone();
        Box::pin(async move {
            let current = *store.current.read().await;
            match current {
                Some(id) => Ok(store.ledger.find_user(id).await),
                None => Ok(None),
            }
        })
    }

    fn set_current_user(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<User>> {
        let store = self.clone();
        Box::pin(async move {
            let user = store
                .ledger
                .find_user(user_id)
                .await
                .ok_or_else(|| unknown_user(user_id))?;
            *store.current.write().await = Some(user.id);
            Ok(user)
        })
    }
}
