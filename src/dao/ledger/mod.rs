#[cfg(feature = "http-ledger")]
pub mod http;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::dao::{
    models::{ScoreState, User, UserId},
    storage::StorageResult,
};

/// Registry of players, in creation order.
pub trait UserRegistry: Send + Sync {
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<User>>>;
    fn create_user(&self, username: String) -> BoxFuture<'static, StorageResult<User>>;
}

/// Persists which user is current for this client.
pub trait SessionStore: Send + Sync {
    fn current_user(&self) -> BoxFuture<'static, StorageResult<Option<User>>>;
    /// Point the session at `user_id`. Unknown ids fail with [`StorageError::NotFound`].
    ///
    /// [`StorageError::NotFound`]: crate::dao::storage::StorageError::NotFound
    fn set_current_user(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<User>>;
}

/// Authoritative store of points and action points.
pub trait ScoreLedger: Send + Sync {
    fn get_score(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<ScoreState>>;
    /// Add `increment` points and return the totals after any server-side adjustment.
    fn increment_score(
        &self,
        user_id: UserId,
        increment: u64,
    ) -> BoxFuture<'static, StorageResult<ScoreState>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// The three collaborators the scoring core talks to.
#[derive(Clone)]
pub struct Backend {
    pub registry: Arc<dyn UserRegistry>,
    pub sessions: Arc<dyn SessionStore>,
    pub ledger: Arc<dyn ScoreLedger>,
}

impl Backend {
    /// Use one value for every collaborator.
    pub fn from_shared<T>(backend: Arc<T>) -> Self
    where
        T: UserRegistry + SessionStore + ScoreLedger + 'static,
    {
        Self {
            registry: backend.clone(),
            sessions: backend.clone(),
            ledger: backend,
        }
    }
}
