//! Scriptable collaborators for unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use futures::future::BoxFuture;
use tokio::sync::{Notify, oneshot};

use crate::dao::{
    ledger::{
        Backend, ScoreLedger, SessionStore, UserRegistry,
        memory::{MemoryLedger, MemorySessionStore},
    },
    models::{ScoreState, User, UserId},
    storage::{StorageError, StorageResult},
};

/// In-memory backend that counts requests and can fail or stall on demand.
#[derive(Clone)]
pub(crate) struct ScriptedBackend {
    inner: Arc<Inner>,
}

struct Inner {
    ledger: MemoryLedger,
    sessions: MemorySessionStore,
    calls: AtomicUsize,
    fail_registry: AtomicBool,
    fail_scores: AtomicBool,
    held_increment: Mutex<Option<oneshot::Receiver<()>>>,
    increment_held: Notify,
}

fn offline(what: &str) -> StorageError {
    StorageError::unavailable(
        format!("{what} offline"),
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "scripted failure"),
    )
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        let ledger = MemoryLedger::new();
        Self {
            inner: Arc::new(Inner {
                sessions: MemorySessionStore::new(ledger.clone()),
                ledger,
                calls: AtomicUsize::new(0),
                fail_registry: AtomicBool::new(false),
                fail_scores: AtomicBool::new(false),
                held_increment: Mutex::new(None),
                increment_held: Notify::new(),
            }),
        }
    }

    pub(crate) fn backend(&self) -> Backend {
        Backend::from_shared(Arc::new(self.clone()))
    }

    pub(crate) fn ledger_handle(&self) -> Arc<dyn ScoreLedger> {
        Arc::new(self.clone())
    }

    /// Direct access to the data, bypassing request counting.
    pub(crate) fn ledger(&self) -> &MemoryLedger {
        &self.inner.ledger
    }

    pub(crate) async fn seed_user(&self, username: &str) -> User {
        self.inner.ledger.register(username.to_string()).await
    }

    /// Requests received through the collaborator traits.
    pub(crate) fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_registry(&self, fail: bool) {
        self.inner.fail_registry.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_scores(&self, fail: bool) {
        self.inner.fail_scores.store(fail, Ordering::SeqCst);
    }

    /// The next increment is applied on the ledger but its response waits for the returned sender.
    pub(crate) fn hold_next_increment(&self) -> oneshot::Sender<()> {
        let (release, held) = oneshot::channel();
        *self.inner.held_increment.lock().unwrap() = Some(held);
        release
    }

    /// Resolves once a held increment reached the ledger.
    pub(crate) async fn wait_for_held_increment(&self) {
        self.inner.increment_held.notified().await;
    }

    fn record(&self) {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl UserRegistry for ScriptedBackend {
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<User>>> {
        self.record();
        let backend = self.clone();
        Box::pin(async move {
            if backend.inner.fail_registry.load(Ordering::SeqCst) {
                return Err(offline("registry"));
            }
            backend.inner.ledger.list_users().await
        })
    }

    fn create_user(&self, username: String) -> BoxFuture<'static, StorageResult<User>> {
        self.record();
        let backend = self.clone();
        Box::pin(async move {
            if backend.inner.fail_registry.load(Ordering::SeqCst) {
                return Err(offline("registry"));
            }
            backend.inner.ledger.create_user(username).await
        })
    }
}

impl SessionStore for ScriptedBackend {
    fn current_user(&self) -> BoxFuture<'static, StorageResult<Option<User>>> {
        self.record();
        self.inner.sessions.current_user()
    }

    fn set_current_user(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<User>> {
        self.record();
        self.inner.sessions.set_current_user(user_id)
    }
}

impl ScoreLedger for ScriptedBackend {
    fn get_score(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<ScoreState>> {
        self.record();
        let backend = self.clone();
        Box::pin(async move {
            if backend.inner.fail_scores.load(Ordering::SeqCst) {
                return Err(offline("ledger"));
            }
            backend.inner.ledger.score(user_id)
        })
    }

    fn increment_score(
        &self,
        user_id: UserId,
        increment: u64,
    ) -> BoxFuture<'static, StorageResult<ScoreState>> {
        self.record();
        let backend = self.clone();
        let held = self.inner.held_increment.lock().unwrap().take();
        Box::pin(async move {
            if backend.inner.fail_scores.load(Ordering::SeqCst) {
                return Err(offline("ledger"));
            }
            let result = backend.inner.ledger.add_points(user_id, increment);
            if let Some(held) = held {
                backend.inner.increment_held.notify_one();
                let _ = held.await;
            }
            result
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.record();
        let backend = self.clone();
        Box::pin(async move {
            if backend.inner.fail_scores.load(Ordering::SeqCst) {
                return Err(offline("ledger"));
            }
            Ok(())
        })
    }
}
