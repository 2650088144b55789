//! Resolves who the current scorer is and keeps the score cache pointed at them.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use validator::Validate;

use crate::{
    dao::{
        ledger::{Backend, ScoreLedger, SessionStore, UserRegistry},
        models::{User, UserId},
        storage::StorageError,
    },
    dto::users::CreateUserRequest,
    error::CoreError,
    scoring::events::SyncOutcome,
    state::{
        score::ScoreCache,
        session::{SessionEvent, SessionMachine},
    },
};

/// A user that just became current, with the first fetch of their totals.
#[derive(Debug, Clone)]
pub struct Selection {
    pub user: User,
    pub score: SyncOutcome,
}

/// Owns the session and every transition of it.
pub struct SessionController {
    registry: Arc<dyn UserRegistry>,
    store: Arc<dyn SessionStore>,
    ledger: Arc<dyn ScoreLedger>,
    scores: ScoreCache,
    session: watch::Sender<SessionMachine>,
    switch_gate: Mutex<()>,
}

impl SessionController {
    pub fn new(backend: &Backend, scores: ScoreCache) -> Self {
        let (session, _rx) = watch::channel(SessionMachine::new());
        Self {
            registry: backend.registry.clone(),
            store: backend.sessions.clone(),
            ledger: backend.ledger.clone(),
            scores,
            session,
            switch_gate: Mutex::new(()),
        }
    }

    /// Registry listing; any failure yields an empty list.
    pub async fn list_users(&self) -> Vec<User> {
        self.try_list_users().await.unwrap_or_default()
    }

    /// Registry listing with the failure kept for the caller.
    pub async fn try_list_users(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.registry.list_users().await?)
    }

    /// Register `username`, make it current and load its totals.
    ///
    /// Short names are rejected before anything is sent.
    pub async fn create_user(&self, username: &str) -> Result<Selection, CoreError> {
        let request = CreateUserRequest {
            username: username.to_string(),
        };
        request.validate()?;

        let created = self.registry.create_user(request.username).await?;
        self.switch_to(created.id, SessionEvent::Created).await
    }

    /// Make a registered user current and load its totals.
    pub async fn select_user(&self, user_id: UserId) -> Result<Selection, CoreError> {
        if user_id == 0 {
            return Err(CoreError::InvalidTarget("no user id given".into()));
        }
        self.switch_to(user_id, SessionEvent::Selected).await
    }

    /// Adopt whatever user the session store already points at.
    pub async fn restore(&self) -> Result<Option<Selection>, CoreError> {
        let gate = self.switch_gate.lock().await;
        let Some(user) = self.store.current_user().await? else {
            return Ok(None);
        };
        let user_id = self.activate(SessionEvent::Restored(user.clone())).await;
        drop(gate);

        let score = self.refresh(user_id).await;
        Ok(Some(Selection { user, score }))
    }

    async fn switch_to(
        &self,
        user_id: UserId,
        event: fn(User) -> SessionEvent,
    ) -> Result<Selection, CoreError> {
        let gate = self.switch_gate.lock().await;
        let user = self
            .store
            .set_current_user(user_id)
            .await
            .map_err(|err| match err {
                StorageError::NotFound(_) => {
                    CoreError::InvalidTarget(format!("user `{user_id}` is not registered"))
                }
                other => CoreError::Transport(other),
            })?;
        self.activate(event(user.clone())).await;
        drop(gate);

        let score = self.refresh(user.id).await;
        Ok(Selection { user, score })
    }

    /// Point the cache at the new user before publishing the session, so that
    /// requests issued for the previous user can no longer land.
    async fn activate(&self, event: SessionEvent) -> UserId {
        let user_id = event.user().id;
        self.scores.activate(user_id).await;
        self.session.send_modify(|machine| {
            machine.apply(event);
        });
        user_id
    }

    async fn refresh(&self, user_id: UserId) -> SyncOutcome {
        let ticket = self.scores.issue(user_id).await;
        match self.ledger.get_score(user_id).await {
            Ok(score) => SyncOutcome::from_apply(self.scores.apply(ticket, score).await),
            Err(err) => SyncOutcome::failed(err),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.borrow().current_user().cloned()
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.session.borrow().current_user_id()
    }

    /// Observe session transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionMachine> {
        self.session.subscribe()
    }
}
