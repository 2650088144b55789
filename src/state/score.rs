use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, watch};

use crate::dao::models::{ScoreState, UserId};

/// Tag attached to a score request when it is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub user_id: UserId,
    pub seq: u64,
}

/// Why a ledger response was not applied to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StaleResponse {
    /// The core was torn down before the response arrived.
    #[error("score cache closed")]
    Closed,
    /// The session moved to another user, or re-selected this one, after the request was issued.
    #[error("session target changed (ticket for user {ticket_user})")]
    TargetChanged { ticket_user: UserId },
    /// A response to a more recently issued request was already applied.
    #[error("superseded by request #{applied}")]
    Superseded { applied: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Target {
    user_id: UserId,
    activated_at: u64,
}

/// Cached mirror of the ledger for the current user.
///
/// Every write goes through [`ScoreBoard::apply`], which accepts a response
/// only if its ticket targets the active user, was issued after that user was
/// activated, and is newer than the last applied ticket.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    last_seq: u64,
    applied_seq: u64,
    target: Option<Target>,
    score: Option<ScoreState>,
    closed: bool,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `user_id` the target and drop the cached totals of the previous one.
    pub fn activate(&mut self, user_id: UserId) {
        self.last_seq += 1;
        self.target = Some(Target {
            user_id,
            activated_at: self.last_seq,
        });
        self.applied_seq = self.last_seq;
        self.score = None;
    }

    /// Tag a request about to be sent for `user_id`.
    pub fn issue(&mut self, user_id: UserId) -> Ticket {
        self.last_seq += 1;
        Ticket {
            user_id,
            seq: self.last_seq,
        }
    }

    /// Apply a ledger response if its ticket is still the most recent one for the active user.
    pub fn apply(&mut self, ticket: Ticket, score: ScoreState) -> Result<ScoreState, StaleResponse> {
        if self.closed {
            return Err(StaleResponse::Closed);
        }

        let Some(target) = self.target else {
            return Err(StaleResponse::TargetChanged {
                ticket_user: ticket.user_id,
            });
        };
        if target.user_id != ticket.user_id || ticket.seq <= target.activated_at {
            return Err(StaleResponse::TargetChanged {
                ticket_user: ticket.user_id,
            });
        }

        if ticket.seq <= self.applied_seq {
            return Err(StaleResponse::Superseded {
                applied: self.applied_seq,
            });
        }

        self.applied_seq = ticket.seq;
        self.score = Some(score);
        Ok(score)
    }

    /// Stop accepting responses.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Last applied totals, or `None` until the active user's first response lands.
    pub fn score(&self) -> Option<ScoreState> {
        self.score
    }
}

/// Shared handle over a [`ScoreBoard`] that publishes every accepted write.
#[derive(Clone)]
pub struct ScoreCache {
    board: Arc<Mutex<ScoreBoard>>,
    published: Arc<watch::Sender<Option<ScoreState>>>,
}

impl Default for ScoreCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCache {
    pub fn new() -> Self {
        let (published, _rx) = watch::channel(None);
        Self {
            board: Arc::new(Mutex::new(ScoreBoard::new())),
            published: Arc::new(published),
        }
    }

    pub async fn activate(&self, user_id: UserId) {
        let mut board = self.board.lock().await;
        board.activate(user_id);
        self.published.send_replace(None);
    }

    pub async fn issue(&self, user_id: UserId) -> Ticket {
        self.board.lock().await.issue(user_id)
    }

    /// Gatekeeper for all cache writes; see [`ScoreBoard::apply`].
    pub async fn apply(&self, ticket: Ticket, score: ScoreState) -> Result<ScoreState, StaleResponse> {
        let mut board = self.board.lock().await;
        let applied = board.apply(ticket, score)?;
        self.published.send_replace(Some(applied));
        Ok(applied)
    }

    pub async fn close(&self) {
        self.board.lock().await.close();
    }

    pub async fn current(&self) -> Option<ScoreState> {
        self.board.lock().await.score()
    }

    /// Observe accepted writes; `None` while waiting for the active user's first response.
    pub fn subscribe(&self) -> watch::Receiver<Option<ScoreState>> {
        self.published.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(points: u64) -> ScoreState {
        ScoreState::new(points, 0)
    }

    #[test]
    fn nothing_applies_without_target() {
        let mut board = ScoreBoard::new();
        let ticket = board.issue(1);
        assert_eq!(
            board.apply(ticket, score(1)),
            Err(StaleResponse::TargetChanged { ticket_user: 1 })
        );
        assert_eq!(board.score(), None);
    }

    #[test]
    fn newest_received_response_wins() {
        let mut board = ScoreBoard::new();
        board.activate(1);
        let increment = board.issue(1);
        let poll = board.issue(1);

        assert_eq!(board.apply(poll, score(4)), Ok(score(4)));
        assert_eq!(
            board.apply(increment, score(5)),
            Err(StaleResponse::Superseded { applied: poll.seq })
        );
        assert_eq!(board.score(), Some(score(4)));
    }

    #[test]
    fn older_response_still_applies_when_newer_is_outstanding() {
        let mut board = ScoreBoard::new();
        board.activate(1);
        let first = board.issue(1);
        let _second = board.issue(1);

        assert_eq!(board.apply(first, score(2)), Ok(score(2)));
    }

    #[test]
    fn switching_user_discards_previous_user_responses() {
        let mut board = ScoreBoard::new();
        board.activate(1);
        let for_a = board.issue(1);

        board.activate(2);
        let for_b = board.issue(2);
        assert_eq!(board.apply(for_b, score(10)), Ok(score(10)));

        assert_eq!(
            board.apply(for_a, score(99)),
            Err(StaleResponse::TargetChanged { ticket_user: 1 })
        );
        assert_eq!(board.score(), Some(score(10)));
    }

    #[test]
    fn reselecting_a_user_discards_requests_from_before() {
        let mut board = ScoreBoard::new();
        board.activate(1);
        let before = board.issue(1);
        board.activate(2);
        board.activate(1);

        assert!(matches!(
            board.apply(before, score(3)),
            Err(StaleResponse::TargetChanged { .. })
        ));
        assert_eq!(board.score(), None);
    }

    #[test]
    fn closed_board_rejects_everything() {
        let mut board = ScoreBoard::new();
        board.activate(1);
        let ticket = board.issue(1);
        board.close();

        assert_eq!(board.apply(ticket, score(1)), Err(StaleResponse::Closed));
    }

    #[tokio::test]
    async fn cache_publishes_accepted_writes_and_resets_on_activate() {
        let cache = ScoreCache::new();
        let rx = cache.subscribe();

        cache.activate(1).await;
        let ticket = cache.issue(1).await;
        cache.apply(ticket, score(6)).await.unwrap();
        assert_eq!(*rx.borrow(), Some(score(6)));

        cache.activate(2).await;
        assert_eq!(*rx.borrow(), None);
        assert_eq!(cache.current().await, None);
    }
}
