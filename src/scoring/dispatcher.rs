use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{
    dao::{ledger::ScoreLedger, models::UserId},
    scoring::{
        countdown::ScoringTrigger,
        events::{CoreEvent, EventHub, SyncOutcome},
    },
    state::{score::ScoreCache, session::SessionMachine},
};

/// Points awarded per countdown expiry.
pub const SCORE_INCREMENT: u64 = 1;

/// Turns countdown expiries into ledger increments.
#[derive(Clone)]
pub struct ScoringDispatcher {
    ledger: Arc<dyn ScoreLedger>,
    scores: ScoreCache,
}

impl ScoringDispatcher {
    pub fn new(ledger: Arc<dyn ScoreLedger>, scores: ScoreCache) -> Self {
        Self { ledger, scores }
    }

    /// Send one increment for `user` and apply the ledger's totals verbatim.
    ///
    /// Failures leave the cache alone and are not retried: an increment is not
    /// idempotent, and the next reconciliation poll restores the real totals.
    pub async fn on_scoring_trigger(&self, user: Option<UserId>) -> SyncOutcome {
        let Some(user_id) = user else {
            return SyncOutcome::Idle;
        };

        let ticket = self.scores.issue(user_id).await;
        match self.ledger.increment_score(user_id, SCORE_INCREMENT).await {
            Ok(score) => SyncOutcome::from_apply(self.scores.apply(ticket, score).await),
            Err(err) => SyncOutcome::failed(err),
        }
    }

    /// Consume triggers until shutdown. The target user is read from `session`
    /// when the trigger arrives, and each increment runs on its own task so a
    /// slow ledger never holds back the next trigger.
    pub(crate) async fn run(
        self,
        mut triggers: mpsc::UnboundedReceiver<ScoringTrigger>,
        session: watch::Receiver<SessionMachine>,
        events: Arc<EventHub>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            let trigger = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                trigger = triggers.recv() => match trigger {
                    Some(trigger) => trigger,
                    None => break,
                },
            };

            let user = session.borrow().current_user_id();
            let dispatcher = self.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let outcome = dispatcher.on_scoring_trigger(user).await;
                events.publish(CoreEvent::Scored {
                    round: trigger.round,
                    outcome,
                });
            });
        }
    }
}
