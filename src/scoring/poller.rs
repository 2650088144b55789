use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, time::MissedTickBehavior};

use crate::{
    dao::{ledger::ScoreLedger, models::UserId},
    scoring::{events::SyncOutcome, periodic::PeriodicTask},
    state::{score::ScoreCache, session::SessionMachine},
};

/// Re-reads the ledger on its own cadence, independent of scoring events, so
/// that server-side conversions and lost increments show up in the cache.
pub struct ReconciliationPoller {
    ledger: Arc<dyn ScoreLedger>,
    scores: ScoreCache,
    task: PeriodicTask,
}

impl ReconciliationPoller {
    pub fn new(ledger: Arc<dyn ScoreLedger>, scores: ScoreCache, every: Duration) -> Self {
        Self {
            ledger,
            scores,
            task: PeriodicTask::new(every).with_missed_tick_behavior(MissedTickBehavior::Skip),
        }
    }

    /// Fetch and apply the totals of `user` once. Skipped without a user.
    pub async fn poll_once(&self, user: Option<UserId>) -> SyncOutcome {
        reconcile(self.ledger.as_ref(), &self.scores, user).await
    }

    /// Poll the user current in `session` every interval and hand each outcome to `report`.
    pub async fn start<R>(&self, session: watch::Receiver<SessionMachine>, report: R) -> bool
    where
        R: Fn(SyncOutcome) + Send + Sync + 'static,
    {
        let ledger = self.ledger.clone();
        let scores = self.scores.clone();
        let report = Arc::new(report);
        self.task
            .start(move || {
                let ledger = ledger.clone();
                let scores = scores.clone();
                let report = report.clone();
                let user = session.borrow().current_user_id();
                async move { report(reconcile(ledger.as_ref(), &scores, user).await) }
            })
            .await
    }

    pub async fn stop(&self) -> bool {
        self.task.stop().await
    }

    pub async fn is_running(&self) -> bool {
        self.task.is_running().await
    }
}

async fn reconcile(ledger: &dyn ScoreLedger, scores: &ScoreCache, user: Option<UserId>) -> SyncOutcome {
    let Some(user_id) = user else {
        return SyncOutcome::Idle;
    };

    let ticket = scores.issue(user_id).await;
    match ledger.get_score(user_id).await {
        Ok(score) => SyncOutcome::from_apply(scores.apply(ticket, score).await),
        Err(err) => SyncOutcome::failed(err),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::time::sleep;

    use super::*;
    use crate::{
        dao::{ledger::testing::ScriptedBackend, models::ScoreState},
        state::session::SessionEvent,
    };

    const EVERY: Duration = Duration::from_secs(5);

    fn recorder() -> (Arc<Mutex<Vec<SyncOutcome>>>, impl Fn(SyncOutcome) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |outcome| sink.lock().unwrap().push(outcome))
    }

    #[tokio::test(start_paused = true)]
    async fn picks_up_server_side_conversion_without_scoring() {
        let backend = ScriptedBackend::new();
        let ann = backend.seed_user("ann").await;
        backend.ledger().add_points(ann.id, 25).unwrap();

        let scores = ScoreCache::new();
        scores.activate(ann.id).await;
        let (session, session_rx) = watch::channel(SessionMachine::new());
        session.send_modify(|machine| {
            machine.apply(SessionEvent::Selected(ann.clone()));
        });

        let poller = ReconciliationPoller::new(backend.ledger_handle(), scores.clone(), EVERY);
        let (seen, report) = recorder();
        assert!(poller.start(session_rx, report).await);

        sleep(Duration::from_millis(5_500)).await;
        assert_eq!(scores.current().await, Some(ScoreState::new(25, 0)));

        backend.ledger().convert(10);
        sleep(EVERY).await;
        assert_eq!(scores.current().await, Some(ScoreState::new(5, 2)));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_session_issues_no_request() {
        let backend = ScriptedBackend::new();
        let (_session, session_rx) = watch::channel(SessionMachine::new());
        let poller = ReconciliationPoller::new(backend.ledger_handle(), ScoreCache::new(), EVERY);
        let (seen, report) = recorder();
        poller.start(session_rx, report).await;

        sleep(Duration::from_secs(21)).await;

        assert_eq!(backend.calls(), 0);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|outcome| matches!(outcome, SyncOutcome::Idle)));
    }

    #[tokio::test]
    async fn failed_poll_keeps_previous_totals() {
        let backend = ScriptedBackend::new();
        let ann = backend.seed_user("ann").await;
        backend.ledger().add_points(ann.id, 3).unwrap();
        let scores = ScoreCache::new();
        scores.activate(ann.id).await;
        let poller = ReconciliationPoller::new(backend.ledger_handle(), scores.clone(), EVERY);

        poller.poll_once(Some(ann.id)).await;
        backend.fail_scores(true);
        backend.ledger().add_points(ann.id, 3).unwrap();
        let outcome = poller.poll_once(Some(ann.id)).await;

        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert_eq!(scores.current().await, Some(ScoreState::new(3, 0)));

        backend.fail_scores(false);
        let outcome = poller.poll_once(Some(ann.id)).await;
        assert_eq!(outcome.applied(), Some(ScoreState::new(6, 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_poller_stays_quiet() {
        let backend = ScriptedBackend::new();
        let ann = backend.seed_user("ann").await;
        let (session, session_rx) = watch::channel(SessionMachine::new());
        session.send_modify(|machine| {
            machine.apply(SessionEvent::Selected(ann));
        });
        let poller = ReconciliationPoller::new(backend.ledger_handle(), ScoreCache::new(), EVERY);
        poller.start(session_rx, |_| {}).await;

        sleep(Duration::from_millis(5_500)).await;
        assert!(poller.stop().await);
        let calls = backend.calls();
        sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls(), calls);
    }
}
