//! Client-side scoring core: a local countdown whose expiries score points on
//! the ledger, kept honest by a periodic reconciliation poll.

pub mod countdown;
pub mod dispatcher;
pub mod events;
pub mod periodic;
pub mod poller;
pub mod session;

use std::sync::Arc;

use tokio::{
    sync::{Mutex, broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::warn;

use crate::{
    config::CoreTiming,
    dao::{ledger::Backend, models::ScoreState},
    error::CoreError,
    state::{countdown::CountdownState, score::ScoreCache},
};

use self::{
    countdown::{CountdownEngine, ScoringTrigger},
    dispatcher::ScoringDispatcher,
    events::{CoreEvent, EventHub},
    poller::ReconciliationPoller,
    session::SessionController,
};

const EVENT_CAPACITY: usize = 64;

enum Lifecycle {
    Idle {
        triggers: mpsc::UnboundedReceiver<ScoringTrigger>,
    },
    Running {
        shutdown: watch::Sender<bool>,
        dispatch: JoinHandle<()>,
    },
    Stopped,
}

/// Owns the countdown, dispatcher, session controller and poller of one client.
pub struct ScoringCore {
    backend: Backend,
    scores: ScoreCache,
    session: Arc<SessionController>,
    countdown: CountdownEngine,
    dispatcher: ScoringDispatcher,
    poller: ReconciliationPoller,
    events: Arc<EventHub>,
    lifecycle: Mutex<Lifecycle>,
}

impl ScoringCore {
    /// Wire a stopped core against `backend`.
    pub fn new(backend: Backend, timing: CoreTiming) -> Self {
        let scores = ScoreCache::new();
        let (countdown, triggers) = CountdownEngine::new(timing.period, timing.tick);
        Self {
            session: Arc::new(SessionController::new(&backend, scores.clone())),
            dispatcher: ScoringDispatcher::new(backend.ledger.clone(), scores.clone()),
            poller: ReconciliationPoller::new(
                backend.ledger.clone(),
                scores.clone(),
                timing.poll_interval,
            ),
            countdown,
            scores,
            backend,
            events: Arc::new(EventHub::new(EVENT_CAPACITY)),
            lifecycle: Mutex::new(Lifecycle::Idle { triggers }),
        }
    }

    /// Start the countdown, the trigger dispatch loop and the poller.
    ///
    /// Returns `false` when the core is already running or was shut down.
    pub async fn start(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;
        let triggers = match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle { triggers } => triggers,
            other => {
                *lifecycle = other;
                return false;
            }
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        let dispatch = tokio::spawn(self.dispatcher.clone().run(
            triggers,
            self.session.subscribe(),
            self.events.clone(),
            shutdown_rx,
        ));

        let events = self.events.clone();
        self.poller
            .start(self.session.subscribe(), move |outcome| {
                events.publish(CoreEvent::Reconciled(outcome));
            })
            .await;
        self.countdown.start().await;

        *lifecycle = Lifecycle::Running { shutdown, dispatch };
        true
    }

    /// Stop every timer and discard responses still in flight. Final.
    pub async fn shutdown(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        self.countdown.stop().await;
        self.poller.stop().await;

        if let Lifecycle::Running { shutdown, dispatch } =
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        {
            let _ = shutdown.send(true);
            if let Err(err) = dispatch.await {
                warn!(error = %err, "scoring dispatch loop ended abnormally");
            }
        }
        self.scores.close().await;
    }

    /// Ask the ledger whether it is reachable.
    pub async fn probe(&self) -> Result<(), CoreError> {
        Ok(self.backend.ledger.health_check().await?)
    }

    /// Outcomes of scoring triggers and reconciliation polls.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Cached totals of the current user.
    pub fn scores(&self) -> watch::Receiver<Option<ScoreState>> {
        self.scores.subscribe()
    }

    pub fn countdown(&self) -> watch::Receiver<CountdownState> {
        self.countdown.subscribe()
    }

    /// Stop the countdown while reconciliation keeps running.
    ///
    /// Returns `false` unless the core is running with the countdown ticking.
    pub async fn pause_countdown(&self) -> bool {
        let lifecycle = self.lifecycle.lock().await;
        match *lifecycle {
            Lifecycle::Running { .. } => self.countdown.stop().await,
            _ => false,
        }
    }

    /// Resume a paused countdown from its remaining value. Refused once shut down.
    pub async fn resume_countdown(&self) -> bool {
        let lifecycle = self.lifecycle.lock().await;
        match *lifecycle {
            Lifecycle::Running { .. } => self.countdown.start().await,
            _ => false,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }
}
