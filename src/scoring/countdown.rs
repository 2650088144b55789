//! Local repeating countdown that emits one scoring trigger per expired period.

use std::{future::ready, sync::Arc, time::Duration};

use tokio::sync::{mpsc, watch};

use crate::{
    scoring::periodic::PeriodicTask,
    state::countdown::{CountdownState, Tick},
};

/// Emitted exactly once per expired period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringTrigger {
    /// 1-based index of the period that just expired.
    pub round: u64,
}

/// Drives a [`CountdownState`] from a [`PeriodicTask`].
pub struct CountdownEngine {
    state: Arc<watch::Sender<CountdownState>>,
    triggers: mpsc::UnboundedSender<ScoringTrigger>,
    task: PeriodicTask,
}

impl CountdownEngine {
    /// Build a stopped engine counting `period` ticks of length `tick`.
    ///
    /// Triggers are delivered on the returned receiver; sending never waits on it.
    pub fn new(period: u32, tick: Duration) -> (Self, mpsc::UnboundedReceiver<ScoringTrigger>) {
        let (state, _rx) = watch::channel(CountdownState::new(period));
        let (triggers, receiver) = mpsc::unbounded_channel();
        let engine = Self {
            state: Arc::new(state),
            triggers,
            task: PeriodicTask::new(tick),
        };
        (engine, receiver)
    }

    /// Begin ticking. Calling it while already running is a no-op returning `false`.
    pub async fn start(&self) -> bool {
        let state = self.state.clone();
        let triggers = self.triggers.clone();
        self.task
            .start(move || {
                let mut expired = None;
                state.send_modify(|countdown| {
                    if countdown.tick() == Tick::Expired {
                        expired = Some(countdown.rounds());
                    }
                });
                if let Some(round) = expired {
                    // The receiver may be gone during teardown.
                    let _ = triggers.send(ScoringTrigger { round });
                }
                ready(())
            })
            .await
    }

    /// Cancel pending ticks; returns once no further tick can fire.
    pub async fn stop(&self) -> bool {
        self.task.stop().await
    }

    pub async fn is_running(&self) -> bool {
        self.task.is_running().await
    }

    /// Current countdown value.
    pub fn snapshot(&self) -> CountdownState {
        *self.state.borrow()
    }

    /// Observe every tick.
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.state.subscribe()
    }
}
