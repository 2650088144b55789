use std::{future::Future, time::Duration};

use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// A cancelable task that runs a step once per interval.
///
/// At most one ticking sequence exists at a time. Once [`PeriodicTask::stop`]
/// returns, the step will not run again and any step in progress was dropped.
pub struct PeriodicTask {
    every: Duration,
    missed: MissedTickBehavior,
    slot: Mutex<Option<Running>>,
}

impl PeriodicTask {
    /// Run every `every`; the first step happens one interval after start.
    ///
    /// Intervals shorter than a millisecond are raised to one.
    pub fn new(every: Duration) -> Self {
        Self {
            every: every.max(MIN_INTERVAL),
            missed: MissedTickBehavior::Burst,
            slot: Mutex::new(None),
        }
    }

    /// What to do with ticks that could not run on time.
    pub fn with_missed_tick_behavior(mut self, missed: MissedTickBehavior) -> Self {
        self.missed = missed;
        self
    }

    /// Spawn the ticking loop unless one is already running. Returns whether a loop was spawned.
    pub async fn start<F, Fut>(&self, mut step: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut slot = self.slot.lock().await;
        if slot
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
        {
            return false;
        }

        let (shutdown, mut stop_rx) = watch::channel(false);
        let every = self.every;
        let missed = self.missed;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(missed);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = step() => {}
                }
            }
        });

        *slot = Some(Running { shutdown, handle });
        true
    }

    /// Cancel the loop and wait until it has exited. Returns whether a loop was running.
    pub async fn stop(&self) -> bool {
        let running = self.slot.lock().await.take();
        let Some(running) = running else {
            return false;
        };

        let _ = running.shutdown.send(true);
        let _ = running.handle.await;
        true
    }

    pub async fn is_running(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }
}
