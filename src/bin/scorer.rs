//! Headless scorer: runs the scoring core against the ledger server and logs
//! the countdown and the current user's totals.
//!
//! Usage: `seven-seconds-scorer [username]`. With a username the matching user
//! is selected (or registered); without one the stored session is restored.

use std::{env, sync::Arc};

use anyhow::Context;
use seven_seconds::{
    config::AppConfig,
    dao::ledger::{
        Backend,
        http::{HttpLedger, HttpLedgerConfig},
    },
    scoring::{
        ScoringCore,
        events::{CoreEvent, SyncOutcome},
        session::Selection,
    },
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let ledger = HttpLedger::new(HttpLedgerConfig::new(config.api_base.clone()))
        .context("building ledger client")?;
    let core = Arc::new(ScoringCore::new(
        Backend::from_shared(Arc::new(ledger)),
        config.timing,
    ));

    match core.probe().await {
        Ok(()) => info!(api_base = %config.api_base, "ledger reachable"),
        Err(err) => warn!(api_base = %config.api_base, error = %err, "ledger unreachable; continuing"),
    }

    match resolve_user(&core, env::args().nth(1)).await? {
        Some(selection) => log_selection(&selection),
        None => {
            let known: Vec<_> = core
                .session()
                .list_users()
                .await
                .into_iter()
                .map(|user| user.username)
                .collect();
            warn!(
                ?known,
                "no user selected; the countdown runs without scoring"
            );
        }
    }

    let events = tokio::spawn(log_events(core.clone()));
    let countdown = tokio::spawn(log_countdown(core.clone()));
    core.start().await;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl+C")?;
    info!("shutting down scorer");

    core.shutdown().await;
    events.abort();
    countdown.abort();
    Ok(())
}

async fn resolve_user(
    core: &ScoringCore,
    username: Option<String>,
) -> anyhow::Result<Option<Selection>> {
    let session = core.session();
    let Some(username) = username else {
        return session.restore().await.context("restoring session");
    };

    let existing = session
        .try_list_users()
        .await
        .context("listing users")?
        .into_iter()
        .find(|user| user.username == username);

    let selection = match existing {
        Some(user) => session.select_user(user.id).await,
        None => session.create_user(&username).await,
    }
    .with_context(|| format!("switching to `{username}`"))?;
    Ok(Some(selection))
}

fn log_selection(selection: &Selection) {
    match &selection.score {
        SyncOutcome::Applied(score) => info!(
            user = %selection.user.username,
            points = score.points,
            action_points = score.action_points,
            "playing"
        ),
        other => warn!(user = %selection.user.username, outcome = ?other, "playing; totals not loaded yet"),
    }
}

async fn log_events(core: Arc<ScoringCore>) {
    let mut events = core.subscribe();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event log lagging");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event {
            CoreEvent::Scored { round, outcome } => match outcome {
                SyncOutcome::Applied(score) => info!(
                    round,
                    points = score.points,
                    action_points = score.action_points,
                    "scored"
                ),
                SyncOutcome::Idle => debug!(round, "countdown expired with no user"),
                SyncOutcome::Stale(reason) => debug!(round, %reason, "score response discarded"),
                SyncOutcome::Failed(err) => warn!(round, error = %err, "score increment failed"),
            },
            CoreEvent::Reconciled(outcome) => match outcome {
                SyncOutcome::Applied(score) => debug!(
                    points = score.points,
                    action_points = score.action_points,
                    "reconciled"
                ),
                SyncOutcome::Failed(err) => warn!(error = %err, "reconciliation failed"),
                SyncOutcome::Idle | SyncOutcome::Stale(_) => {}
            },
        }
    }
}

async fn log_countdown(core: Arc<ScoringCore>) {
    let mut countdown = core.countdown();
    while countdown.changed().await.is_ok() {
        let state = *countdown.borrow_and_update();
        debug!(remaining = state.remaining(), "tick");
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
