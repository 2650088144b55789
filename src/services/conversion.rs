use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::state::SharedState;

/// Convert points into action points for every user, once per configured interval.
///
/// Runs until the surrounding task is dropped. Returns immediately when the
/// rate is zero.
pub async fn run(state: SharedState) {
    let policy = state.conversion();
    if policy.points_per_action_point == 0 {
        info!("point conversion disabled");
        return;
    }

    let mut ticker = interval_at(Instant::now() + policy.interval, policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        every_secs = policy.interval.as_secs(),
        rate = policy.points_per_action_point,
        "point conversion clock started"
    );

    loop {
        ticker.tick().await;
        let report = state.ledger().convert(policy.points_per_action_point);
        if report.minted > 0 {
            info!(
                users = report.users,
                minted = report.minted,
                "converted points into action points"
            );
        } else {
            debug!("conversion tick; nothing to convert");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::{config::ConversionPolicy, dao::models::ScoreState, state::AppState};

    #[tokio::test(start_paused = true)]
    async fn converts_once_per_interval_keeping_remainder() {
        let state = AppState::new(ConversionPolicy {
            interval: Duration::from_secs(60),
            points_per_action_point: 10,
        });
        let ann = state.ledger().register("ann".into()).await;
        state.ledger().add_points(ann.id, 27).unwrap();
        let clock = tokio::spawn(run(state.clone()));

        sleep(Duration::from_secs(59)).await;
        assert_eq!(state.ledger().score(ann.id).unwrap(), ScoreState::new(27, 0));

        sleep(Duration::from_secs(2)).await;
        assert_eq!(state.ledger().score(ann.id).unwrap(), ScoreState::new(7, 2));

        state.ledger().add_points(ann.id, 5).unwrap();
        sleep(Duration::from_secs(60)).await;
        assert_eq!(state.ledger().score(ann.id).unwrap(), ScoreState::new(2, 3));
        clock.abort();
    }

    #[tokio::test]
    async fn zero_rate_returns_immediately() {
        let state = AppState::new(ConversionPolicy {
            interval: Duration::from_secs(1),
            points_per_action_point: 0,
        });
        run(state).await;
    }
}
