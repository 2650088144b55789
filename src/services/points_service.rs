//! Score reads and increments. Requests without an explicit `user_id` fall
//! back to the user selected by the calling session.

use validator::Validate;

use crate::{
    dao::models::{ScoreState, UserId},
    dto::points::{IncrementRequest, PointsQuery},
    error::ServiceError,
    state::{SessionKey, SharedState},
};

fn resolve_target(
    state: &SharedState,
    key: SessionKey,
    explicit: Option<UserId>,
) -> Result<UserId, ServiceError> {
    explicit
        .or_else(|| state.session_user(key))
        .ok_or_else(|| ServiceError::InvalidState("no user selected for this session".into()))
}

/// Current totals of the requested or session user.
pub fn get_points(
    state: &SharedState,
    key: SessionKey,
    query: PointsQuery,
) -> Result<ScoreState, ServiceError> {
    let user_id = resolve_target(state, key, query.user_id)?;
    Ok(state.ledger().score(user_id)?)
}

/// Add points and return the totals after the update.
pub fn increment_points(
    state: &SharedState,
    key: SessionKey,
    request: IncrementRequest,
) -> Result<ScoreState, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let user_id = resolve_target(state, key, request.user_id)?;
    Ok(state.ledger().add_points(user_id, request.increment)?)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{config::ConversionPolicy, state::AppState};

    fn increment(increment: u64, user_id: Option<UserId>) -> IncrementRequest {
        IncrementRequest { increment, user_id }
    }

    #[tokio::test]
    async fn falls_back_to_session_user() {
        let state = AppState::new(ConversionPolicy::default());
        let ann = state.ledger().register("ann".into()).await;
        let key = SessionKey(Uuid::new_v4());

        let err = increment_points(&state, key, increment(1, None)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        state.bind_session(key, ann.id);
        increment_points(&state, key, increment(2, None)).unwrap();
        assert_eq!(
            get_points(&state, key, PointsQuery::default()).unwrap(),
            ScoreState::new(2, 0)
        );
    }

    #[tokio::test]
    async fn explicit_user_wins_over_session() {
        let state = AppState::new(ConversionPolicy::default());
        let ann = state.ledger().register("ann".into()).await;
        let bo = state.ledger().register("bo".into()).await;
        let key = SessionKey(Uuid::new_v4());
        state.bind_session(key, ann.id);

        let totals = increment_points(&state, key, increment(3, Some(bo.id))).unwrap();

        assert_eq!(totals, ScoreState::new(3, 0));
        assert_eq!(state.ledger().score(ann.id).unwrap(), ScoreState::default());
    }

    #[test]
    fn zero_increment_and_unknown_user_are_rejected() {
        let state = AppState::new(ConversionPolicy::default());
        let key = SessionKey(Uuid::new_v4());

        assert!(matches!(
            increment_points(&state, key, increment(0, Some(1))),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            increment_points(&state, key, increment(1, Some(9))),
            Err(ServiceError::NotFound(_))
        ));
    }
}
