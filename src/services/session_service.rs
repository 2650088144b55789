use tracing::debug;
use validator::Validate;

use crate::{
    dao::models::User,
    dto::session::SelectUserRequest,
    error::ServiceError,
    state::{SessionKey, SharedState},
};

/// User the client holding `key` last selected, if it is still registered.
pub async fn current_user(state: &SharedState, key: SessionKey) -> Option<User> {
    let user_id = state.session_user(key)?;
    state.ledger().find_user(user_id).await
}

/// Point the client's session at a registered user.
pub async fn select_user(
    state: &SharedState,
    key: SessionKey,
    request: SelectUserRequest,
) -> Result<User, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let user = state
        .ledger()
        .find_user(request.user_id)
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("user `{}`", request.user_id)))?;

    state.bind_session(key, user.id);
    debug!(session = %key.0, user_id = user.id, "session switched");
    Ok(user)
}
