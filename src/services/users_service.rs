use tracing::info;
use validator::Validate;

use crate::{
    dao::models::User,
    dto::users::{CreateUserRequest, UsersResponse},
    error::ServiceError,
    state::SharedState,
};

/// Registry listing in creation order.
pub async fn list_users(state: &SharedState) -> UsersResponse {
    UsersResponse {
        users: state.ledger().users().await,
    }
}

/// Register a user with an empty balance.
pub async fn create_user(
    state: &SharedState,
    request: CreateUserRequest,
) -> Result<User, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let user = state.ledger().register(request.username).await;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}
