use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dao::models::User,
    dto::users::{CreateUserRequest, UsersResponse},
    error::AppError,
    services::users_service,
    state::SharedState,
};

/// User registry endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/users", get(list_users).post(create_user))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses((status = 200, description = "Registered users in creation order", body = UsersResponse))
)]
/// List every registered user.
pub async fn list_users(State(state): State<SharedState>) -> Json<UsersResponse> {
    Json(users_service::list_users(&state).await)
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User registered", body = User),
        (status = 400, description = "Username too short")
    )
)]
/// Register a new user with an empty balance.
pub async fn create_user(
    State(state): State<SharedState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    Ok(Json(users_service::create_user(&state, payload).await?))
}
