use axum::{Extension, Json, Router, extract::State, routing::get};

use crate::{
    dao::models::User,
    dto::session::SelectUserRequest,
    error::AppError,
    services::session_service,
    state::{SessionKey, SharedState},
};

/// Session endpoints keyed by the `sid` cookie.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/session", get(current_session).post(select_user))
}

#[utoipa::path(
    get,
    path = "/api/session",
    tag = "session",
    responses((status = 200, description = "Current user, or null before any selection", body = User))
)]
/// Return the user this client last selected.
pub async fn current_session(
    State(state): State<SharedState>,
    Extension(key): Extension<SessionKey>,
) -> Json<Option<User>> {
    Json(session_service::current_user(&state, key).await)
}

#[utoipa::path(
    post,
    path = "/api/session",
    tag = "session",
    request_body = SelectUserRequest,
    responses(
        (status = 200, description = "Session switched", body = User),
        (status = 400, description = "Missing user id"),
        (status = 404, description = "Unknown user")
    )
)]
/// Make a registered user current for this client.
pub async fn select_user(
    State(state): State<SharedState>,
    Extension(key): Extension<SessionKey>,
    Json(payload): Json<SelectUserRequest>,
) -> Result<Json<User>, AppError> {
    Ok(Json(session_service::select_user(&state, key, payload).await?))
}
