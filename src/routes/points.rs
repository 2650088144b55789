use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dao::models::ScoreState,
    dto::points::{IncrementRequest, PointsQuery},
    error::AppError,
    services::points_service,
    state::{SessionKey, SharedState},
};

/// Score ledger endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/points", get(get_points).post(increment_points))
}

#[utoipa::path(
    get,
    path = "/api/points",
    tag = "points",
    params(PointsQuery),
    responses(
        (status = 200, description = "Current totals", body = ScoreState),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "No user given and none selected")
    )
)]
/// Return the totals of the given user, or of the session's user.
pub async fn get_points(
    State(state): State<SharedState>,
    Extension(key): Extension<SessionKey>,
    Query(query): Query<PointsQuery>,
) -> Result<Json<ScoreState>, AppError> {
    Ok(Json(points_service::get_points(&state, key, query)?))
}

#[utoipa::path(
    post,
    path = "/api/points",
    tag = "points",
    request_body = IncrementRequest,
    responses(
        (status = 200, description = "Totals after the increment", body = ScoreState),
        (status = 400, description = "Increment below 1"),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "No user given and none selected")
    )
)]
/// Add points to the given user, or to the session's user.
pub async fn increment_points(
    State(state): State<SharedState>,
    Extension(key): Extension<SessionKey>,
    Json(payload): Json<IncrementRequest>,
) -> Result<Json<ScoreState>, AppError> {
    Ok(Json(points_service::increment_points(&state, key, payload)?))
}
