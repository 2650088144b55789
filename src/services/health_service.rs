use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload while logging the registry size.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let users = state.ledger().users().await.len();
    debug!(users, "health check");
    HealthResponse::ok()
}
