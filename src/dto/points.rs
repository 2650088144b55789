use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::UserId;

/// Request adding points to a user's balance.
///
/// Without `user_id` the session's current user is credited.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct IncrementRequest {
    #[validate(range(min = 1))]
    pub increment: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// Optional target of a score read; defaults to the session's current user.
#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
pub struct PointsQuery {
    pub user_id: Option<UserId>,
}
