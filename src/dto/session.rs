use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::UserId;

/// Payload switching the session to another registered user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SelectUserRequest {
    #[validate(range(min = 1))]
    pub user_id: UserId,
}
