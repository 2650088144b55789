use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier assigned to a user by the registry. Valid ids start at 1.
pub type UserId = u64;

/// A registered player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct User {
    /// Stable identifier assigned by the registry.
    pub id: UserId,
    /// Display name (at least two characters).
    pub username: String,
}

/// Authoritative totals held by the ledger for one user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ScoreState {
    /// Raw points awarded by countdown expiries.
    pub points: u64,
    /// Secondary currency produced by the ledger's conversion clock.
    pub action_points: u64,
}

impl ScoreState {
    /// Build a score from explicit totals.
    pub fn new(points: u64, action_points: u64) -> Self {
        Self {
            points,
            action_points,
        }
    }
}
