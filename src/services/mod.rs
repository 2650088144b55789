/// Periodic conversion of points into action points.
pub mod conversion;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Score reads and increments.
pub mod points_service;
/// Per-client session selection.
pub mod session_service;
/// User registry operations.
pub mod users_service;
