use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the reference ledger server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::users::list_users,
        crate::routes::users::create_user,
        crate::routes::session::current_session,
        crate::routes::session::select_user,
        crate::routes::points::get_points,
        crate::routes::points::increment_points,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::users::UsersResponse,
            crate::dto::users::CreateUserRequest,
            crate::dto::session::SelectUserRequest,
            crate::dto::points::IncrementRequest,
            crate::dao::models::User,
            crate::dao::models::ScoreState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User registry"),
        (name = "session", description = "Per-client session selection"),
        (name = "points", description = "Score ledger"),
    )
)]
pub struct ApiDoc;
