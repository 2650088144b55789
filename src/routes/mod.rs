use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::state::{SessionKey, SharedState};

pub mod docs;
pub mod health;
pub mod points;
pub mod session;
pub mod users;

const SESSION_COOKIE: &str = "sid";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(users::router())
        .merge(session::router())
        .merge(points::router())
        .layer(middleware::from_fn(session_cookie));

    api_router.merge(docs::router()).with_state(state)
}

/// Attach a [`SessionKey`] to every request, issuing a fresh `sid` cookie when
/// the client did not present a valid one.
async fn session_cookie(jar: CookieJar, mut req: Request, next: Next) -> (CookieJar, Response) {
    let presented = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value_trimmed()).ok());

    let key = SessionKey(presented.unwrap_or_else(Uuid::new_v4));
    req.extensions_mut().insert(key);
    let response = next.run(req).await;

    let jar = match presented {
        Some(_) => jar,
        None => jar.add(issue_session_cookie(key)),
    };
    (jar, response)
}

fn issue_session_cookie(key: SessionKey) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, key.0.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
