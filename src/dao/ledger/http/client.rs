use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    dao::{
        ledger::{ScoreLedger, SessionStore, UserRegistry},
        models::{ScoreState, User, UserId},
        storage::StorageResult,
    },
    dto::{
        points::{IncrementRequest, PointsQuery},
        session::SelectUserRequest,
        users::{CreateUserRequest, UsersResponse},
    },
};

use super::{
    config::HttpLedgerConfig,
    error::{HttpLedgerError, HttpResult},
};

const HEALTH_PATH: &str = "/api/health";
const USERS_PATH: &str = "/api/users";
const SESSION_PATH: &str = "/api/session";
const POINTS_PATH: &str = "/api/points";

/// Client for the reference ledger server. Keeps a cookie jar so the
/// server-side session follows this client across requests.
#[derive(Clone)]
pub struct HttpLedger {
    client: Client,
    base_url: Arc<str>,
}

impl HttpLedger {
    /// Build the client; no request is sent until the first operation.
    pub fn new(config: HttpLedgerConfig) -> HttpResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|source| HttpLedgerError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send<T>(&self, path: &str, builder: reqwest::RequestBuilder) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| HttpLedgerError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(HttpLedgerError::RequestStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| HttpLedgerError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> HttpResult<T>
    where
        T: DeserializeOwned,
        Q: ?Sized + Serialize,
    {
        let mut builder = self.request(Method::GET, path);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        self.send(path, builder).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> HttpResult<T>
    where
        T: DeserializeOwned,
        B: ?Sized + Serialize,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.send(path, builder).await
    }
}

impl UserRegistry for HttpLedger {
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<User>>> {
        let ledger = self.clone();
        Box::pin(async move {
            let payload = ledger
                .get_json::<UsersResponse, ()>(USERS_PATH, None)
                .await?;
            Ok(payload.users)
        })
    }

    fn create_user(&self, username: String) -> BoxFuture<'static, StorageResult<User>> {
        let ledger = self.clone();
        Box::pin(async move {
            let body = CreateUserRequest { username };
            ledger
                .post_json(USERS_PATH, &body)
                .await
                .map_err(Into::into)
        })
    }
}

impl SessionStore for HttpLedger {
    fn current_user(&self) -> BoxFuture<'static, StorageResult<Option<User>>> {
        let ledger = self.clone();
        Box::pin(async move {
            ledger
                .get_json::<Option<User>, ()>(SESSION_PATH, None)
                .await
                .map_err(Into::into)
        })
    }

    fn set_current_user(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<User>> {
        let ledger = self.clone();
        Box::pin(async move {
            let body = SelectUserRequest { user_id };
            ledger
                .post_json(SESSION_PATH, &body)
                .await
                .map_err(Into::into)
        })
    }
}

impl ScoreLedger for HttpLedger {
    fn get_score(&self, user_id: UserId) -> BoxFuture<'static, StorageResult<ScoreState>> {
        let ledger = self.clone();
        Box::pin(async move {
            let query = PointsQuery {
                user_id: Some(user_id),
            };
            ledger
                .get_json(POINTS_PATH, Some(&query))
                .await
                .map_err(Into::into)
        })
    }

    fn increment_score(
        &self,
        user_id: UserId,
        increment: u64,
    ) -> BoxFuture<'static, StorageResult<ScoreState>> {
        let ledger = self.clone();
        Box::pin(async move {
            let body = IncrementRequest {
                increment,
                user_id: Some(user_id),
            };
            ledger
                .post_json(POINTS_PATH, &body)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let ledger = self.clone();
        Box::pin(async move {
            ledger
                .get_json::<serde_json::Value, ()>(HEALTH_PATH, None)
                .await
                .map(|_| ())
                .map_err(Into::into)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::dao::storage::StorageError;

    fn ledger_for(server: &MockServer) -> HttpLedger {
        HttpLedger::new(HttpLedgerConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn increment_sends_user_and_parses_totals() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(POINTS_PATH))
            .and(body_json(json!({ "increment": 1, "user_id": 4 })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "points": 8, "action_points": 2 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let score = ledger_for(&server).increment_score(4, 1).await.unwrap();
        assert_eq!(score, ScoreState::new(8, 2));
    }

    #[tokio::test]
    async fn score_read_carries_user_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(POINTS_PATH))
            .and(query_param("user_id", "3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "points": 1, "action_points": 0 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let score = ledger_for(&server).get_score(3).await.unwrap();
        assert_eq!(score, ScoreState::new(1, 0));
    }

    #[tokio::test]
    async fn garbled_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(POINTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"points\": 4"))
            .mount(&server)
            .await;

        let err = ledger_for(&server).get_score(1).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn unknown_session_target_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SESSION_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "nope" })))
            .mount(&server)
            .await;

        let err = ledger_for(&server).set_current_user(42).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_session_decodes_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SESSION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        assert_eq!(ledger_for(&server).current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn users_are_unwrapped_from_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "id": 1, "username": "ann" }, { "id": 2, "username": "bo" }]
            })))
            .mount(&server)
            .await;

        let users = ledger_for(&server).list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].username, "bo");
    }
}
