use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::models::{
    AuthResponse, ChatRequest, ChatResponse, LoginRequest, ProfileEnvelope, SearchRequest,
    SearchResponse, Session, SignupRequest, TrialRecord,
};
use crate::storage::SessionStore;

pub const DEFAULT_BASE_URL: &str = "https://ai-clinical-trial-matchmaker.onrender.com";

/// HTTP client for the matchmaker backend.
///
/// The session store is read on every authenticated request; login and signup
/// are the only unauthenticated endpoints.
pub struct MatchmakerApi {
    http: reqwest::Client,
    base_url: String,
    session_store: Arc<dyn SessionStore>,
}

impl MatchmakerApi {
    pub fn new(base_url: impl Into<String>, session_store: Arc<dyn SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .session_store
            .current_token()
            .ok_or(ClientError::Unauthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    /// POST /users/login
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, email, "login request");

        let response = self
            .http
            .post(self.url("/users/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        self.auth_response(response, request_id).await
    }

    /// POST /users/signup
    pub async fn signup(&self, request: &SignupRequest) -> Result<Session> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, email = %request.email, "signup request");

        let response = self
            .http
            .post(self.url("/users/signup"))
            .json(request)
            .send()
            .await?;

        self.auth_response(response, request_id).await
    }

    async fn auth_response(&self, response: Response, request_id: Uuid) -> Result<Session> {
        let status = response.status();
        if !status.is_success() {
            // Login/signup failures report under an `error` key
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| "Authentication failed".to_string());
            warn!(%request_id, status = status.as_u16(), "auth request rejected");
            return Err(ClientError::api(status.as_u16(), message));
        }

        let auth: AuthResponse = response.json().await?;
        info!(%request_id, user_id = %auth.user_id, "authenticated");
        Ok(auth.into())
    }

    /// GET /profile/me
    pub async fn fetch_profile(&self) -> Result<ProfileEnvelope> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, "fetching profile envelope");

        let response = self
            .authed(self.http.get(self.url("/profile/me")))?
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let fallback = format!("Failed to load profile (status {})", status.as_u16());
            return Err(profile_error(status, response, fallback).await);
        }
        Ok(response.json().await?)
    }

    /// POST /patients/profile with the full payload
    pub async fn create_profile(&self, payload: &Value) -> Result<()> {
        self.submit_profile(reqwest::Method::POST, payload).await
    }

    /// PATCH /patients/profile with the changed-fields subset
    pub async fn update_profile(&self, payload: &Value) -> Result<()> {
        self.submit_profile(reqwest::Method::PATCH, payload).await
    }

    async fn submit_profile(&self, method: reqwest::Method, payload: &Value) -> Result<()> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, %method, "submitting patient profile");

        let builder = self
            .http
            .request(method, self.url("/patients/profile"))
            .json(payload);
        let response = self.authed(builder)?.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%request_id, status = status.as_u16(), "profile submission rejected");
            let fallback = format!("Failed to save profile (status {})", status.as_u16());
            return Err(profile_error(status, response, fallback).await);
        }
        info!(%request_id, "profile submitted");
        Ok(())
    }

    /// POST /api/matching/search.
    ///
    /// A non-success status surfaces a generic search error; the body is not
    /// parsed for structure. A missing `matched_trials` key is an empty list.
    pub async fn search_trials(&self, request: &SearchRequest) -> Result<Vec<TrialRecord>> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, query = %request.query_text, sort_by = %request.sort_by, "search request");

        let response = self
            .authed(self.http.post(self.url("/api/matching/search")).json(request))?
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%request_id, status = status.as_u16(), "search request failed");
            return Err(ClientError::api(status.as_u16(), "Search failed. Try again."));
        }

        let body: SearchResponse = response.json().await?;
        info!(%request_id, count = body.matched_trials.len(), "search completed");
        Ok(body.matched_trials)
    }

    /// POST /chatbot/ask
    pub async fn ask_chatbot(&self, question: &str) -> Result<String> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, "chatbot question");

        let response = self
            .authed(self.http.post(self.url("/chatbot/ask")).json(&ChatRequest {
                question: question.to_string(),
            }))?
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::api(
                status.as_u16(),
                "Unable to process your request right now.",
            ));
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.answer)
    }
}

/// Best-effort extraction of a server message for profile endpoints:
/// `detail`, then `message`, then the raw body text, then the status-coded
/// fallback. Parse failures along the way are swallowed.
async fn profile_error(status: StatusCode, response: Response, fallback: String) -> ClientError {
    let message = match response.text().await {
        Ok(text) => serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .or_else(|| (!text.is_empty()).then(|| text))
            .unwrap_or(fallback),
        Err(_) => fallback,
    };
    ClientError::api(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;
    use crate::storage::{InMemorySessionStore, SessionStore};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn logged_in_store() -> Arc<InMemorySessionStore> {
        let store = Arc::new(InMemorySessionStore::new());
        store
            .save(&Session {
                token: "tok".into(),
                user_id: "u1".into(),
                email: "p@x.y".into(),
                first_name: "P".into(),
                last_name: "D".into(),
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn login_builds_a_session_from_the_auth_response() {
        let router = Router::new().route(
            "/users/login",
            post(|| async {
                Json(json!({
                    "access_token": "abc",
                    "user_id": "u42",
                    "email": "p@x.y",
                    "first_name": "Pat",
                    "last_name": "Doe"
                }))
            }),
        );
        let base = serve(router).await;

        let api = MatchmakerApi::new(base, Arc::new(InMemorySessionStore::new()));
        let session = api.login("p@x.y", "secret").await.unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.user_id, "u42");
    }

    #[tokio::test]
    async fn login_failure_surfaces_the_error_field() {
        let router = Router::new().route(
            "/users/login",
            post(|| async {
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "Invalid credentials"})),
                )
            }),
        );
        let base = serve(router).await;

        let api = MatchmakerApi::new(base, Arc::new(InMemorySessionStore::new()));
        match api.login("p@x.y", "wrong").await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn authed_endpoints_require_a_session() {
        let api = MatchmakerApi::new(
            "http://127.0.0.1:1",
            Arc::new(InMemorySessionStore::new()),
        );
        assert!(matches!(
            api.fetch_profile().await,
            Err(ClientError::Unauthenticated)
        ));
        assert!(matches!(
            api.ask_chatbot("hi").await,
            Err(ClientError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn search_failure_is_a_generic_error() {
        let router = Router::new().route(
            "/api/matching/search",
            post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "stack trace here"})),
                )
            }),
        );
        let base = serve(router).await;

        let api = MatchmakerApi::new(base, logged_in_store());
        let request = SearchRequest {
            query_text: "diabetes".into(),
            filter_status: String::new(),
            filter_location_contains: String::new(),
            sort_by: "confidence".into(),
            limit: 10,
        };
        match api.search_trials(&request).await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Search failed. Try again.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn profile_error_cascade_prefers_detail() {
        let router = Router::new().route(
            "/patients/profile",
            post(|| async {
                (
                    axum::http::StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"detail": "date_of_birth is required", "message": "no"})),
                )
            }),
        );
        let base = serve(router).await;

        let api = MatchmakerApi::new(base, logged_in_store());
        match api.create_profile(&json!({})).await {
            Err(ClientError::Api { message, .. }) => {
                assert_eq!(message, "date_of_birth is required");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn profile_error_falls_back_to_raw_body_then_status() {
        let router = Router::new()
            .route(
                "/patients/profile",
                post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
            )
            .route(
                "/profile/me",
                get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "") }),
            );
        let base = serve(router).await;

        let api = MatchmakerApi::new(base, logged_in_store());
        match api.create_profile(&json!({})).await {
            Err(ClientError::Api { message, .. }) => assert_eq!(message, "upstream down"),
            other => panic!("unexpected: {other:?}"),
        }
        match api.fetch_profile().await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to load profile (status 500)");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
