//! Task API client
//!
//! Handles communication with the task-management REST API: builds requests
//! against the configured base URL, attaches the bearer token, converts
//! response bodies through explicit schemas and maps HTTP failures onto the
//! domain error taxonomy.
//!
//! Authorized calls go through a one-shot refresh interceptor. A 401 triggers
//! exactly one refresh (`POST /api/auth/refresh` with the refresh token as
//! bearer) and exactly one replay of the original request. Anything else ends
//! the session.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{NewTask, StoredTokens, Task, TaskPriority, TaskStats, TaskStatus, TaskUpdate, User};
use crate::ports::Credentials;

// =============================================================================
// API Request/Response Models
// =============================================================================

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    /// Build a registration from a display name
    ///
    /// The username is the e-mail's local part; the first word of the name is
    /// the first name and the rest the last name (the first name again when
    /// the name is a single word).
    pub fn from_display_name(name: &str, email: &str, password: &str) -> Self {
        let mut words = name.split_whitespace();
        let first_name = words.next().unwrap_or_default().to_string();
        let rest = words.collect::<Vec<_>>().join(" ");
        let last_name = if rest.is_empty() { first_name.clone() } else { rest };
        let username = email.split('@').next().unwrap_or(email).to_string();

        Self {
            username,
            email: email.to_string(),
            password: password.to_string(),
            first_name,
            last_name,
        }
    }
}

/// Response of login and register
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: User,
}

impl AuthResponse {
    pub fn tokens(&self) -> StoredTokens {
        StoredTokens::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

/// Response of `POST /api/auth/refresh`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    /// Rotated refresh token; the old one stays valid when absent
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Error body returned by the server on failures
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    field_errors: BTreeMap<String, String>,
}

/// Which status mapping applies to a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    /// login/register/refresh/logout: a 401 means bad credentials
    Auth,
    /// Everything else
    Resource,
}

/// A request that can be dispatched more than once (for the replay)
#[derive(Debug, Clone)]
struct ApiRequest {
    method: Method,
    /// Path segments, percent-encoded only when the URL is built
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
    body: Option<JsonValue>,
}

impl ApiRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
        }
    }

    fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Append one segment taken verbatim, e.g. a task id
    fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }
}

/// Interceptor progress for one authorized request
#[derive(Debug)]
enum Step {
    /// Initial dispatch with the current access token
    Send,
    /// The server rejected the credentials the request was sent with
    AuthFailed { sent_with: Option<String> },
    /// A fresh access token is available; dispatch once more
    Replay { access_token: String },
}

// =============================================================================
// API Client
// =============================================================================

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Profile endpoint, also used to validate a restored session
pub const CURRENT_USER_PATH: &str = "/api/users/me";

/// Liveness probe endpoint
pub const HEALTH_PATH: &str = "/api/health";

/// Task API client
pub struct ApiClient {
    client: Client,
    base_url: String,
    root: Url,
    timeout: Duration,
    credentials: Arc<dyn Credentials>,
    /// Serialises refreshes so concurrent 401s share one new token
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Create a client for `base_url` reading tokens from `credentials`
    pub fn new(base_url: &str, timeout: Duration, credentials: Arc<dyn Credentials>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }

        let root = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid API base URL {}: {}", base_url, e)))?;
        if root.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid API base URL {}", base_url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            root,
            timeout,
            credentials,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // === Auth (no interceptor) ===

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let request = ApiRequest::new(Method::POST, "/api/auth/login").json(request)?;
        let response = self.dispatch(&request, None).await?;
        let response = self.check_status(response, Endpoint::Auth).await?;
        self.decode(response).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let request = ApiRequest::new(Method::POST, "/api/auth/register").json(request)?;
        let response = self.dispatch(&request, None).await?;
        let response = self.check_status(response, Endpoint::Auth).await?;
        self.decode(response).await
    }

    /// Invalidate the server-side session for `access_token`
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let request = ApiRequest::new(Method::POST, "/api/auth/logout");
        let response = self.dispatch(&request, Some(access_token)).await?;
        self.check_status(response, Endpoint::Auth).await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let request = ApiRequest::new(Method::POST, "/api/auth/refresh").json(&serde_json::json!({}))?;
        let response = self.dispatch(&request, Some(refresh_token)).await?;
        let response = self.check_status(response, Endpoint::Auth).await?;
        self.decode(response).await
    }

    // === Users ===

    pub async fn current_user(&self) -> Result<User> {
        self.fetch(ApiRequest::get(CURRENT_USER_PATH)).await
    }

    // === Tasks ===

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.fetch(ApiRequest::get("/api/tasks")).await
    }

    pub async fn create_task(&self, draft: &NewTask) -> Result<Task> {
        self.fetch(ApiRequest::new(Method::POST, "/api/tasks").json(draft)?).await
    }

    pub async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        self.fetch(ApiRequest::new(Method::PUT, "/api/tasks").segment(id).json(update)?)
            .await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let request = ApiRequest::new(Method::DELETE, "/api/tasks").segment(id);
        self.execute(&request).await?;
        Ok(())
    }

    pub async fn complete_task(&self, id: &str) -> Result<Task> {
        self.fetch(ApiRequest::new(Method::PATCH, "/api/tasks").segment(id).segment("complete"))
            .await
    }

    pub async fn start_task(&self, id: &str) -> Result<Task> {
        self.fetch(ApiRequest::new(Method::PATCH, "/api/tasks").segment(id).segment("progress"))
            .await
    }

    pub async fn statistics(&self) -> Result<TaskStats> {
        self.fetch(ApiRequest::get("/api/tasks/statistics")).await
    }

    pub async fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        self.fetch(ApiRequest::get("/api/tasks/status").segment(status.as_str()))
            .await
    }

    pub async fn tasks_by_priority(&self, priority: TaskPriority) -> Result<Vec<Task>> {
        self.fetch(ApiRequest::get("/api/tasks/priority").segment(priority.as_str()))
            .await
    }

    pub async fn search_tasks(&self, title: &str) -> Result<Vec<Task>> {
        self.fetch(ApiRequest::get("/api/tasks/search").query("title", title))
            .await
    }

    pub async fn overdue_tasks(&self) -> Result<Vec<Task>> {
        self.fetch(ApiRequest::get("/api/tasks/overdue")).await
    }

    // === Health (no auth) ===

    /// Liveness probe; returns whatever the server reports
    pub async fn health(&self) -> Result<JsonValue> {
        let response = self.dispatch(&ApiRequest::get(HEALTH_PATH), None).await?;
        let response = self.check_status(response, Endpoint::Resource).await?;
        let bytes = response.bytes().await.map_err(|e| self.map_request_error(e))?;
        if bytes.is_empty() {
            return Ok(JsonValue::Null);
        }
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
        }))
    }

    // =========================================================================
    // Interceptor
    // =========================================================================

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(&request).await?;
        self.decode(response).await
    }

    /// Run an authorized request through the refresh interceptor
    async fn execute(&self, request: &ApiRequest) -> Result<Response> {
        let mut step = Step::Send;
        loop {
            step = match step {
                Step::Send => {
                    let token = self.credentials.access_token();
                    let response = self.dispatch(request, token.as_deref()).await?;
                    if response.status() != StatusCode::UNAUTHORIZED {
                        return self.check_status(response, Endpoint::Resource).await;
                    }
                    Step::AuthFailed { sent_with: token }
                }
                Step::AuthFailed { sent_with } => {
                    let access_token = self.recover(sent_with).await?;
                    Step::Replay { access_token }
                }
                Step::Replay { access_token } => {
                    let response = self.dispatch(request, Some(&access_token)).await?;
                    if response.status() == StatusCode::UNAUTHORIZED {
                        self.credentials.expire();
                        return Err(Error::SessionExpired(
                            "access token rejected after refresh".to_string(),
                        ));
                    }
                    return self.check_status(response, Endpoint::Resource).await;
                }
            };
        }
    }

    /// Obtain a usable access token after an auth failure, or end the session
    async fn recover(&self, sent_with: Option<String>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        // Another request already rotated the token while we waited
        if let Some(current) = self.credentials.access_token() {
            if sent_with.as_deref() != Some(current.as_str()) {
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.credentials.refresh_token() else {
            self.credentials.expire();
            return Err(Error::SessionExpired("no refresh token available".to_string()));
        };

        match self.refresh(&refresh_token).await {
            Ok(refreshed) => {
                let access_token = refreshed.access_token.clone();
                let tokens = StoredTokens {
                    access_token: Some(refreshed.access_token),
                    refresh_token: refreshed.refresh_token.or(Some(refresh_token)),
                };
                self.credentials.store_refreshed(tokens)?;
                Ok(access_token)
            }
            Err(e) => {
                self.credentials.expire();
                Err(Error::SessionExpired(format!("token refresh failed: {}", e)))
            }
        }
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn dispatch(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Response> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid API base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(&request.segments);
        let mut builder = self.client.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| self.map_request_error(e))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let bytes = response.bytes().await.map_err(|e| self.map_request_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            Error::validation(format!("Invalid response from server: {}", e))
        })
    }

    /// Check response status and return appropriate errors
    async fn check_status(&self, response: Response, endpoint: Endpoint) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        Err(map_status(status, body, endpoint))
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::NetworkUnavailable(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::NetworkUnavailable(format!("Unable to connect to {}", self.base_url))
        } else if error.is_decode() {
            Error::validation(format!("Invalid response from server: {}", error))
        } else {
            Error::NetworkUnavailable(format!("Request failed: {}", error))
        }
    }
}

fn map_status(status: StatusCode, body: ApiErrorBody, endpoint: Endpoint) -> Error {
    let code = status.as_u16();
    let message = body
        .message
        .or(body.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    match (code, endpoint) {
        (400 | 422, _) if !body.field_errors.is_empty() => Error::ValidationFailed {
            message,
            field_errors: body.field_errors,
        },
        (400 | 401 | 403 | 409, Endpoint::Auth) => Error::CredentialsRejected(message),
        (400 | 422, Endpoint::Resource) => Error::validation(message),
        (401, Endpoint::Resource) => Error::SessionExpired(message),
        (404, _) => Error::NotFound(message),
        _ => Error::ServerError {
            status: code,
            message,
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
