//! Mock task API server for testing
//!
//! Stateful HTTP server that simulates the task-management backend, so the
//! client, the refresh interceptor and the services can be exercised without
//! a real deployment.
//!
//! Implemented endpoints:
//! - POST /api/auth/login, /api/auth/register, /api/auth/refresh, /api/auth/logout
//! - GET /api/users/me, GET /api/health
//! - GET/POST /api/tasks, PUT/DELETE /api/tasks/{id}
//! - PATCH /api/tasks/{id}/complete, /api/tasks/{id}/progress
//! - GET /api/tasks/statistics, /status/{s}, /priority/{p}, /search?title=, /overdue
//!
//! Every server starts with one account: `user@x.com` / `pw` ("Test User").

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::domain::{StoredTokens, TaskPriority, TaskStatus};

pub const DEFAULT_EMAIL: &str = "user@x.com";
pub const DEFAULT_PASSWORD: &str = "pw";
pub const DEFAULT_NAME: &str = "Test User";

/// Mock task server for testing
pub struct MockTaskServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Behaviour switches for the mock
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Tokens minted by a refresh are never accepted
    pub reject_refreshed_tokens: bool,
    /// Logout answers 500
    pub fail_logout: bool,
    /// `GET /api/tasks` answers with a body that is not a task list
    pub malformed_task_list: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

#[derive(Debug, Clone)]
struct MockUser {
    id: u64,
    username: String,
    email: String,
    name: String,
    password: String,
    created_at: String,
}

impl MockUser {
    fn to_json(&self) -> JsonValue {
        json!({
            "id": self.id,
            "email": self.email,
            "name": self.name,
            "createdAt": self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct MockTask {
    id: u64,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
    user_id: u64,
}

impl MockTask {
    fn due_day(&self) -> Option<NaiveDate> {
        self.due_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.get(..10)?, "%Y-%m-%d").ok())
    }

    fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != "COMPLETED" && self.due_day().is_some_and(|due| due < today)
    }
}

struct MockState {
    config: MockConfig,
    healthy: bool,
    users: Vec<MockUser>,
    access_tokens: HashMap<String, u64>,
    refresh_tokens: HashMap<String, u64>,
    tasks: Vec<MockTask>,
    next_id: u64,
    refresh_calls: usize,
    requests: Vec<(String, String)>,
    forced_failures: HashMap<(String, String), u16>,
}

struct MockRequest {
    method: String,
    path: String,
    query: HashMap<String, String>,
    bearer: Option<String>,
    body: JsonValue,
}

struct MockResponse {
    status: u16,
    body: String,
}

impl MockResponse {
    fn json(status: u16, body: JsonValue) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "message": message }))
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: String::new(),
        }
    }
}

impl MockTaskServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let now = timestamp_now();
        let state = Arc::new(Mutex::new(MockState {
            config,
            healthy: true,
            users: vec![MockUser {
                id: 1,
                username: "user".to_string(),
                email: DEFAULT_EMAIL.to_string(),
                name: DEFAULT_NAME.to_string(),
                password: DEFAULT_PASSWORD.to_string(),
                created_at: now,
            }],
            access_tokens: HashMap::new(),
            refresh_tokens: HashMap::new(),
            tasks: Vec::new(),
            next_id: 100,
            refresh_calls: 0,
            requests: Vec::new(),
            forced_failures: HashMap::new(),
        }));
        let state_clone = state.clone();

        // Set listener to non-blocking for graceful shutdown
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Mint a valid token pair for an existing user
    pub fn issue_tokens(&self, email: &str) -> StoredTokens {
        let mut state = self.state.lock().unwrap();
        let user_id = state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
            .expect("unknown mock user");
        let (access, refresh) = state.mint_tokens(user_id);
        StoredTokens::new(access, Some(refresh))
    }

    /// Invalidate every access token handed out so far
    pub fn expire_access_tokens(&self) {
        self.state.lock().unwrap().access_tokens.clear();
    }

    /// Invalidate every refresh token handed out so far
    pub fn revoke_refresh_tokens(&self) {
        self.state.lock().unwrap().refresh_tokens.clear();
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.lock().unwrap().healthy = healthy;
    }

    /// Answer `method path` with `status` from now on
    pub fn fail_requests_to(&self, method: &str, path: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .forced_failures
            .insert((method.to_string(), path.to_string()), status);
    }

    /// Add a task owned by `email`, returning its id
    pub fn seed_task(&self, email: &str, title: &str, status: TaskStatus, priority: TaskPriority) -> String {
        self.seed_task_due(email, title, status, priority, None)
    }

    pub fn seed_task_due(
        &self,
        email: &str,
        title: &str,
        status: TaskStatus,
        priority: TaskPriority,
        due: Option<NaiveDate>,
    ) -> String {
        let mut state = self.state.lock().unwrap();
        let user_id = state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
            .expect("unknown mock user");
        let id = state.next_id();
        let now = timestamp_now();
        state.tasks.push(MockTask {
            id,
            title: title.to_string(),
            description: None,
            status: status.as_str().to_string(),
            priority: priority.as_str().to_string(),
            due_date: due.map(|d| format!("{}T00:00:00", d.format("%Y-%m-%d"))),
            created_at: now.clone(),
            updated_at: now,
            user_id,
        });
        id.to_string()
    }

    /// Number of `POST /api/auth/refresh` calls received
    pub fn refresh_calls(&self) -> usize {
        self.state.lock().unwrap().refresh_calls
    }

    /// Number of requests received for `method path` (query excluded)
    pub fn requests_to(&self, method: &str, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    /// Total number of requests received
    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockTaskServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn mint_tokens(&mut self, user_id: u64) -> (String, String) {
        let access = format!("acc-{}", Uuid::new_v4());
        let refresh = format!("ref-{}", Uuid::new_v4());
        self.access_tokens.insert(access.clone(), user_id);
        self.refresh_tokens.insert(refresh.clone(), user_id);
        (access, refresh)
    }

    fn auth_response(&mut self, user_id: u64, status: u16) -> MockResponse {
        let (access, refresh) = self.mint_tokens(user_id);
        let user = self
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(MockUser::to_json)
            .unwrap_or(JsonValue::Null);
        MockResponse::json(
            status,
            json!({ "accessToken": access, "refreshToken": refresh, "user": user }),
        )
    }

    fn authenticate(&self, request: &MockRequest) -> Option<u64> {
        request
            .bearer
            .as_ref()
            .and_then(|token| self.access_tokens.get(token).copied())
    }

    fn user_tasks(&self, user_id: u64) -> Vec<&MockTask> {
        // Newest first
        let mut tasks: Vec<&MockTask> = self.tasks.iter().filter(|t| t.user_id == user_id).collect();
        tasks.sort_by(|a, b| b.id.cmp(&a.id));
        tasks
    }

    fn task_mut(&mut self, user_id: u64, id: &str) -> Option<&mut MockTask> {
        let id: u64 = id.parse().ok()?;
        self.tasks.iter_mut().find(|t| t.id == id && t.user_id == user_id)
    }
}

fn handle_connection(mut stream: TcpStream, state: &Mutex<MockState>) {
    let Some(request) = read_request(&mut stream) else {
        send_response(&mut stream, &MockResponse::error(400, "Invalid request"));
        return;
    };

    let delay_ms = state.lock().map(|s| s.config.delay_ms).unwrap_or(0);
    if delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(delay_ms));
    }

    let response = match state.lock() {
        Ok(mut state) => route(&mut state, &request),
        Err(_) => MockResponse::error(500, "Mock state poisoned"),
    };
    send_response(&mut stream, &response);
}

fn read_request(stream: &mut TcpStream) -> Option<MockRequest> {
    let mut data = Vec::new();
    let mut buffer = [0; 4096];

    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = head.lines();
    let mut parts = lines.next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut content_length = 0usize;
    let mut bearer = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_lowercase().as_str() {
            "content-length" => content_length = value.parse().unwrap_or(0),
            "authorization" => {
                bearer = value
                    .strip_prefix("Bearer ")
                    .or_else(|| value.strip_prefix("bearer "))
                    .map(str::to_string)
            }
            _ => {}
        }
    }

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let body_bytes = &data[header_end..(header_end + content_length).min(data.len())];
    let body = if body_bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(body_bytes).unwrap_or(JsonValue::Null)
    };

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), parse_query(query)),
        None => (target, HashMap::new()),
    };

    Some(MockRequest {
        method,
        path,
        query,
        bearer,
        body,
    })
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (decode_component(k), decode_component(v)))
        .collect()
}

/// Decode a form-urlencoded component
fn decode_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => {
                        out.push(b);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn route(state: &mut MockState, request: &MockRequest) -> MockResponse {
    state
        .requests
        .push((request.method.clone(), request.path.clone()));

    if let Some(status) = state
        .forced_failures
        .get(&(request.method.clone(), request.path.clone()))
    {
        return MockResponse::error(*status, "Forced failure");
    }

    let segments: Vec<&str> = request
        .path
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (request.method.as_str(), segments.as_slice()) {
        ("GET", ["api", "health"]) => {
            if state.healthy {
                MockResponse::json(200, json!({ "status": "UP" }))
            } else {
                MockResponse::json(503, json!({ "status": "DOWN" }))
            }
        }
        ("POST", ["api", "auth", "login"]) => login(state, &request.body),
        ("POST", ["api", "auth", "register"]) => register(state, &request.body),
        ("POST", ["api", "auth", "refresh"]) => refresh(state, request),
        ("POST", ["api", "auth", "logout"]) => {
            if state.config.fail_logout {
                return MockResponse::error(500, "Logout failed");
            }
            if let Some(token) = &request.bearer {
                state.access_tokens.remove(token);
            }
            MockResponse::json(200, json!({}))
        }
        (_, ["api", ..]) => {
            let Some(user_id) = state.authenticate(request) else {
                return MockResponse::error(401, "Unauthorized");
            };
            authorized(state, user_id, request, &segments[1..])
        }
        _ => MockResponse::error(404, "Endpoint not found"),
    }
}

fn login(state: &mut MockState, body: &JsonValue) -> MockResponse {
    let identifier = body["usernameOrEmail"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let user_id = state
        .users
        .iter()
        .find(|u| (u.email == identifier || u.username == identifier) && u.password == password)
        .map(|u| u.id);

    match user_id {
        Some(id) => state.auth_response(id, 200),
        None => MockResponse::error(401, "Invalid username or password"),
    }
}

fn register(state: &mut MockState, body: &JsonValue) -> MockResponse {
    let field = |name: &str| body[name].as_str().unwrap_or_default().trim().to_string();
    let (username, email, password) = (field("username"), field("email"), field("password"));
    let (first_name, last_name) = (field("firstName"), field("lastName"));

    let mut field_errors = serde_json::Map::new();
    for (name, value) in [("email", &email), ("password", &password), ("firstName", &first_name)] {
        if value.is_empty() {
            field_errors.insert(name.to_string(), json!("must not be blank"));
        }
    }
    if !field_errors.is_empty() {
        return MockResponse::json(
            400,
            json!({ "message": "Validation failed", "fieldErrors": field_errors }),
        );
    }

    if state.users.iter().any(|u| u.email == email) {
        return MockResponse::error(409, "Email is already in use");
    }

    let name = if last_name.is_empty() || last_name == first_name {
        first_name
    } else {
        format!("{} {}", first_name, last_name)
    };
    let id = state.next_id();
    state.users.push(MockUser {
        id,
        username,
        email,
        name,
        password,
        created_at: timestamp_now(),
    });
    state.auth_response(id, 201)
}

fn refresh(state: &mut MockState, request: &MockRequest) -> MockResponse {
    state.refresh_calls += 1;

    let user_id = request
        .bearer
        .as_ref()
        .and_then(|token| state.refresh_tokens.remove(token));
    let Some(user_id) = user_id else {
        return MockResponse::error(401, "Invalid refresh token");
    };

    let (access, refresh) = state.mint_tokens(user_id);
    if state.config.reject_refreshed_tokens {
        state.access_tokens.remove(&access);
    }
    MockResponse::json(200, json!({ "accessToken": access, "refreshToken": refresh }))
}

fn authorized(state: &mut MockState, user_id: u64, request: &MockRequest, segments: &[&str]) -> MockResponse {
    let today = Utc::now().date_naive();
    let list = |tasks: Vec<&MockTask>| MockResponse::json(200, json!(tasks));

    match (request.method.as_str(), segments) {
        ("GET", ["users", "me"]) => match state.users.iter().find(|u| u.id == user_id) {
            Some(user) => MockResponse::json(200, user.to_json()),
            None => MockResponse::error(404, "User not found"),
        },
        ("GET", ["tasks"]) => {
            if state.config.malformed_task_list {
                return MockResponse::json(200, json!({ "tasks": "not-a-list" }));
            }
            list(state.user_tasks(user_id))
        }
        ("POST", ["tasks"]) => create_task(state, user_id, &request.body),
        ("GET", ["tasks", "statistics"]) => {
            let tasks = state.user_tasks(user_id);
            MockResponse::json(
                200,
                json!({
                    "total": tasks.len(),
                    "completed": tasks.iter().filter(|t| t.status == "COMPLETED").count(),
                    "inProgress": tasks.iter().filter(|t| t.status == "IN_PROGRESS").count(),
                    "overdue": tasks.iter().filter(|t| t.is_overdue(today)).count(),
                }),
            )
        }
        ("GET", ["tasks", "overdue"]) => list(
            state
                .user_tasks(user_id)
                .into_iter()
                .filter(|t| t.is_overdue(today))
                .collect(),
        ),
        ("GET", ["tasks", "search"]) => {
            let needle = request.query.get("title").cloned().unwrap_or_default().to_lowercase();
            list(
                state
                    .user_tasks(user_id)
                    .into_iter()
                    .filter(|t| t.title.to_lowercase().contains(&needle))
                    .collect(),
            )
        }
        ("GET", ["tasks", "status", status]) => list(
            state
                .user_tasks(user_id)
                .into_iter()
                .filter(|t| t.status == *status)
                .collect(),
        ),
        ("GET", ["tasks", "priority", priority]) => list(
            state
                .user_tasks(user_id)
                .into_iter()
                .filter(|t| t.priority == *priority)
                .collect(),
        ),
        ("PUT", ["tasks", id]) => {
            let body = request.body.clone();
            match state.task_mut(user_id, id) {
                Some(task) => {
                    if let Some(title) = body["title"].as_str() {
                        task.title = title.to_string();
                    }
                    if let Some(description) = body["description"].as_str() {
                        task.description = Some(description.to_string());
                    }
                    if let Some(priority) = body["priority"].as_str() {
                        task.priority = priority.to_string();
                    }
                    if let Some(status) = body["status"].as_str() {
                        task.status = status.to_string();
                    }
                    if let Some(due) = body["dueDate"].as_str() {
                        task.due_date = Some(due.to_string());
                    }
                    task.updated_at = timestamp_now();
                    MockResponse::json(200, json!(task))
                }
                None => MockResponse::error(404, "Task not found"),
            }
        }
        ("PATCH", ["tasks", id, action @ ("complete" | "progress")]) => {
            let status = if *action == "complete" { "COMPLETED" } else { "IN_PROGRESS" };
            match state.task_mut(user_id, id) {
                Some(task) => {
                    task.status = status.to_string();
                    task.updated_at = timestamp_now();
                    MockResponse::json(200, json!(task))
                }
                None => MockResponse::error(404, "Task not found"),
            }
        }
        ("DELETE", ["tasks", id]) => {
            let before = state.tasks.len();
            let id: u64 = id.parse().unwrap_or(0);
            state.tasks.retain(|t| !(t.id == id && t.user_id == user_id));
            if state.tasks.len() == before {
                MockResponse::error(404, "Task not found")
            } else {
                MockResponse::no_content()
            }
        }
        _ => MockResponse::error(404, "Endpoint not found"),
    }
}

fn create_task(state: &mut MockState, user_id: u64, body: &JsonValue) -> MockResponse {
    let title = body["title"].as_str().unwrap_or_default().trim().to_string();
    if title.is_empty() {
        return MockResponse::json(
            400,
            json!({ "message": "Validation failed", "fieldErrors": { "title": "must not be blank" } }),
        );
    }

    let id = state.next_id();
    let now = timestamp_now();
    let task = MockTask {
        id,
        title,
        description: body["description"].as_str().map(str::to_string),
        status: "PENDING".to_string(),
        priority: body["priority"].as_str().unwrap_or("MEDIUM").to_string(),
        due_date: body["dueDate"].as_str().map(str::to_string),
        created_at: now.clone(),
        updated_at: now,
        user_id,
    };
    let response = MockResponse::json(201, json!(task));
    state.tasks.push(task);
    response
}

fn timestamp_now() -> String {
    // Server-local timestamps without offset, microsecond precision
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn send_response(stream: &mut TcpStream, response: &MockResponse) {
    let status_text = match response.status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        503 => "Service Unavailable",
        _ => "Internal Server Error",
    };
    let raw = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        status_text,
        response.body.len(),
        response.body
    );
    let _ = stream.write_all(raw.as_bytes());
    let _ = stream.flush();
}
