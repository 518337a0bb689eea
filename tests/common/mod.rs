//! In-process plot server used by the client tests.
//!
//! Mirrors the endpoints the client talks to: cookie sessions, per-user saved
//! plots and the translation dictionaries under `static/`.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use uuid::Uuid;

const SESSION_COOKIE: &str = "session";

#[derive(Default)]
pub struct StubState {
    users: HashMap<String, String>,
    sessions: HashMap<String, String>,
    plots: Vec<StoredPlot>,
    next_id: i64,
}

struct StoredPlot {
    id: i64,
    owner: String,
    expr: String,
    image: String,
}

type Shared = Arc<Mutex<StubState>>;

/// Handle on a running stub server
pub struct StubServer {
    pub url: String,
    state: Shared,
}

impl StubServer {
    /// Images stored for `username`, oldest first
    pub fn images_of(&self, username: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .plots
            .iter()
            .filter(|plot| plot.owner == username)
            .map(|plot| plot.image.clone())
            .collect()
    }
}

/// Starts a stub server on an ephemeral port
pub async fn spawn_server() -> StubServer {
    spawn_server_at("").await
}

/// Starts a stub server whose routes all live under `prefix` (e.g. `/plots`)
pub async fn spawn_server_at(prefix: &str) -> StubServer {
    let state: Shared = Arc::new(Mutex::new(StubState::default()));

    let routes = Router::new()
        .route("/api/current_user", get(current_user))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/list", get(list))
        .route("/save", post(save))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state.clone());
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubServer {
        url: format!("http://{}{}", addr, prefix),
        state,
    }
}

fn session_user(state: &StubState, jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.get(cookie.value()))
        .cloned()
}

fn credentials(body: &Value) -> Option<(String, String)> {
    let username = body.get("username")?.as_str()?.trim();
    let password = body.get("password")?.as_str()?;
    if username.is_empty() || password.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

fn rejected(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": error }))).into_response()
}

async fn current_user(State(state): State<Shared>, jar: CookieJar) -> Json<Value> {
    let state = state.lock().unwrap();
    let username = session_user(&state, &jar);
    Json(json!({ "user_id": username, "username": username }))
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let Some((username, password)) = credentials(&body) else {
        return rejected(StatusCode::BAD_REQUEST, "username and password required");
    };
    let mut state = state.lock().unwrap();
    if state.users.contains_key(&username) {
        return rejected(StatusCode::BAD_REQUEST, "user exists");
    }
    state.users.insert(username, password);
    Json(json!({ "ok": true })).into_response()
}

async fn login(State(state): State<Shared>, jar: CookieJar, Json(body): Json<Value>) -> Response {
    let Some((username, password)) = credentials(&body) else {
        return rejected(StatusCode::BAD_REQUEST, "username and password required");
    };
    let mut state = state.lock().unwrap();
    if state.users.get(&username) != Some(&password) {
        return rejected(StatusCode::UNAUTHORIZED, "invalid");
    }

    let session_id = Uuid::new_v4().to_string();
    state.sessions.insert(session_id.clone(), username.clone());
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id);
    cookie.set_path("/");
    (jar.add(cookie), Json(json!({ "ok": true, "username": username }))).into_response()
}

async fn logout(State(state): State<Shared>, jar: CookieJar) -> Json<Value> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.lock().unwrap().sessions.remove(cookie.value());
    }
    Json(json!({ "ok": true }))
}

async fn list(State(state): State<Shared>, jar: CookieJar) -> Json<Value> {
    let state = state.lock().unwrap();
    let Some(username) = session_user(&state, &jar) else {
        return Json(json!([]));
    };
    let plots: Vec<Value> = state
        .plots
        .iter()
        .filter(|plot| plot.owner == username)
        .map(|plot| {
            json!({
                "id": plot.id,
                "expr": plot.expr,
                "result": null,
                "created_at": format!("2024-01-01 00:00:{:02}", plot.id),
            })
        })
        .collect();
    Json(Value::Array(plots))
}

async fn save(State(state): State<Shared>, jar: CookieJar, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let Some(owner) = session_user(&state, &jar) else {
        return rejected(StatusCode::UNAUTHORIZED, "login required");
    };
    let expr = body.get("expr").and_then(Value::as_str).unwrap_or_default();
    let image = body.get("image").and_then(Value::as_str).unwrap_or_default();
    if expr.is_empty() || !image.starts_with("data:image/png;base64,") {
        return rejected(StatusCode::BAD_REQUEST, "expr and png image required");
    }

    state.next_id += 1;
    let id = state.next_id;
    state.plots.push(StoredPlot {
        id,
        owner,
        expr: expr.to_string(),
        image: image.to_string(),
    });
    Json(json!({ "ok": true, "id": id })).into_response()
}
