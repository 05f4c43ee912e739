use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dockwatch::config::EngineConfig;
use serde::Deserialize;
use serde_json::{json, Value};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A monitoring backend on a random local port whose replies are scripted per test.
pub struct FakeServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

/// What the fake backend answers.
#[derive(Debug, Clone)]
pub struct Script {
    pub status: StatusCode,
    pub containers: Vec<Value>,
    pub images: Vec<Value>,
    pub logs: Result<String, (StatusCode, Value)>,
    pub inspect: StatusCode,
    pub updates: HashMap<String, Value>,
    pub notifications: Vec<Value>,
    pub action: (StatusCode, String),
}

#[derive(Debug)]
struct Shared {
    script: Mutex<Script>,
    hits: Mutex<Vec<String>>,
    posted: Mutex<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    tail: Option<usize>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FakeServer {
    /// Binds to `127.0.0.1:0` and serves until the test's runtime shuts down.
    pub async fn start() -> anyhow::Result<Self> {
        let shared = Arc::new(Shared {
            script: Mutex::new(Script::default()),
            hits: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/api/docker/status", get(status_handler))
            .route("/api/containers", get(containers_handler))
            .route("/api/containers/{id}/stats", get(stats_handler))
            .route("/api/containers/{id}/logs", get(logs_handler))
            .route("/api/containers/{id}/compose", get(compose_handler))
            .route("/api/containers/{id}/inspect", get(inspect_handler))
            .route("/api/containers/{id}/{action}", post(action_handler))
            .route("/api/images", get(images_handler))
            .route("/api/images/{tag}/check-updates", get(update_handler))
            .route(
                "/api/notifications",
                get(notifications_handler).post(post_notification_handler),
            )
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "fake backend stopped");
            }
        });

        Ok(Self { addr, shared })
    }

    /// An engine configuration pointing at this server. Transient failures are not retried so
    /// scripted errors surface immediately.
    pub fn config(&self) -> EngineConfig {
        EngineConfig::builder()
            .backend_url(format!("http://{}", self.addr))
            .request_timeout(Duration::from_secs(5))
            .max_retries(0)
            .build()
    }

    /// Changes the script.
    pub fn script(&self, f: impl FnOnce(&mut Script)) {
        f(&mut lock(&self.shared.script));
    }

    /// Requests served so far, e.g. `status`, `logs:abc:100`, `action:abc:restart`.
    pub fn hits(&self) -> Vec<String> {
        lock(&self.shared.hits).clone()
    }

    pub fn count_hits(&self, name: &str) -> usize {
        lock(&self.shared.hits)
            .iter()
            .filter(|h| *h == name)
            .count()
    }

    /// Bodies received on `POST /api/notifications`.
    pub fn posted(&self) -> Vec<Value> {
        lock(&self.shared.posted).clone()
    }
}

impl Shared {
    fn hit(&self, name: impl Into<String>) -> Script {
        lock(&self.hits).push(name.into());
        lock(&self.script).clone()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn container(id: &str, name: &str, image: &str, state: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "image": image,
        "status": state,
        "state": state,
        "created": "2024-01-15T10:30:00",
        "short_id": &id[..id.len().min(12)],
        "ports": {},
        "labels": {}
    })
}

pub fn image(id: &str, tag: &str) -> Value {
    json!({
        "id": id,
        "short_id": &id[..id.len().min(12)],
        "tag": tag,
        "created": "2024-01-10T08:00:00Z",
        "size": 187_000_000u64,
        "virtual_size": 187_000_000u64,
        "architecture": "amd64"
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Handlers
//--------------------------------------------------------------------------------------------------

async fn status_handler(State(shared): State<Arc<Shared>>) -> Response {
    let script = shared.hit("status");
    if script.status != StatusCode::OK {
        return (
            script.status,
            Json(json!({ "detail": "Docker daemon is not reachable" })),
        )
            .into_response();
    }

    Json(json!({
        "status": "connected",
        "containers_running": script.containers.iter().filter(|c| c["state"] == "running").count(),
        "containers_paused": 0,
        "containers_stopped": script.containers.iter().filter(|c| c["state"] != "running").count(),
        "images": script.images.len(),
        "server_version": "24.0.7",
        "kernel_version": "6.5.0",
        "architecture": "x86_64"
    }))
    .into_response()
}

async fn containers_handler(State(shared): State<Arc<Shared>>) -> Response {
    let script = shared.hit("containers");
    Json(json!({ "containers": script.containers })).into_response()
}

async fn images_handler(State(shared): State<Arc<Shared>>) -> Response {
    let script = shared.hit("images");
    Json(json!({ "images": script.images })).into_response()
}

async fn stats_handler(State(shared): State<Arc<Shared>>, Path(id): Path<String>) -> Response {
    shared.hit(format!("stats:{id}"));
    Json(json!({
        "container_id": id,
        "cpu_percent": 3.5,
        "memory_usage": 268_435_456u64,
        "memory_limit": 1_073_741_824u64,
        "memory_percent": 25.0,
        "network_rx": 1024,
        "network_tx": 2048,
        "block_read": 0,
        "block_write": 0,
        "timestamp": "2024-01-15T10:30:00.123456"
    }))
    .into_response()
}

async fn logs_handler(
    State(shared): State<Arc<Shared>>,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let tail = query.tail.map(|t| t.to_string()).unwrap_or_default();
    let script = shared.hit(format!("logs:{id}:{tail}"));
    match script.logs {
        Ok(logs) => Json(json!({ "container_id": id, "logs": logs, "tail": query.tail }))
            .into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

async fn compose_handler(State(shared): State<Arc<Shared>>, Path(id): Path<String>) -> Response {
    shared.hit(format!("compose:{id}"));
    Json(json!({
        "container_id": id,
        "compose": format!("services:\n  {id}:\n    restart: unless-stopped\n")
    }))
    .into_response()
}

async fn inspect_handler(State(shared): State<Arc<Shared>>, Path(id): Path<String>) -> Response {
    let script = shared.hit(format!("inspect:{id}"));
    if script.inspect != StatusCode::OK {
        return (
            script.inspect,
            Json(json!({ "detail": "Container not found" })),
        )
            .into_response();
    }

    Json(json!({
        "container_id": id,
        "inspect": {
            "Id": id,
            "State": { "Status": "running", "Running": true, "Pid": 4242 },
            "Config": { "Image": "nginx:1.25-alpine" }
        }
    }))
    .into_response()
}

async fn update_handler(State(shared): State<Arc<Shared>>, Path(tag): Path<String>) -> Response {
    let script = shared.hit(format!("update:{tag}"));
    let reply = script.updates.get(&tag).cloned().unwrap_or_else(|| {
        json!({ "image": tag, "available_tags": [], "has_updates": false, "registry": "docker.io" })
    });
    Json(reply).into_response()
}

async fn notifications_handler(State(shared): State<Arc<Shared>>) -> Response {
    let script = shared.hit("notifications");
    Json(json!({ "notifications": script.notifications })).into_response()
}

async fn post_notification_handler(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<Value>,
) -> Response {
    shared.hit("post-notification");
    lock(&shared.posted).push(body);
    Json(json!({ "status": "ok" })).into_response()
}

async fn action_handler(
    State(shared): State<Arc<Shared>>,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    let script = shared.hit(format!("action:{id}:{action}"));
    let (status, body) = script.action;
    (status, body).into_response()
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Script {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            containers: vec![
                container("3f4e8a9c2b1d7e6f", "web-frontend", "nginx:1.25-alpine", "running"),
                container("8a7b6c5d4e3f2a1b", "orders-db", "postgres:15", "exited"),
            ],
            images: vec![
                image("sha256:1a2b3c4d5e6f7a8b", "nginx:1.25-alpine"),
                image("sha256:2b3c4d5e6f7a8b9c", "postgres:15"),
                image("sha256:3c4d5e6f7a8b9c0d", "grafana/grafana:10.2.0"),
            ],
            logs: Ok("2024-01-15 10:30:00 ready\n2024-01-15 10:30:01 serving".to_string()),
            inspect: StatusCode::OK,
            updates: HashMap::new(),
            notifications: Vec::new(),
            action: (StatusCode::OK, json!({ "message": "ok" }).to_string()),
        }
    }
}
