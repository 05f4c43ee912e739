//! Fixed fallback dataset served while the monitoring backend is unavailable.
//!
//! The world-state part (status, containers, images, compose descriptors) is deterministic so that
//! every demo refresh yields the same snapshot. Stats and logs are pseudo-random but plausible.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::json;

use crate::{
    models::{
        BackendMode, BackendStatus, Container, ContainerAction, ContainerState, ContainerStats,
        Image, StateSnapshot,
    },
    DockwatchError, DockwatchResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Version label reported by the demo status.
pub const DEMO_SERVER_VERSION: &str = "24.0.7-demo";

/// Memory limit reported for every demo container.
const DEMO_MEMORY_LIMIT: u64 = 2 * 1024 * 1024 * 1024;

const MIB: u64 = 1024 * 1024;

/// Upper bound on generated log lines.
const MAX_DEMO_LOG_LINES: usize = 20;

const DEMO_CONTAINERS: [DemoContainer; 4] = [
    (
        "7c1e4f2a9b3d5e6f7a8b9c0d",
        "edge-proxy",
        "nginx:1.25-alpine",
        ContainerState::Running,
        Some("3 days, 4:12:09"),
        &["80:80", "443:443"],
        &["NGINX_ENTRYPOINT_QUIET_LOGS=1"],
    ),
    (
        "2b8d6a0c4e1f3a5b7c9d1e2f",
        "orders-db",
        "postgres:15.4",
        ContainerState::Running,
        Some("3 days, 4:11:52"),
        &["5432:5432"],
        &["POSTGRES_DB=orders", "POSTGRES_USER=orders"],
    ),
    (
        "9f3a5c7e1b2d4f6a8c0e2a4b",
        "session-cache",
        "redis:7.2-alpine",
        ContainerState::Running,
        Some("1 day, 22:03:40"),
        &["6379:6379"],
        &[],
    ),
    (
        "4d6f8b0a2c3e5a7c9e1b3d5f",
        "report-worker",
        "node:18-slim",
        ContainerState::Exited,
        None,
        &[],
        &["NODE_ENV=production", "QUEUE=reports"],
    ),
];

/// (id, tag, created unix seconds, size, architecture)
const DEMO_IMAGES: [(&str, &str, i64, u64, &str); 5] = [
    (
        "sha256:a5967740120871bf5e0a9e8b5f6c2d1a3b4c5d6e",
        "nginx:1.25-alpine",
        1_698_796_800,
        43 * MIB,
        "amd64",
    ),
    (
        "sha256:3b6645d2c1455a3f8e9d7c6b5a4f3e2d1c0b9a8f",
        "postgres:15.4",
        1_696_118_400,
        412 * MIB,
        "amd64",
    ),
    (
        "sha256:e1a3f0c2b4d6e8f0a2c4e6b8d0f2a4c6e8b0d2f4",
        "redis:7.2-alpine",
        1_697_500_800,
        41 * MIB,
        "amd64",
    ),
    (
        "sha256:0d5e7f9a1b3c5d7e9f1a3b5c7d9e1f3a5b7c9d1e",
        "node:18-slim",
        1_694_563_200,
        244 * MIB,
        "amd64",
    ),
    (
        "sha256:c8f2e4a6b8d0f2e4a6c8e0b2d4f6a8c0e2b4d6f8",
        "grafana/grafana:10.2.0",
        1_698_192_000,
        389 * MIB,
        "amd64",
    ),
];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// (id, name, image, state, uptime, ports, environment)
type DemoContainer = (
    &'static str,
    &'static str,
    &'static str,
    ContainerState,
    Option<&'static str>,
    &'static [&'static str],
    &'static [&'static str],
);

/// Supplies the demo dataset.
#[derive(Debug, Default, Clone)]
pub struct DemoDataProvider;

#[derive(Debug, Serialize)]
struct ComposeFile<'a> {
    version: &'a str,
    services: BTreeMap<&'a str, ComposeService<'a>>,
}

#[derive(Debug, Serialize)]
struct ComposeService<'a> {
    image: &'a str,
    container_name: &'a str,
    restart: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    environment: Vec<&'a str>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DemoDataProvider {
    /// Creates a new provider.
    pub fn new() -> Self {
        Self
    }

    /// The demo status: 3 running, 1 stopped, 5 images.
    pub fn status(&self) -> BackendStatus {
        let running = DEMO_CONTAINERS
            .iter()
            .filter(|c| c.3 == ContainerState::Running)
            .count() as u32;
        let paused = DEMO_CONTAINERS
            .iter()
            .filter(|c| c.3 == ContainerState::Paused)
            .count() as u32;

        BackendStatus {
            mode: BackendMode::Demo,
            containers_running: running,
            containers_paused: paused,
            containers_stopped: DEMO_CONTAINERS.len() as u32 - running - paused,
            images: DEMO_IMAGES.len() as u32,
            server_version: DEMO_SERVER_VERSION.to_string(),
            kernel_version: Some("6.5.0-demo".to_string()),
            architecture: Some("x86_64".to_string()),
        }
    }

    /// The demo containers.
    pub fn containers(&self) -> Vec<Container> {
        DEMO_CONTAINERS
            .iter()
            .map(|&(id, name, image, state, uptime, ports, _)| Container {
                id: id.to_string(),
                name: name.to_string(),
                image: image.to_string(),
                status: state.to_string(),
                state,
                created: Some(fixed_time(1_699_000_000)),
                uptime: uptime.map(str::to_string),
                short_id: id[..12].to_string(),
                ports: Some(
                    ports
                        .iter()
                        .map(|&mapping| {
                            let (host, guest) =
                                mapping.split_once(':').unwrap_or((mapping, mapping));
                            (
                                format!("{guest}/tcp"),
                                json!([{ "HostIp": "0.0.0.0", "HostPort": host }]),
                            )
                        })
                        .collect(),
                ),
                labels: None,
            })
            .collect()
    }

    /// The demo images.
    pub fn images(&self) -> Vec<Image> {
        DEMO_IMAGES
            .iter()
            .map(|&(id, tag, created, size, architecture)| Image {
                id: id.to_string(),
                short_id: id[..19].to_string(),
                tag: tag.to_string(),
                created: fixed_time(created),
                size,
                virtual_size: size,
                architecture: architecture.to_string(),
                labels: None,
            })
            .collect()
    }

    /// The full demo snapshot.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::new(self.status(), self.containers(), self.images())
    }

    /// A plausible stats sample. Exited containers report zero usage.
    pub fn stats(&self, container_id: &str) -> DockwatchResult<ContainerStats> {
        let (_, _, _, state, ..) = find_container(container_id)?;
        let mut rng = rand::rng();

        let stats = if state == ContainerState::Running {
            let memory_usage = rng.random_range(64 * MIB..768 * MIB);
            ContainerStats {
                container_id: container_id.to_string(),
                cpu_percent: round2(rng.random_range(0.5..45.0)),
                memory_usage,
                memory_limit: DEMO_MEMORY_LIMIT,
                memory_percent: round2(memory_usage as f64 / DEMO_MEMORY_LIMIT as f64 * 100.0),
                network_rx: rng.random_range(MIB..512 * MIB),
                network_tx: rng.random_range(MIB..256 * MIB),
                block_read: rng.random_range(0..128 * MIB),
                block_write: rng.random_range(0..64 * MIB),
                timestamp: Utc::now(),
            }
        } else {
            ContainerStats {
                container_id: container_id.to_string(),
                cpu_percent: 0.0,
                memory_usage: 0,
                memory_limit: DEMO_MEMORY_LIMIT,
                memory_percent: 0.0,
                network_rx: 0,
                network_tx: 0,
                block_read: 0,
                block_write: 0,
                timestamp: Utc::now(),
            }
        };

        Ok(stats.clamped())
    }

    /// Plausible recent log lines, at most `tail` of them.
    pub fn logs(&self, container_id: &str, tail: usize) -> DockwatchResult<String> {
        let (_, name, image, state, ..) = find_container(container_id)?;
        let templates = log_templates(image);
        let count = tail.clamp(1, MAX_DEMO_LOG_LINES);
        let mut rng = rand::rng();
        let now = Utc::now();

        let mut lines: Vec<String> = (0..count)
            .map(|i| {
                let at = now - Duration::seconds(((count - i) * rng.random_range(2..30)) as i64);
                let message = templates[rng.random_range(0..templates.len())];
                format!("{} {message}", at.format("%Y-%m-%dT%H:%M:%S%.9fZ"))
            })
            .collect();

        if state == ContainerState::Exited {
            if let Some(last) = lines.last_mut() {
                *last = format!(
                    "{} {name} exited with code 1",
                    now.format("%Y-%m-%dT%H:%M:%S%.9fZ")
                );
            }
        }

        Ok(lines.join("\n"))
    }

    /// The compose descriptor for a demo container.
    pub fn compose(&self, container_id: &str) -> DockwatchResult<String> {
        let (_, name, image, _, _, ports, environment) = find_container(container_id)?;

        let file = ComposeFile {
            version: "3.8",
            services: BTreeMap::from([(
                name,
                ComposeService {
                    image,
                    container_name: name,
                    restart: "unless-stopped",
                    ports: ports.to_vec(),
                    environment: environment.to_vec(),
                },
            )]),
        };

        Ok(serde_yaml::to_string(&file)?)
    }

    /// Runtime attributes of a demo container, shaped like the runtime's inspect output.
    pub fn inspect(&self, container_id: &str) -> DockwatchResult<serde_json::Value> {
        let (id, name, image, state, _, _, environment) = find_container(container_id)?;
        let ports = self
            .containers()
            .into_iter()
            .find(|c| c.id == id)
            .and_then(|c| c.ports)
            .unwrap_or_default();
        let running = state == ContainerState::Running;

        Ok(json!({
            "Id": id,
            "Name": format!("/{name}"),
            "Created": fixed_time(1_699_000_000).to_rfc3339(),
            "State": {
                "Status": state.to_string(),
                "Running": running,
            },
            "Config": {
                "Image": image,
                "Env": environment,
            },
            "HostConfig": {
                "RestartPolicy": { "Name": "unless-stopped" },
            },
            "NetworkSettings": {
                "Ports": ports,
            },
        }))
    }

    /// The message a demo container action reports instead of calling the backend.
    pub fn action_message(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<String> {
        let (_, name, ..) = find_container(container_id)?;
        Ok(format!("Container {name} {} (demo mode)", action.past_tense()))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Finds a demo container by full id or by a prefix at least as long as a short id.
fn find_container(container_id: &str) -> DockwatchResult<DemoContainer> {
    DEMO_CONTAINERS
        .iter()
        .find(|c| {
            c.0 == container_id || (container_id.len() >= 12 && c.0.starts_with(container_id))
        })
        .copied()
        .ok_or_else(|| DockwatchError::ContainerNotFound(container_id.to_string()))
}

fn fixed_time(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn log_templates(image: &str) -> &'static [&'static str] {
    let repository = image.split(':').next().unwrap_or(image);
    match repository {
        "nginx" => &[
            "172.18.0.1 - - \"GET / HTTP/1.1\" 200 615",
            "172.18.0.1 - - \"GET /healthz HTTP/1.1\" 200 2",
            "172.18.0.7 - - \"POST /api/orders HTTP/1.1\" 201 88",
            "[warn] upstream response is buffered to a temporary file",
        ],
        "postgres" => &[
            "LOG:  checkpoint starting: time",
            "LOG:  checkpoint complete: wrote 42 buffers (0.3%)",
            "LOG:  automatic vacuum of table \"orders.public.line_items\"",
        ],
        "redis" => &[
            "* 100 changes in 300 seconds. Saving...",
            "* Background saving started",
            "* DB saved on disk",
            "* Background saving terminated with success",
        ],
        _ => &[
            "info: picked job from queue",
            "info: job finished in 412ms",
            "warn: retrying job after transient failure",
        ],
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
