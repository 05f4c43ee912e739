use axum::http::StatusCode;
use dockwatch::{
    backend::{DashboardBackend, HttpBackend},
    models::{BackendMode, ContainerAction, ContainerState, NotificationKind},
    DockwatchError,
};
use serde_json::json;

use super::server::FakeServer;

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_status_and_lists_decode() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    let backend = HttpBackend::new(&server.config())?;

    let status = backend.fetch_status().await?;
    assert_eq!(status.mode, BackendMode::Live);
    assert_eq!(status.containers_running, 1);
    assert_eq!(status.containers_stopped, 1);
    assert_eq!(status.server_version, "24.0.7");

    let containers = backend.fetch_containers().await?;
    assert_eq!(containers.len(), 2);
    assert_eq!(containers[0].state, ContainerState::Running);
    assert_eq!(containers[1].name, "orders-db");

    let images = backend.fetch_images().await?;
    assert_eq!(images[2].tag, "grafana/grafana:10.2.0");
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_unavailable_status_is_not_a_transport_error() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| s.status = StatusCode::SERVICE_UNAVAILABLE);
    let backend = HttpBackend::new(&server.config())?;

    let error = match backend.fetch_status().await {
        Err(e) => e,
        Ok(status) => anyhow::bail!("expected unavailability, got {status:?}"),
    };

    assert!(error.is_backend_unavailable());
    assert!(error.to_string().contains("Docker daemon is not reachable"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_error_detail_is_reported() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| {
        s.logs = Err((
            StatusCode::NOT_FOUND,
            json!({ "detail": "Container not found" }),
        ))
    });
    let backend = HttpBackend::new(&server.config())?;

    match backend.fetch_logs("3f4e8a9c2b1d7e6f", 100).await {
        Err(DockwatchError::Transport {
            status, message, ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Container not found");
        }
        other => anyhow::bail!("expected a transport error, got {other:?}"),
    }
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_detail_endpoints() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    let backend = HttpBackend::new(&server.config())?;

    let stats = backend.fetch_stats("3f4e8a9c2b1d7e6f").await?;
    assert_eq!(stats.container_id, "3f4e8a9c2b1d7e6f");
    assert!(stats.is_within_bounds());

    let logs = backend.fetch_logs("3f4e8a9c2b1d7e6f", 25).await?;
    assert!(logs.contains("serving"));

    let compose = backend.fetch_descriptor("3f4e8a9c2b1d7e6f").await?;
    assert!(compose.starts_with("services:"));

    let attrs = backend.fetch_inspect("3f4e8a9c2b1d7e6f").await?;
    assert_eq!(attrs["State"]["Pid"], json!(4242));

    assert_eq!(
        server.hits(),
        vec![
            "stats:3f4e8a9c2b1d7e6f",
            "logs:3f4e8a9c2b1d7e6f:25",
            "compose:3f4e8a9c2b1d7e6f",
            "inspect:3f4e8a9c2b1d7e6f"
        ]
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_update_check_addresses_tag_with_slash() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| {
        s.updates.insert(
            "grafana/grafana:10.2.0".to_string(),
            json!({
                "image": "grafana/grafana:10.2.0",
                "available_tags": ["10.2.3", "10.3.1"],
                "has_updates": true,
                "registry": "docker.io"
            }),
        );
    });
    let backend = HttpBackend::new(&server.config())?;

    let check = backend.check_image_update("grafana/grafana:10.2.0").await?;

    assert!(check.has_updates);
    assert_eq!(check.available_tags, vec!["10.2.3", "10.3.1"]);
    assert_eq!(server.hits(), vec!["update:grafana/grafana:10.2.0"]);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_notifications_round_trip() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| {
        s.notifications = vec![json!({
            "id": "n-1",
            "type": "image_update",
            "title": "Image update available",
            "message": "A newer version of postgres:15 is available",
            "image_tag": "postgres:15",
            "timestamp": "2024-01-15T10:30:00.000001",
            "read": false
        })];
    });
    let backend = HttpBackend::new(&server.config())?;

    let remote = backend.fetch_notifications().await?;
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].kind, NotificationKind::ImageUpdate);
    assert_eq!(remote[0].image_tag.as_deref(), Some("postgres:15"));

    let local = dockwatch::models::Notification::success("Container restarted", "ok");
    backend.post_notification(&local).await?;

    let posted = server.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["id"], json!(local.id));
    assert_eq!(posted[0]["kind"], json!("success"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_action_message_fallbacks() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    let backend = HttpBackend::new(&server.config())?;

    server.script(|s| {
        s.action = (
            StatusCode::OK,
            json!({ "message": "Container web-frontend restarted" }).to_string(),
        )
    });
    let message = backend
        .container_action("3f4e8a9c2b1d7e6f", ContainerAction::Restart)
        .await?;
    assert_eq!(message, "Container web-frontend restarted");

    server.script(|s| s.action = (StatusCode::OK, "stopped\n".to_string()));
    let message = backend
        .container_action("3f4e8a9c2b1d7e6f", ContainerAction::Stop)
        .await?;
    assert_eq!(message, "stopped");

    server.script(|s| s.action = (StatusCode::CONFLICT, String::new()));
    let result = backend
        .container_action("3f4e8a9c2b1d7e6f", ContainerAction::Start)
        .await;
    assert!(matches!(
        result,
        Err(DockwatchError::Transport { status: 409, ref message, .. }) if message == "Conflict"
    ));

    assert_eq!(
        server.hits(),
        vec![
            "action:3f4e8a9c2b1d7e6f:restart",
            "action:3f4e8a9c2b1d7e6f:stop",
            "action:3f4e8a9c2b1d7e6f:start"
        ]
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_inspect_not_found() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| s.inspect = StatusCode::NOT_FOUND);
    let backend = HttpBackend::new(&server.config())?;

    match backend.fetch_inspect("gone").await {
        Err(DockwatchError::Transport {
            endpoint,
            status,
            message,
        }) => {
            assert_eq!(endpoint, "container-inspect");
            assert_eq!(status, 404);
            assert_eq!(message, "Container not found");
        }
        other => anyhow::bail!("expected a transport error, got {other:?}"),
    }
    Ok(())
}
