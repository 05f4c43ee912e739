use axum::http::StatusCode;
use dockwatch::{
    demo::DemoDataProvider,
    engine::{Engine, EngineEvent},
    models::{BackendMode, ContainerAction, NotificationKind},
};
use serde_json::json;

use super::server::{container, FakeServer};

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_unavailable_backend_switches_to_demo_data() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| s.status = StatusCode::SERVICE_UNAVAILABLE);
    let engine = Engine::connect(server.config())?;

    let snapshot = engine.refresh_world_state().await?;

    assert_eq!(snapshot.mode(), BackendMode::Demo);
    assert_eq!(snapshot.containers, DemoDataProvider::new().containers());
    assert!(engine.last_failure().is_none());
    assert_eq!(server.hits(), vec!["status"]);

    // Demo mode never polls backend notifications.
    assert_eq!(engine.refresh_notifications().await?, 0);
    assert_eq!(server.count_hits("notifications"), 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_failed_refresh_keeps_last_snapshot() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    let engine = Engine::connect(server.config())?;
    let mut events = engine.subscribe();

    let loaded = engine.refresh_world_state().await?;
    assert_eq!(loaded.mode(), BackendMode::Live);
    assert_eq!(loaded.containers.len(), 2);

    server.script(|s| s.status = StatusCode::INTERNAL_SERVER_ERROR);
    let error = match engine.refresh_world_state().await {
        Err(e) => e,
        Ok(snapshot) => anyhow::bail!("expected a failure, got {snapshot:?}"),
    };

    assert!(error.is_transport());
    assert_eq!(engine.snapshot().generation(), loaded.generation());
    assert_eq!(engine.snapshot().containers, loaded.containers);
    assert!(engine.last_failure().is_some());

    assert!(matches!(
        events.recv().await?,
        EngineEvent::SnapshotUpdated { mode: BackendMode::Live, .. }
    ));
    assert!(matches!(
        events.recv().await?,
        EngineEvent::RefreshFailed { initial_load: false, .. }
    ));

    server.script(|s| s.status = StatusCode::OK);
    let recovered = engine.refresh_world_state().await?;
    assert!(recovered.generation() > loaded.generation());
    assert!(engine.last_failure().is_none());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_restart_refreshes_and_notifies() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    let engine = Engine::connect(server.config())?;
    engine.refresh_world_state().await?;

    server.script(|s| {
        s.action = (
            StatusCode::OK,
            json!({ "message": "Container orders-db restarted" }).to_string(),
        );
        s.containers[1] = container("8a7b6c5d4e3f2a1b", "orders-db", "postgres:15", "running");
    });

    let outcome = engine
        .perform_action("8a7b6c5d4e3f2a1b", ContainerAction::Restart)
        .await?;

    assert!(outcome.refreshed());
    assert_eq!(outcome.message, "Container orders-db restarted");
    assert_eq!(server.count_hits("action:8a7b6c5d4e3f2a1b:restart"), 1);
    assert_eq!(server.count_hits("containers"), 2);

    let snapshot = engine.snapshot();
    let restarted = snapshot.container("8a7b6c5d4e3f2a1b");
    assert!(restarted.is_some_and(|c| c.is_running()));

    let notifications = engine.notifications().await;
    assert_eq!(notifications[0].kind, NotificationKind::Success);
    assert_eq!(engine.unread_count().await, 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_failed_logs_give_partial_detail() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| {
        s.logs = Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "detail": "log driver does not support reading" }),
        ))
    });
    let engine = Engine::connect(server.config())?;
    engine.refresh_world_state().await?;

    let detail = engine.open_detail("3f4e8a9c2b1d7e6f").await;

    assert!(detail.is_settled());
    assert!(detail.stats.is_ready());
    assert!(detail.descriptor.is_ready());
    assert_eq!(
        detail.inspect.value().map(|attrs| attrs["Id"].clone()),
        Some(json!("3f4e8a9c2b1d7e6f"))
    );
    assert!(detail
        .logs
        .error()
        .is_some_and(|e| e.contains("log driver does not support reading")));
    assert_eq!(server.count_hits("logs:3f4e8a9c2b1d7e6f:100"), 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_update_check_announces_each_tag_once() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| {
        s.updates.insert(
            "grafana/grafana:10.2.0".to_string(),
            json!({
                "image": "grafana/grafana:10.2.0",
                "available_tags": ["10.2.3"],
                "has_updates": true
            }),
        );
        s.updates.insert(
            "postgres:15".to_string(),
            json!({ "image": "postgres:15", "error": "registry rate limit exceeded" }),
        );
    });
    let engine = Engine::connect(server.config())?;
    engine.refresh_world_state().await?;

    let pass = engine
        .evaluate_update_trigger()
        .await
        .ok_or_else(|| anyhow::anyhow!("the first image list should trigger a pass"))?;

    assert_eq!(
        pass.checked,
        vec!["nginx:1.25-alpine", "postgres:15", "grafana/grafana:10.2.0"]
    );
    assert_eq!(pass.newly_available, vec!["grafana/grafana:10.2.0"]);
    assert_eq!(pass.failed.len(), 1);
    assert_eq!(pass.failed[0].0, "postgres:15");

    let availability = engine.update_availability().await;
    assert!(availability["grafana/grafana:10.2.0"].has_update);
    assert!(!availability["nginx:1.25-alpine"].has_update);
    assert!(!availability.contains_key("postgres:15"));

    let posted = server.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["image_tag"], json!("grafana/grafana:10.2.0"));

    // Same image list: no new pass.
    engine.refresh_world_state().await?;
    assert!(engine.evaluate_update_trigger().await.is_none());
    assert_eq!(server.count_hits("update:grafana/grafana:10.2.0"), 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_backend_notifications_merge_once() -> anyhow::Result<()> {
    let server = FakeServer::start().await?;
    server.script(|s| {
        s.notifications = vec![
            json!({
                "id": "n-1",
                "type": "info",
                "title": "Backend started",
                "message": "Monitoring backend is up",
                "timestamp": "2024-01-15T10:00:00"
            }),
            json!({
                "id": "n-2",
                "type": "image_update",
                "title": "Image update available",
                "message": "A newer version of nginx:1.25-alpine is available",
                "image_tag": "nginx:1.25-alpine",
                "timestamp": "2024-01-15T11:00:00",
                "read": true
            }),
        ];
    });
    let engine = Engine::connect(server.config())?;
    engine.refresh_world_state().await?;

    assert_eq!(engine.refresh_notifications().await?, 2);
    assert_eq!(engine.refresh_notifications().await?, 0);

    let list = engine.notifications().await;
    assert_eq!(list[0].id, "n-2");
    assert_eq!(list[1].id, "n-1");
    assert_eq!(engine.unread_count().await, 1);

    assert!(engine.mark_read("n-1").await);
    assert_eq!(engine.unread_count().await, 0);
    Ok(())
}
