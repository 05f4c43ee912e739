use std::sync::Arc;

use clap::{CommandFactory, Parser};
use dockwatch::{
    cli::{AnsiStyles, DockwatchArgs, DockwatchSubcommand},
    config::EngineConfig,
    detail::DetailField,
    engine::{Engine, EngineEvent},
    log,
    models::{BackendMode, ContainerAction, StateSnapshot},
    scheduler::PollingScheduler,
    DockwatchResult,
};
use tokio::sync::broadcast::error::RecvError;

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> DockwatchResult<()> {
    let args = DockwatchArgs::parse();
    let rotating = log::init_tracing(args.verbose, args.log_dir.as_deref()).await?;

    let Some(subcommand) = args.subcommand else {
        DockwatchArgs::command().print_help()?;
        return Ok(());
    };

    let mut config = EngineConfig::from_env()?;
    if let Some(url) = args.backend_url {
        config.set_backend_url(url);
    }
    tracing::debug!(?config, "loaded configuration");

    let engine = Arc::new(Engine::connect(config)?);
    let result = match subcommand {
        DockwatchSubcommand::Watch => watch(engine).await,
        DockwatchSubcommand::Status => status(&engine).await,
        DockwatchSubcommand::Detail { id } => detail(&engine, &id).await,
        DockwatchSubcommand::Action { id, action } => action_cmd(&engine, &id, action).await,
        DockwatchSubcommand::Notifications { unread } => notifications(&engine, unread).await,
    };

    if let Some(rotating) = rotating {
        rotating.flush().await?;
    }

    result
}

//--------------------------------------------------------------------------------------------------
// Functions: Subcommands
//--------------------------------------------------------------------------------------------------

async fn watch(engine: Arc<Engine>) -> DockwatchResult<()> {
    let mut events = engine.subscribe();
    let scheduler = PollingScheduler::new(engine.clone());
    scheduler.start().await?;

    tracing::info!(backend = %engine.config().backend_url(), "watching, press ctrl-c to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => print_event(&engine, event).await,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event printer fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    scheduler.stop().await
}

async fn status(engine: &Engine) -> DockwatchResult<()> {
    let snapshot = engine.refresh_world_state().await?;
    print_snapshot(&snapshot);
    Ok(())
}

async fn detail(engine: &Engine, id: &str) -> DockwatchResult<()> {
    load_mode(engine).await;

    let detail = engine.open_detail(id).await;
    println!("{} {} ({})", "container".header(), detail.container_id, detail.mode);

    println!("\n{}", "stats".header());
    match &detail.stats {
        DetailField::Ready(stats) => println!(
            "  cpu {:.1}%  memory {:.1}% ({} / {} bytes)  net rx {} tx {}",
            stats.cpu_percent,
            stats.memory_percent,
            stats.memory_usage,
            stats.memory_limit,
            stats.network_rx,
            stats.network_tx
        ),
        other => print_unavailable(other),
    }

    println!("\n{}", "logs".header());
    match &detail.logs {
        DetailField::Ready(logs) => println!("{logs}"),
        other => print_unavailable(other),
    }

    println!("\n{}", "compose".header());
    match &detail.descriptor {
        DetailField::Ready(descriptor) => println!("{descriptor}"),
        other => print_unavailable(other),
    }

    println!("\n{}", "inspect".header());
    match &detail.inspect {
        DetailField::Ready(attrs) => println!("{}", serde_json::to_string_pretty(attrs)?),
        other => print_unavailable(other),
    }

    Ok(())
}

async fn action_cmd(engine: &Engine, id: &str, action: ContainerAction) -> DockwatchResult<()> {
    load_mode(engine).await;

    match engine.perform_action(id, action).await {
        Ok(outcome) => {
            println!("{}", outcome.message.valid());
            if outcome.mode == BackendMode::Demo {
                println!("{}", "(demo mode, nothing was changed)".placeholder());
            }
            if let Some(Err(e)) = &outcome.refresh {
                eprintln!("{}", format!("refresh after {action} failed: {e}").error());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("failed to {action} container: {e}").error());
            Err(e)
        }
    }
}

async fn notifications(engine: &Engine, unread_only: bool) -> DockwatchResult<()> {
    load_mode(engine).await;
    if let Err(e) = engine.refresh_notifications().await {
        eprintln!("{}", format!("could not load notifications: {e}").error());
    }

    let list = engine.notifications().await;
    let shown: Vec<_> = list.iter().filter(|n| !unread_only || !n.read).collect();
    if shown.is_empty() {
        println!("{}", "no notifications".placeholder());
        return Ok(());
    }

    for n in shown {
        let marker = if n.read { " " } else { "*" };
        println!(
            "{marker} {} [{}] {}: {}",
            n.created_at.format("%Y-%m-%d %H:%M:%S"),
            n.kind,
            n.title.literal(),
            n.message
        );
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Loads one snapshot so later calls know whether to use live or demo data.
async fn load_mode(engine: &Engine) {
    if let Err(e) = engine.refresh_world_state().await {
        eprintln!("{}", format!("could not load state: {e}").error());
    }
}

async fn print_event(engine: &Engine, event: EngineEvent) {
    match event {
        EngineEvent::SnapshotUpdated { .. } => print_snapshot(&engine.snapshot()),
        EngineEvent::RefreshFailed {
            message,
            initial_load,
        } => {
            let prefix = if initial_load {
                "initial load failed"
            } else {
                "refresh failed, showing last known state"
            };
            eprintln!("{}", format!("{prefix}: {message}").error());
        }
        EngineEvent::UpdatesFound { tags } => {
            for tag in tags {
                println!("{} {}", "update available".valid(), tag.literal());
            }
        }
        EngineEvent::NotificationsChanged { unread } => {
            println!("{} {unread}", "unread notifications:".header());
            if let Some(latest) = engine.notifications().await.first() {
                println!("  latest: {}: {}", latest.title, latest.message);
            }
        }
    }
}

fn print_snapshot(snapshot: &StateSnapshot) {
    let status = &snapshot.status;
    println!(
        "{} {} (docker {}) {} running, {} paused, {} stopped",
        "host".header(),
        snapshot.mode(),
        status.server_version,
        status.containers_running,
        status.containers_paused,
        status.containers_stopped
    );

    println!("{}", "containers".header());
    for c in &snapshot.containers {
        println!(
            "  {:<12} {:<24} {:<8} {}",
            c.short_id,
            c.name.literal(),
            c.state.to_string(),
            c.image
        );
    }

    println!("{}", "images".header());
    for i in &snapshot.images {
        println!("  {:<12} {:<40} {} bytes", i.short_id, i.tag, i.size);
    }
}

fn print_unavailable<T>(field: &DetailField<T>) {
    match field {
        DetailField::Failed(e) => println!("  {}", format!("unavailable: {e}").error()),
        _ => println!("  {}", "loading".placeholder()),
    }
}
