//! `dockwatch` keeps a dashboard's view of a Docker host in sync with a monitoring backend that
//! may be slow, failing or absent.
//!
//! # Overview
//!
//! The engine polls a REST backend for the host's containers, images and notifications and
//! publishes each complete result as an immutable [`StateSnapshot`](models::StateSnapshot). It
//! handles:
//! - Independent polling timers for world state, notifications and update checks
//! - Out-of-order refresh cycles, where only the newest cycle's result is published
//! - Falling back to a fixed demo dataset while the backend reports itself unavailable
//! - Edge-triggered image update checks that announce each update once
//! - Per-container detail with independently failing fields
//! - Start, stop and restart actions followed by a confirming refresh
//!
//! # Architecture
//!
//! - **Backend**: [`DashboardBackend`](backend::DashboardBackend) and its HTTP implementation
//! - **Sources**: live and demo data behind one [`DataSource`](source::DataSource) trait
//! - **State**: generation-ordered snapshot publication
//! - **Engine**: the operations a UI calls
//! - **Scheduler**: the polling loops driving the engine
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dockwatch::{config::EngineConfig, engine::Engine, scheduler::PollingScheduler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::builder()
//!         .backend_url("http://localhost:8001")
//!         .build();
//!
//!     let engine = Arc::new(Engine::connect(config)?);
//!     let scheduler = PollingScheduler::new(engine.clone());
//!     scheduler.start().await?;
//!
//!     let mut snapshots = engine.watch_snapshots();
//!     snapshots.changed().await?;
//!     println!("{} containers", snapshots.borrow().containers.len());
//!
//!     scheduler.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`backend`] - The monitoring backend client
//! - [`config`] - Engine configuration and validation
//! - [`demo`] - The fallback dataset
//! - [`engine`] - The engine facade
//! - [`scheduler`] - Polling loops
//! - [`cli`] - Command-line interface and argument parsing

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod actions;
pub mod backend;
pub mod cli;
pub mod config;
pub mod demo;
pub mod detail;
pub mod engine;
pub mod fetcher;
pub mod log;
pub mod models;
pub mod notifications;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod updates;
pub mod utils;

pub use error::*;
