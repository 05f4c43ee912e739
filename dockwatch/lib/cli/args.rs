use std::path::PathBuf;

use clap::Parser;

use crate::models::ContainerAction;

use super::styles;

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// Dockwatch CLI - keeps a dashboard view of a Docker host in sync with its monitoring backend
#[derive(Debug, Parser)]
#[command(name = "dockwatch", author, about, version, styles=styles::styles())]
pub struct DockwatchArgs {
    /// The subcommand to run
    #[command(subcommand)]
    pub subcommand: Option<DockwatchSubcommand>,

    /// Base URL of the monitoring backend. Overrides `DOCKWATCH_BACKEND_URL`
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to a rotating file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Available subcommands
#[derive(Debug, Parser)]
pub enum DockwatchSubcommand {
    /// Poll the backend continuously and print every state change
    #[command(name = "watch")]
    Watch,

    /// Run one refresh cycle and print the containers and images
    #[command(name = "status")]
    Status,

    /// Print stats, logs and deployment descriptor of one container
    #[command(name = "detail")]
    Detail {
        /// Container ID, or an ID prefix of at least 12 characters
        #[arg(required = true)]
        id: String,
    },

    /// Start, stop or restart a container
    #[command(name = "action")]
    Action {
        /// Container ID
        #[arg(required = true)]
        id: String,

        /// One of `start`, `stop` or `restart`
        #[arg(required = true)]
        action: ContainerAction,
    },

    /// List notifications, most recent first
    #[command(name = "notifications")]
    Notifications {
        /// Only show unread notifications
        #[arg(short, long)]
        unread: bool,
    },
}

//-------------------------------------------------------------------------------------------------
// Tests
//-------------------------------------------------------------------------------------------------
