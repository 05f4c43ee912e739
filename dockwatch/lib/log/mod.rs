//! Logging setup.

mod rotating;

use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{DockwatchError, DockwatchResult};

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use rotating::*;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Name of the log file written below the log directory.
pub const LOG_FILE_NAME: &str = "dockwatch.log";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Without it the level is `info`, or `debug` for this crate when
/// `verbose` is set. With a `log_dir`, events are also written to a rotating `dockwatch.log` in
/// that directory; the returned log must be kept alive for as long as logging is needed.
pub async fn init_tracing(
    verbose: bool,
    log_dir: Option<&Path>,
) -> DockwatchResult<Option<RotatingLog>> {
    let default_directive = if verbose { "info,dockwatch=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let log = match log_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir).await?;
            Some(RotatingLog::new(dir.join(LOG_FILE_NAME), None).await?)
        }
        None => None,
    };

    let file_layer = log.as_ref().map(|log| {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(log.writer())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()
        .map_err(DockwatchError::custom)?;

    Ok(log)
}
