//! A size-rotating log file for the tracing subscriber.
//!
//! Formatted events are handed to a background task over a channel, so emitting a log line never
//! blocks on file I/O. When the file would grow past its limit it is renamed to `.old` and a fresh
//! file is started.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use tokio::{
    fs::{remove_file, rename, File, OpenOptions},
    io::AsyncWriteExt,
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    task::JoinHandle,
};
use tracing_subscriber::fmt::MakeWriter;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A log file that is rotated once it reaches a maximum size. The previous file is kept with an
/// `.old` extension.
pub struct RotatingLog {
    path: PathBuf,
    tx: UnboundedSender<LogMessage>,
    _task: JoinHandle<()>,
}

/// A cheap, cloneable `Write` handle feeding a [`RotatingLog`].
#[derive(Debug, Clone)]
pub struct LogWriter {
    tx: UnboundedSender<LogMessage>,
}

#[derive(Debug)]
enum LogMessage {
    Data(Vec<u8>),
    Flush(oneshot::Sender<()>),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl RotatingLog {
    /// Default maximum log file size (10MB)
    pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

    /// Opens `path` for appending, creating it if needed.
    pub async fn new(path: impl AsRef<Path>, max_size: Option<u64>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path).await?;
        let size = file.metadata().await?.len();
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(write_loop(
            rx,
            file,
            path.clone(),
            size,
            max_size.unwrap_or(Self::DEFAULT_MAX_SIZE),
        ));

        Ok(Self {
            path,
            tx,
            _task: task,
        })
    }

    /// A writer for this log.
    pub fn writer(&self) -> LogWriter {
        LogWriter {
            tx: self.tx.clone(),
        }
    }

    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits until everything written before this call is on disk.
    pub async fn flush(&self) -> io::Result<()> {
        let (done, flushed) = oneshot::channel();
        self.tx
            .send(LogMessage::Flush(done))
            .map_err(|_| io::Error::other("log file writer has shut down"))?;
        flushed
            .await
            .map_err(|_| io::Error::other("log file writer has shut down"))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

async fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}

/// Moves the current file to `.old` and swaps in a fresh one. On error `file` still refers to the
/// file that was open before.
async fn rotate(file: &mut File, path: &Path) -> io::Result<()> {
    file.sync_all().await?;

    let backup_path = path.with_extension("old");
    if backup_path.exists() {
        remove_file(&backup_path).await?;
    }
    rename(path, &backup_path).await?;

    *file = open_append(path).await?;
    Ok(())
}

async fn write_loop(
    mut rx: UnboundedReceiver<LogMessage>,
    mut file: File,
    path: PathBuf,
    mut size: u64,
    max_size: u64,
) {
    while let Some(message) = rx.recv().await {
        let data = match message {
            LogMessage::Data(data) => data,
            LogMessage::Flush(done) => {
                if let Err(e) = file.flush().await {
                    eprintln!("failed to flush log file: {e}");
                }
                let _ = done.send(());
                continue;
            }
        };
        let len = data.len() as u64;

        if size > 0 && size + len > max_size {
            // A failed rotation keeps appending to the current file.
            match rotate(&mut file, &path).await {
                Ok(()) => size = 0,
                Err(e) => eprintln!("failed to rotate log file: {e}"),
            }
        }

        match file.write_all(&data).await {
            Ok(()) => size += len,
            Err(e) => eprintln!("failed to write to log file: {e}"),
        }
    }

    let _ = file.flush().await;
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .send(LogMessage::Data(buf.to_vec()))
            .map_err(|_| io::Error::other("log file writer has shut down"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
