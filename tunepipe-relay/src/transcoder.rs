//! Transcoder process management
//!
//! Each stream request owns exactly one transcoder (ffmpeg) process. The
//! process reads the playable URL with reconnection enabled, drops any video
//! and writes constant-bitrate MP3 to stdout.
//!
//! ## Lifecycle
//!
//! ```text
//! spawn() ──> [Piping] ──> stdout EOF ──> supervisor waits, logs exit status
//!                 │
//!                 └──> TranscodeStream dropped ──> supervisor kills + reaps
//! ```
//!
//! The supervisor task owns the `Child`. `TranscodeStream` owns the stdout
//! pipe and a cancellation guard, so dropping the response body (client
//! disconnect, body error, early return) always terminates the process.
//!
//! ## Backpressure
//!
//! stdout is only read when the HTTP body is polled. A slow client therefore
//! fills the OS pipe and blocks the transcoder's writes instead of growing a
//! buffer in the relay.

use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::io::ReaderStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};
use tunepipe_common::api::types::required_url;
use tunepipe_common::Config;
use uuid::Uuid;

/// Read size for the stdout pipe
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// How long a transcoder may linger after closing stdout before it is killed
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Upper bound for ffmpeg's own reconnect back-off, in seconds
const RECONNECT_DELAY_MAX_SECS: u32 = 5;

/// Transcoder errors
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transcoder not found: {0}")]
    TranscoderNotFound(PathBuf),

    #[error("Failed to spawn transcoder: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Transcoder exited with {0}")]
    ProcessFailure(ExitStatus),
}

/// Spawns one transcoder process per stream
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: PathBuf,
    bitrate_kbps: u32,
}

impl Transcoder {
    pub fn new(program: impl Into<PathBuf>, bitrate_kbps: u32) -> Self {
        Self {
            program: program.into(),
            bitrate_kbps,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.transcoder_path.clone(), config.bitrate_kbps)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Fixed argument set for one input URL
    pub fn args(&self, input_url: &str) -> Vec<String> {
        let reconnect_delay_max = RECONNECT_DELAY_MAX_SECS.to_string();
        let bitrate = format!("{}k", self.bitrate_kbps);

        [
            "-hide_banner",
            "-loglevel",
            "warning",
            // Read input at its native rate so live sources are not drained in bursts
            "-re",
            "-reconnect",
            "1",
            "-reconnect_streamed",
            "1",
            "-reconnect_delay_max",
            reconnect_delay_max.as_str(),
            "-i",
            input_url,
            "-vn",
            "-c:a",
            "libmp3lame",
            "-b:a",
            bitrate.as_str(),
            "-f",
            "mp3",
            "pipe:1",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect()
    }

    /// Check that the transcoder binary runs at all
    ///
    /// Used at startup to warn early; an unavailable binary does not stop the relay.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Start transcoding `input_url`
    ///
    /// Blank input fails before anything is spawned. The returned stream yields
    /// the transcoder's stdout in order and ends when the process closes it.
    pub fn spawn(&self, input_url: &str) -> Result<TranscodeStream, TranscodeError> {
        let input_url = required_url("url", Some(input_url))
            .map_err(|_| TranscodeError::InvalidInput("url is required".to_string()))?;

        let stream_id = Uuid::new_v4();

        let mut child = Command::new(&self.program)
            .args(self.args(input_url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::TranscoderNotFound(self.program.clone())
                } else {
                    TranscodeError::Spawn(e)
                }
            })?;

        info!(
            stream_id = %stream_id,
            pid = ?child.id(),
            url = %input_url,
            bitrate_kbps = self.bitrate_kbps,
            "Transcoder started"
        );

        let stdout = child.stdout.take().ok_or_else(|| {
            TranscodeError::Spawn(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "transcoder stdout not captured",
            ))
        })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr, stream_id));
        }

        let cancel = CancellationToken::new();
        let drained = CancellationToken::new();
        tokio::spawn(supervise(child, stream_id, cancel.clone(), drained.clone()));

        Ok(TranscodeStream::new(stream_id, stdout, cancel, drained))
    }
}

/// Forward transcoder diagnostics to the log, never to the client
///
/// Lines are read as raw bytes: ffmpeg echoes titles and URLs verbatim, so a
/// line need not be UTF-8. The pipe is drained until EOF so the transcoder
/// never blocks or dies on a closed stderr.
async fn log_stderr(stderr: ChildStderr, stream_id: Uuid) {
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim_end_matches(['\r', '\n']);
                if !text.is_empty() {
                    warn!(target: "ffmpeg", stream_id = %stream_id, "{}", text);
                }
            }
            Err(e) => {
                debug!(stream_id = %stream_id, error = %e, "Stopped reading transcoder stderr");
                break;
            }
        }
    }
}

/// Own the child until it has exited and been reaped
async fn supervise(
    mut child: Child,
    stream_id: Uuid,
    cancel: CancellationToken,
    drained: CancellationToken,
) {
    tokio::select! {
        biased;

        status = child.wait() => report_exit(stream_id, status),

        _ = cancel.cancelled() => {
            // The process may have exited on its own just before the client left
            match child.try_wait() {
                Ok(Some(status)) => report_exit(stream_id, Ok(status)),
                _ => {
                    info!(stream_id = %stream_id, "Stream closed before transcoder finished, terminating");
                    terminate(&mut child, stream_id).await;
                }
            }
        }

        _ = drained.cancelled() => {
            match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                Ok(status) => report_exit(stream_id, status),
                Err(_) => {
                    warn!(stream_id = %stream_id, "Transcoder closed stdout but did not exit, terminating");
                    terminate(&mut child, stream_id).await;
                }
            }
        }
    }
}

async fn terminate(child: &mut Child, stream_id: Uuid) {
    if let Err(e) = child.kill().await {
        warn!(stream_id = %stream_id, error = %e, "Failed to kill transcoder");
    } else {
        debug!(stream_id = %stream_id, "Transcoder terminated");
    }
}

fn report_exit(stream_id: Uuid, status: std::io::Result<ExitStatus>) {
    match status {
        Ok(status) if status.success() => {
            info!(stream_id = %stream_id, "Transcoder finished");
        }
        Ok(status) => {
            let err = TranscodeError::ProcessFailure(status);
            error!(stream_id = %stream_id, "{}", err);
        }
        Err(e) => {
            error!(stream_id = %stream_id, error = %e, "Failed to wait for transcoder");
        }
    }
}

/// Transcoder stdout as a byte stream
///
/// Dropping the stream before EOF terminates the process.
pub struct TranscodeStream {
    stream_id: Uuid,
    inner: ReaderStream<ChildStdout>,
    cancel_on_drop: Option<DropGuard>,
    drained: CancellationToken,
}

impl TranscodeStream {
    fn new(
        stream_id: Uuid,
        stdout: ChildStdout,
        cancel: CancellationToken,
        drained: CancellationToken,
    ) -> Self {
        Self {
            stream_id,
            inner: ReaderStream::with_capacity(stdout, READ_CHUNK_BYTES),
            cancel_on_drop: Some(cancel.drop_guard()),
            drained,
        }
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }
}

impl Stream for TranscodeStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = Pin::new(&mut self.inner).poll_next(cx);

        if let Poll::Ready(None) = polled {
            // EOF: let the supervisor collect the exit status instead of killing
            if let Some(guard) = self.cancel_on_drop.take() {
                guard.disarm();
                self.drained.cancel();
                debug!(stream_id = %self.stream_id, "Transcoder output drained");
            }
        }

        polled
    }
}

impl std::fmt::Debug for TranscodeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodeStream")
            .field("stream_id", &self.stream_id)
            .field("drained", &self.drained.is_cancelled())
            .finish()
    }
}
