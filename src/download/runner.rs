//! Execution of the downloader with phase/progress reporting.
//!
//! Structurally parallel to the export runner: build the argument vector,
//! spawn, parse the progress stream incrementally, map the exit status. The
//! downloader's progress arrives on stdout one line at a time (line-buffered
//! via `--newline`); stderr is unstructured noise kept only as a failure
//! tail.

use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::diag::DiagnosticTail;
use crate::download::progress::{parse_progress_line, DownloadEvent};
use crate::error::{Result, TrimarkError};
use crate::events::{self, CancelToken};
use crate::project::DownloadRequest;

/// Build the downloader argument vector: single-video semantics,
/// line-buffered progress, MP4 merge container, explicit destination.
pub fn build_download_args(request: &DownloadRequest) -> Vec<String> {
    vec![
        "--no-playlist".to_string(),
        "--newline".to_string(),
        "--no-warnings".to_string(),
        "--merge-output-format".to_string(),
        "mp4".to_string(),
        "-o".to_string(),
        request.output.to_string_lossy().to_string(),
        request.url.clone(),
    ]
}

pub struct DownloadRunner {
    ytdlp_path: PathBuf,
}

impl DownloadRunner {
    pub fn new(ytdlp_path: PathBuf) -> Self {
        Self { ytdlp_path }
    }

    /// Run the downloader for `request`, reporting phase/ratio/speed/ETA
    /// records through `on_progress`. Exit code 0 emits a terminal
    /// `completed` event and resolves; nonzero fails with the code and the
    /// stderr tail.
    pub async fn run<F>(
        &self,
        request: &DownloadRequest,
        mut on_progress: F,
        cancel: Option<CancelToken>,
    ) -> Result<()>
    where
        F: FnMut(DownloadEvent),
    {
        let args = build_download_args(request);
        info!("Downloading {} -> {}", request.url, request.output.display());
        debug!("Downloader arguments: {:?}", args);

        let mut child = tokio::process::Command::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TrimarkError::Launch {
                tool: "yt-dlp".to_string(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| TrimarkError::Launch {
            tool: "yt-dlp".to_string(),
            reason: "failed to capture progress stream".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| TrimarkError::Launch {
            tool: "yt-dlp".to_string(),
            reason: "failed to capture diagnostic stream".to_string(),
        })?;

        // Drain stderr concurrently so a chatty downloader cannot block on a
        // full pipe; only the tail is kept.
        let stderr_task = tokio::spawn(async move {
            let mut tail = DiagnosticTail::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tail.push_line(&line);
            }
            tail
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut cancel = cancel;

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = events::cancelled(&mut cancel) => {
                    warn!("Download cancelled, killing downloader");
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Err(TrimarkError::Cancelled);
                }
            };
            let Some(line) = line else { break };
            if let Some(event) = parse_progress_line(&line) {
                on_progress(event);
            }
        }

        let status = child.wait().await?;
        let tail = stderr_task
            .await
            .unwrap_or_else(|_| DiagnosticTail::new());

        if status.success() {
            info!("Download completed: {}", request.output.display());
            on_progress(DownloadEvent::completed());
            Ok(())
        } else {
            Err(TrimarkError::Download {
                code: status.code().unwrap_or(-1),
                detail: tail.into_detail(),
            })
        }
    }
}
