//! Execution of the built transcoder command with live progress reporting.

use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::diag::DiagnosticTail;
use crate::error::{Result, TrimarkError};
use crate::events::{self, CancelToken};
use crate::export::command::build_export_args;
use crate::export::progress::ExportProgress;
use crate::project::ExportRequest;

pub struct ExportRunner {
    ffmpeg_path: PathBuf,
}

impl ExportRunner {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Run the transcoder for `request`, reporting a monotonic 0..1 ratio
    /// through `on_progress`. Resolves on exit code 0; a nonzero exit fails
    /// with the code and the tail of the diagnostic stream. Cancelling kills
    /// the subprocess and yields the distinct `Cancelled` outcome.
    pub async fn run<F>(
        &self,
        request: &ExportRequest,
        mut on_progress: F,
        cancel: Option<CancelToken>,
    ) -> Result<()>
    where
        F: FnMut(f64),
    {
        let args = build_export_args(request);
        info!(
            "Exporting {} -> {} (trim {:.3}s..{:.3}s)",
            request.input.display(),
            request.output.display(),
            request.trim.start,
            request.trim.end
        );
        debug!("Transcoder arguments: {:?}", args);

        let mut child = tokio::process::Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TrimarkError::Launch {
                tool: "ffmpeg".to_string(),
                reason: e.to_string(),
            })?;

        let mut stderr = child.stderr.take().ok_or_else(|| TrimarkError::Launch {
            tool: "ffmpeg".to_string(),
            reason: "failed to capture diagnostic stream".to_string(),
        })?;

        let mut progress = ExportProgress::new(request.trim.duration());
        let mut tail = DiagnosticTail::new();
        let mut cancel = cancel;
        let mut buf = [0u8; 4096];

        loop {
            let read = tokio::select! {
                read = stderr.read(&mut buf) => read?,
                _ = events::cancelled(&mut cancel) => {
                    warn!("Export cancelled, killing transcoder");
                    let _ = child.kill().await;
                    return Err(TrimarkError::Cancelled);
                }
            };
            if read == 0 {
                break;
            }
            let chunk = String::from_utf8_lossy(&buf[..read]);
            tail.push_chunk(&chunk);
            if let Some(ratio) = progress.push(&chunk) {
                on_progress(ratio);
            }
        }

        let status = child.wait().await?;
        if status.success() {
            info!("Export completed: {}", request.output.display());
            Ok(())
        } else {
            Err(TrimarkError::Transcode {
                code: status.code().unwrap_or(-1),
                detail: tail.into_detail(),
            })
        }
    }
}
