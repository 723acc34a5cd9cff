//! Media probing via ffprobe.
//!
//! Shells out to `ffprobe -v error -print_format json -show_format -show_streams`
//! and reduces the JSON document to the metadata the editing state needs.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, TrimarkError};

/// Probed metadata for the primary video stream of a media file.
/// All fields stay unset until a probe succeeds.
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    pub fps: Option<f64>,
    pub duration: Option<f64>,
    pub time_base: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
}

#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, input: &Path) -> Result<MediaInfo>;
}

/// A prober backed by the ffprobe CLI
pub struct FfprobeProber {
    binary_path: PathBuf,
}

impl FfprobeProber {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, input: &Path) -> Result<MediaInfo> {
        let output = tokio::process::Command::new(&self.binary_path)
            .arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(input)
            .output()
            .await
            .map_err(|e| TrimarkError::Launch {
                tool: "ffprobe".to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrimarkError::Probe(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let document: FfprobeDocument = serde_json::from_slice(&output.stdout)
            .map_err(|e| TrimarkError::Probe(format!("unparseable ffprobe output: {}", e)))?;

        let info = reduce_document(document);
        debug!("Probed {}: {:?}", input.display(), info);
        Ok(info)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeDocument {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    time_base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn reduce_document(document: FfprobeDocument) -> MediaInfo {
    let video = document
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let fps = video.and_then(|s| {
        // The primary rate can be the degenerate "0/0"; the average rate is
        // the fallback before giving up.
        s.r_frame_rate
            .as_deref()
            .and_then(eval_fraction)
            .or_else(|| s.avg_frame_rate.as_deref().and_then(eval_fraction))
    });

    MediaInfo {
        fps,
        duration: document
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok()),
        time_base: video.and_then(|s| s.time_base.clone()),
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        codec: video.and_then(|s| s.codec_name.clone()),
    }
}

/// Evaluate a "num/den" frame-rate fraction exactly as passed.
/// Returns None (unknown) for a zero denominator or an unparseable component.
pub fn eval_fraction(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}
