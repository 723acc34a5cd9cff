//! Line-oriented progress extraction from the downloader's output.
//!
//! yt-dlp emits one progress line per update when asked for line-buffered
//! output: a percentage with optional transfer speed and ETA while
//! downloading, and bracketed stage markers when it switches to merging the
//! separately-downloaded streams or to post-processing fix-ups.

use serde::Serialize;

/// Coarse stage of a download run, distinct from the fine-grained ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadPhase {
    Downloading,
    Merging,
    Postprocessing,
    Completed,
}

/// One progress update delivered to download subscribers.
/// `ratio` is only meaningful in the `Downloading` phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadEvent {
    pub phase: DownloadPhase,
    pub ratio: Option<f64>,
    pub speed: Option<String>,
    pub eta: Option<String>,
}

impl DownloadEvent {
    pub fn completed() -> Self {
        Self::phase_only(DownloadPhase::Completed)
    }

    fn phase_only(phase: DownloadPhase) -> Self {
        Self {
            phase,
            ratio: None,
            speed: None,
            eta: None,
        }
    }
}

/// Parse one downloader output line into a progress event, if it carries one
pub fn parse_progress_line(line: &str) -> Option<DownloadEvent> {
    if line.contains("[Merger]") {
        return Some(DownloadEvent::phase_only(DownloadPhase::Merging));
    }
    if line.contains("[ExtractAudio]") || line.contains("[Fixup") {
        return Some(DownloadEvent::phase_only(DownloadPhase::Postprocessing));
    }

    let percent = extract_percent(line)?;
    Some(DownloadEvent {
        phase: DownloadPhase::Downloading,
        ratio: Some(percent / 100.0),
        speed: extract_speed(line),
        eta: extract_eta(line),
    })
}

/// Numeric token directly preceding the first '%', accepted in 0..=100
fn extract_percent(line: &str) -> Option<f64> {
    let end = line.find('%')?;
    let head = &line[..end];
    let start = head
        .rfind(|c: char| !c.is_ascii_digit() && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0);
    let value: f64 = head[start..].parse().ok()?;
    (0.0..=100.0).contains(&value).then_some(value)
}

/// Transfer-rate token following " at ", e.g. "2.50MiB/s"
fn extract_speed(line: &str) -> Option<String> {
    let idx = line.find(" at ")?;
    let token = line[idx + 4..].split_whitespace().next()?;
    token.ends_with("/s").then(|| token.to_string())
}

/// Clock token following "ETA ", e.g. "00:30"
fn extract_eta(line: &str) -> Option<String> {
    let idx = line.find("ETA ")?;
    let token = line[idx + 4..].split_whitespace().next()?;
    token.contains(':').then(|| token.to_string())
}
