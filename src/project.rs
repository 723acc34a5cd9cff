use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Result, TrimarkError};
use crate::probe::MediaInfo;

/// Corner reference point a watermark offset is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    pub fn is_left(&self) -> bool {
        matches!(self, Anchor::TopLeft | Anchor::BottomLeft)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Anchor::TopLeft | Anchor::TopRight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkSpec {
    /// Literal text to render; empty text disables watermarking
    pub text: String,
    pub font_family: String,
    /// Font size in pixels
    pub font_size: u32,
    /// RGB hex color, e.g. "#FFFFFF"
    pub color: String,
    /// Opacity in 0..1
    pub opacity: f64,
    pub anchor: Anchor,
    /// Pixel offset from the anchor corner, per axis
    pub offset_x: u32,
    pub offset_y: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSpec {
    /// Container is fixed (MP4 / H.264 / AAC); only the knobs below vary
    pub hardware_accel: bool,
    /// Encoder quality value, lower = higher quality
    pub quality: u8,
    pub output: Option<PathBuf>,
}

/// Selected [start, end] second range of the source media
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    /// Trim duration, clamped to never go negative
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Full editing state. Owned and mutated by the driving layer only;
/// the core subsystems receive immutable request snapshots instead.
#[derive(Debug, Clone)]
pub struct Project {
    pub source: Option<PathBuf>,
    pub media: Option<MediaInfo>,
    pub trim: TrimWindow,
    pub watermark: WatermarkSpec,
    pub export: ExportSpec,
}

impl Project {
    pub fn new(config: &Config) -> Self {
        Self {
            source: None,
            media: None,
            trim: TrimWindow { start: 0.0, end: 0.0 },
            watermark: WatermarkSpec {
                text: String::new(),
                font_family: config.watermark.font_family.clone(),
                font_size: config.watermark.font_size,
                color: config.watermark.color.clone(),
                opacity: config.watermark.opacity,
                anchor: Anchor::BottomRight,
                offset_x: config.watermark.offset_x,
                offset_y: config.watermark.offset_y,
            },
            export: ExportSpec {
                hardware_accel: config.export.hardware_accel,
                quality: config.export.quality,
                output: None,
            },
        }
    }

    /// Attach probe results and re-clamp the trim window to the known duration
    pub fn set_media(&mut self, source: PathBuf, media: MediaInfo) {
        let duration = media.duration.unwrap_or(0.0);
        self.source = Some(source);
        self.media = Some(media);
        if self.trim.end <= 0.0 {
            self.trim.end = duration;
        }
        self.set_trim(self.trim.start, self.trim.end);
    }

    /// Set the trim window, clamping to [0, duration] and keeping start <= end
    pub fn set_trim(&mut self, start: f64, end: f64) {
        let duration = self
            .media
            .as_ref()
            .and_then(|m| m.duration)
            .unwrap_or(f64::MAX);
        let start = start.clamp(0.0, duration);
        let end = end.clamp(start, duration);
        self.trim = TrimWindow { start, end };
    }
}

/// Immutable snapshot consumed by the Command Builder and Export Runner.
/// Exactly one watermark strategy is active: raster-overlay when
/// `watermark_image` is set, live text-drawing otherwise.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub trim: TrimWindow,
    pub watermark: WatermarkSpec,
    pub hardware_accel: bool,
    pub quality: u8,
    pub audio_bitrate: String,
    /// Pre-rendered watermark raster; caller-owned, treated as read-only
    pub watermark_image: Option<PathBuf>,
}

impl ExportRequest {
    /// Snapshot a project into a request, enforcing the caller-side
    /// preconditions the pure builder assumes.
    pub fn from_project(
        project: &Project,
        audio_bitrate: String,
        watermark_image: Option<PathBuf>,
    ) -> Result<Self> {
        let input = project
            .source
            .clone()
            .ok_or_else(|| TrimarkError::InvalidRequest("no source media loaded".to_string()))?;
        let output = project
            .export
            .output
            .clone()
            .ok_or_else(|| TrimarkError::InvalidRequest("no output path chosen".to_string()))?;
        if output.as_os_str().is_empty() {
            return Err(TrimarkError::InvalidRequest("output path is empty".to_string()));
        }
        if project.trim.end < project.trim.start {
            return Err(TrimarkError::InvalidRequest(format!(
                "trim end {:.3} precedes start {:.3}",
                project.trim.end, project.trim.start
            )));
        }

        Ok(Self {
            input,
            output,
            trim: project.trim,
            watermark: project.watermark.clone(),
            hardware_accel: project.export.hardware_accel,
            quality: project.export.quality,
            audio_bitrate,
            watermark_image,
        })
    }
}

/// Immutable snapshot consumed by the Download Runner
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_duration(duration: f64) -> Project {
        let mut project = Project::new(&Config::default());
        project.set_media(
            PathBuf::from("in.mp4"),
            MediaInfo {
                duration: Some(duration),
                ..MediaInfo::default()
            },
        );
        project
    }

    #[test]
    fn test_trim_clamps_to_duration() {
        let mut project = project_with_duration(10.0);
        project.set_trim(-1.0, 42.0);
        assert_eq!(project.trim.start, 0.0);
        assert_eq!(project.trim.end, 10.0);
    }

    #[test]
    fn test_trim_keeps_start_before_end() {
        let mut project = project_with_duration(10.0);
        project.set_trim(8.0, 3.0);
        assert_eq!(project.trim.start, 8.0);
        assert_eq!(project.trim.end, 8.0);
        assert_eq!(project.trim.duration(), 0.0);
    }

    #[test]
    fn test_request_requires_output() {
        let project = project_with_duration(10.0);
        let result = ExportRequest::from_project(&project, "192k".to_string(), None);
        assert!(matches!(result, Err(TrimarkError::InvalidRequest(_))));
    }

    #[test]
    fn test_request_snapshots_project() {
        let mut project = project_with_duration(10.0);
        project.export.output = Some(PathBuf::from("out.mp4"));
        project.set_trim(2.0, 7.5);

        let request = ExportRequest::from_project(&project, "192k".to_string(), None).unwrap();
        assert_eq!(request.trim.start, 2.0);
        assert_eq!(request.trim.duration(), 5.5);
        assert!(request.watermark_image.is_none());
    }
}
