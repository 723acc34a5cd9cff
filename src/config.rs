use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, TrimarkError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tools: ToolsConfig,
    pub export: ExportConfig,
    pub watermark: WatermarkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the ffmpeg binary, or a bare name searched on PATH
    pub ffmpeg: String,
    /// Path to the ffprobe binary, or a bare name searched on PATH
    pub ffprobe: String,
    /// Path to the yt-dlp binary, or a bare name searched on PATH
    pub ytdlp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Quality knob passed to the encoder (0-51, lower = better quality)
    pub quality: u8,
    /// Prefer the hardware encoder when building export commands
    pub hardware_accel: bool,
    /// AAC bitrate for the audio stream
    pub audio_bitrate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    pub font_family: String,
    /// Font size in pixels
    pub font_size: u32,
    /// RGB hex color, e.g. "#FFFFFF"
    pub color: String,
    /// Opacity in 0..1
    pub opacity: f64,
    /// Default pixel offset from the anchor corner, per axis
    pub offset_x: u32,
    pub offset_y: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolsConfig {
                ffmpeg: "ffmpeg".to_string(),
                ffprobe: "ffprobe".to_string(),
                ytdlp: "yt-dlp".to_string(),
            },
            export: ExportConfig {
                quality: 18,
                hardware_accel: false,
                audio_bitrate: "192k".to_string(),
            },
            watermark: WatermarkConfig {
                font_family: "Arial".to_string(),
                font_size: 24,
                color: "#FFFFFF".to_string(),
                opacity: 0.85,
                offset_x: 24,
                offset_y: 24,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrimarkError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| TrimarkError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TrimarkError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TrimarkError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
