use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ToolsConfig;
use crate::error::{Result, TrimarkError};

/// Resolves the external tool binaries (ffmpeg, ffprobe, yt-dlp) from the
/// configuration: an entry containing a path separator is used as an explicit
/// filesystem path, a bare name is searched on PATH.
pub struct ToolLocator {
    tools: ToolsConfig,
}

impl ToolLocator {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    pub fn ffmpeg(&self) -> Result<PathBuf> {
        resolve("ffmpeg", &self.tools.ffmpeg)
    }

    pub fn ffprobe(&self) -> Result<PathBuf> {
        resolve("ffprobe", &self.tools.ffprobe)
    }

    pub fn ytdlp(&self) -> Result<PathBuf> {
        resolve("yt-dlp", &self.tools.ytdlp)
    }
}

fn resolve(tool: &str, configured: &str) -> Result<PathBuf> {
    if configured.contains(std::path::MAIN_SEPARATOR) || configured.contains('/') {
        let path = Path::new(configured);
        if path.is_file() {
            debug!("Resolved {} to configured path {}", tool, path.display());
            return Ok(path.to_path_buf());
        }
        return Err(TrimarkError::Launch {
            tool: tool.to_string(),
            reason: format!("configured path {} does not exist", configured),
        });
    }

    which::which(configured)
        .map(|path| {
            debug!("Resolved {} to {} via PATH", tool, path.display());
            path
        })
        .map_err(|e| TrimarkError::Launch {
            tool: tool.to_string(),
            reason: format!("{} not found on PATH: {}", configured, e),
        })
}
