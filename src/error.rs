use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrimarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to launch {tool}: {reason}")]
    Launch { tool: String, reason: String },

    #[error("Transcode failed with exit code {code}: {detail}")]
    Transcode { code: i32, detail: String },

    #[error("Download failed with exit code {code}: {detail}")]
    Download { code: i32, detail: String },

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TrimarkError>;
