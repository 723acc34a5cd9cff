// Download subsystem: yt-dlp invocation and phase/progress parsing.

pub mod progress;
pub mod runner;

pub use progress::{DownloadEvent, DownloadPhase};
pub use runner::{build_download_args, DownloadRunner};
