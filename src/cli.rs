use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::project::Anchor;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trim and watermark a video, exporting a new MP4
    Export {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,

        /// Trim start in seconds
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Trim end in seconds; defaults to the probed duration
        #[arg(long)]
        end: Option<f64>,

        /// Watermark text; empty disables watermarking
        #[arg(long, default_value = "")]
        text: String,

        /// Pre-rendered watermark image; overrides live text drawing
        #[arg(long)]
        watermark_image: Option<PathBuf>,

        /// Watermark anchor corner
        #[arg(long, value_enum, default_value = "bottom-right")]
        anchor: Anchor,

        /// Horizontal pixel offset from the anchor corner
        #[arg(long)]
        offset_x: Option<u32>,

        /// Vertical pixel offset from the anchor corner
        #[arg(long)]
        offset_y: Option<u32>,

        /// Watermark font size in pixels
        #[arg(long)]
        font_size: Option<u32>,

        /// Watermark opacity (0..1)
        #[arg(long)]
        opacity: Option<f64>,

        /// Use the hardware encoder
        #[arg(long)]
        hardware: bool,

        /// Encoder quality value, lower = higher quality
        #[arg(short, long)]
        quality: Option<u8>,
    },

    /// Download a video into the pipeline's MP4 format
    Download {
        /// Source URL
        #[arg(short, long)]
        url: String,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Probe a media file and print its stream metadata
    Probe {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },
}
