//! Trimark - Video Trimming and Watermarking
//!
//! A desktop tool for trimming videos, overlaying a positioned text
//! watermark, and exporting the result as MP4. Decoding, encoding, watermark
//! compositing, and downloading are delegated to external command-line tools
//! (ffmpeg, ffprobe, yt-dlp); this crate constructs their argument vectors
//! and parses their progress streams.

pub mod cli;
pub mod config;
pub mod diag;
pub mod download;
pub mod error;
pub mod events;
pub mod export;
pub mod locate;
pub mod probe;
pub mod project;
