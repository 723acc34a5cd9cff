//! Trimark - Video Trimming and Watermarking
//!
//! Command-line entry point: loads configuration, wires progress events to
//! terminal progress bars, and drives the export, download, and probe
//! operations.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trimark::cli::{Args, Commands};
use trimark::config::Config;
use trimark::download::{DownloadPhase, DownloadRunner};
use trimark::events::{CancelToken, ProgressHub};
use trimark::export::ExportRunner;
use trimark::locate::ToolLocator;
use trimark::probe::{FfprobeProber, MediaProber};
use trimark::project::{DownloadRequest, ExportRequest, Project};

/// Resolution of the terminal progress bars (ratio 0..1 mapped onto 0..1000)
const BAR_TICKS: u64 = 1000;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    // Load configuration, falling back to config.toml in the current directory
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let locator = ToolLocator::new(config.tools.clone());

    match args.command {
        Commands::Export {
            input,
            output,
            start,
            end,
            text,
            watermark_image,
            anchor,
            offset_x,
            offset_y,
            font_size,
            opacity,
            hardware,
            quality,
        } => {
            info!("Exporting video file: {}", input.display());

            let prober = FfprobeProber::new(locator.ffprobe()?);
            let media = prober.probe(&input).await?;
            let duration = media.duration.unwrap_or(0.0);

            let mut project = Project::new(&config);
            project.watermark.text = text;
            project.watermark.anchor = anchor;
            if let Some(x) = offset_x {
                project.watermark.offset_x = x;
            }
            if let Some(y) = offset_y {
                project.watermark.offset_y = y;
            }
            if let Some(size) = font_size {
                project.watermark.font_size = size;
            }
            if let Some(opacity) = opacity {
                project.watermark.opacity = opacity.clamp(0.0, 1.0);
            }
            if hardware {
                project.export.hardware_accel = true;
            }
            if let Some(quality) = quality {
                project.export.quality = quality;
            }
            project.export.output = Some(output);
            project.set_media(input, media);
            project.set_trim(start, end.unwrap_or(duration));

            let request = ExportRequest::from_project(
                &project,
                config.export.audio_bitrate.clone(),
                watermark_image,
            )?;

            let hub = Arc::new(ProgressHub::new());
            let bar = progress_bar();
            let export_bar = bar.clone();
            let subscription = hub.subscribe_export(move |ratio| {
                export_bar.set_position((ratio * BAR_TICKS as f64) as u64);
            });

            let cancel = CancelToken::new();
            cancel_on_ctrl_c(cancel.clone());

            let runner = ExportRunner::new(locator.ffmpeg()?);
            let emitter = Arc::clone(&hub);
            let result = runner
                .run(&request, |ratio| emitter.emit_export(ratio), Some(cancel))
                .await;

            hub.unsubscribe_export(subscription);
            match result {
                Ok(()) => {
                    bar.finish_with_message("done");
                    println!("Exported to {}", request.output.display());
                }
                Err(e) => {
                    // Never leave the bar frozen at a stale ratio
                    bar.finish_and_clear();
                    return Err(e.into());
                }
            }
        }

        Commands::Download { url, output } => {
            info!("Downloading video: {}", url);

            let request = DownloadRequest { url, output };

            let hub = Arc::new(ProgressHub::new());
            let bar = progress_bar();
            let download_bar = bar.clone();
            let subscription = hub.subscribe_download(move |event| match event.phase {
                DownloadPhase::Downloading => {
                    if let Some(ratio) = event.ratio {
                        download_bar.set_position((ratio * BAR_TICKS as f64) as u64);
                    }
                    let speed = event.speed.clone().unwrap_or_default();
                    let eta = event.eta.clone().unwrap_or_default();
                    download_bar.set_message(format!("{} {}", speed, eta));
                }
                DownloadPhase::Merging => {
                    download_bar.set_message("merging streams".to_string());
                }
                DownloadPhase::Postprocessing => {
                    download_bar.set_message("post-processing".to_string());
                }
                DownloadPhase::Completed => {
                    download_bar.set_position(BAR_TICKS);
                }
            });

            let cancel = CancelToken::new();
            cancel_on_ctrl_c(cancel.clone());

            let runner = DownloadRunner::new(locator.ytdlp()?);
            let emitter = Arc::clone(&hub);
            let result = runner
                .run(&request, |event| emitter.emit_download(&event), Some(cancel))
                .await;

            hub.unsubscribe_download(subscription);
            match result {
                Ok(()) => {
                    bar.finish_with_message("done");
                    println!("Downloaded to {}", request.output.display());
                }
                Err(e) => {
                    bar.finish_and_clear();
                    return Err(e.into());
                }
            }
        }

        Commands::Probe { input } => {
            info!("Probing media file: {}", input.display());

            let prober = FfprobeProber::new(locator.ffprobe()?);
            let media = prober.probe(&input).await?;

            let unknown = || "unknown".to_string();
            println!("Codec:     {}", media.codec.clone().unwrap_or_else(unknown));
            println!(
                "Size:      {}x{}",
                media.width.map(|w| w.to_string()).unwrap_or_else(unknown),
                media.height.map(|h| h.to_string()).unwrap_or_else(unknown)
            );
            println!(
                "FPS:       {}",
                media
                    .fps
                    .map(|fps| format!("{:.3}", fps))
                    .unwrap_or_else(unknown)
            );
            println!(
                "Duration:  {}",
                media
                    .duration
                    .map(|d| format!("{:.3}s", d))
                    .unwrap_or_else(unknown)
            );
            println!(
                "Time base: {}",
                media.time_base.clone().unwrap_or_else(unknown)
            );
        }
    }

    info!("trimark completed successfully");
    Ok(())
}

/// Setup logging to both console and a daily-rolling file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".trimark").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "trimark.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(BAR_TICKS);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar
}

/// Cancel the given token when the user interrupts the run
fn cancel_on_ctrl_c(token: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}
