//! Pure construction of the ffmpeg argument vector for an export.
//!
//! Ordering is load-bearing: global flags, primary input, looped watermark
//! input (raster strategy only), trim flags, one watermark filter, encoder
//! selection, output normalization, audio flags, destination. Filter-graph
//! stream indices assume exactly this input order.

use std::path::Path;

use crate::project::{Anchor, ExportRequest, WatermarkSpec};

/// Consuming-self builder over the raw argument vector
#[derive(Debug, Clone)]
pub struct FfmpegArgs {
    args: Vec<String>,
}

impl FfmpegArgs {
    /// Start a new argument list with the global flags: banner suppression
    /// and forced overwrite of the destination.
    pub fn new() -> Self {
        Self {
            args: vec!["-hide_banner".to_string(), "-y".to_string()],
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Declare a media input
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Declare a single-frame image input looped indefinitely, so its
    /// effective duration covers the whole output
    pub fn loop_image_input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-loop").arg("1").input(path)
    }

    /// Seek to the trim start; applies to the whole multi-input graph,
    /// so it must follow every input declaration
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format_seconds(seconds))
    }

    /// Bound the output to the trim duration
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format_seconds(seconds))
    }

    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    pub fn preset<S: Into<String>>(self, preset: S) -> Self {
        self.arg("-preset").arg(preset)
    }

    /// Software-encoder constant rate factor
    pub fn crf(self, quality: u8) -> Self {
        self.arg("-crf").arg(quality.to_string())
    }

    /// Hardware-encoder constant quality value
    pub fn cq(self, quality: u8) -> Self {
        self.arg("-cq").arg(quality.to_string())
    }

    pub fn pix_fmt<S: Into<String>>(self, format: S) -> Self {
        self.arg("-pix_fmt").arg(format)
    }

    /// Move the moov atom to the front for streaming playability
    pub fn faststart(self) -> Self {
        self.arg("-movflags").arg("+faststart")
    }

    /// Stop at the shortest contributing stream; keeps the looped
    /// watermark input from extending the output forever
    pub fn shortest(self) -> Self {
        self.arg("-shortest")
    }

    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    pub fn audio_bitrate<S: Into<String>>(self, bitrate: S) -> Self {
        self.arg("-b:a").arg(bitrate)
    }

    /// Terminate with the destination path and yield the argument vector
    pub fn output<P: AsRef<Path>>(self, path: P) -> Vec<String> {
        let mut args = self.args;
        args.push(path.as_ref().to_string_lossy().to_string());
        args
    }
}

/// Build the complete transcoder argument vector for an export request.
/// Pure: no I/O, deterministic in its input; callers validate the request
/// (see `ExportRequest::from_project`) before invoking.
pub fn build_export_args(request: &ExportRequest) -> Vec<String> {
    let mut cmd = FfmpegArgs::new().input(&request.input);

    if let Some(image) = &request.watermark_image {
        cmd = cmd.loop_image_input(image);
    }

    cmd = cmd.seek(request.trim.start).duration(request.trim.duration());

    if request.watermark_image.is_some() {
        cmd = cmd
            .filter_complex(overlay_graph(&request.watermark))
            .map("[outv]")
            .map("0:a?");
    } else if !request.watermark.text.is_empty() {
        cmd = cmd.video_filter(drawtext_filter(&request.watermark));
    }

    cmd = if request.hardware_accel {
        cmd.video_codec("h264_nvenc").preset("p4").cq(request.quality)
    } else {
        cmd.video_codec("libx264").preset("medium").crf(request.quality)
    };

    cmd.pix_fmt("yuv420p")
        .faststart()
        .shortest()
        .audio_codec("aac")
        .audio_bitrate(request.audio_bitrate.clone())
        .output(&request.output)
}

/// Filter graph for the raster-overlay strategy: normalize the image input
/// to an alpha-capable pixel format with unit sample aspect ratio, then
/// composite it at the anchored position.
fn overlay_graph(watermark: &WatermarkSpec) -> String {
    let (x, y) = overlay_position(watermark.anchor, watermark.offset_x, watermark.offset_y);
    format!("[1:v]format=rgba,setsar=1[wm];[0:v][wm]overlay=x={}:y={}[outv]", x, y)
}

/// Overlay position expressions. W/H are the frame dimensions, w/h the
/// overlay dimensions; right/bottom anchors mirror left/top exactly.
fn overlay_position(anchor: Anchor, offset_x: u32, offset_y: u32) -> (String, String) {
    let x = if anchor.is_left() {
        format!("{}", offset_x)
    } else {
        format!("W-w-{}", offset_x)
    };
    let y = if anchor.is_top() {
        format!("{}", offset_y)
    } else {
        format!("H-h-{}", offset_y)
    };
    (x, y)
}

/// Single filter expression for the live text-drawing strategy. Shadow and a
/// semi-transparent background box approximate the prerendered raster look.
fn drawtext_filter(watermark: &WatermarkSpec) -> String {
    let (x, y) = drawtext_position(watermark.anchor, watermark.offset_x, watermark.offset_y);
    format!(
        "drawtext=text='{}':font='{}':fontsize={}:fontcolor={}@{}:x={}:y={}:\
         shadowcolor=black@0.6:shadowx=2:shadowy=2:box=1:boxcolor=black@0.35:boxborderw=10",
        escape_drawtext(&watermark.text),
        watermark.font_family,
        watermark.font_size,
        color_token(&watermark.color),
        watermark.opacity,
        x,
        y,
    )
}

/// Text position expressions; same anchor logic as the overlay, with the
/// drawtext text_w/text_h tokens in place of overlay dimensions.
fn drawtext_position(anchor: Anchor, offset_x: u32, offset_y: u32) -> (String, String) {
    let x = if anchor.is_left() {
        format!("{}", offset_x)
    } else {
        format!("w-text_w-{}", offset_x)
    };
    let y = if anchor.is_top() {
        format!("{}", offset_y)
    } else {
        format!("h-text_h-{}", offset_y)
    };
    (x, y)
}

/// Escape the characters that corrupt drawtext filter syntax:
/// backslashes, colons, and single quotes.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Map "#RRGGBB" onto the 0xRRGGBB form the filter expects
fn color_token(color: &str) -> String {
    match color.strip_prefix('#') {
        Some(hex) => format!("0x{}", hex),
        None => color.to_string(),
    }
}

/// Seconds rendered with millisecond precision, trailing zeros trimmed
fn format_seconds(value: f64) -> String {
    let rendered = format!("{:.3}", value);
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::TrimWindow;
    use std::path::PathBuf;

    fn watermark(anchor: Anchor) -> WatermarkSpec {
        WatermarkSpec {
            text: "© Watermark".to_string(),
            font_family: "Arial".to_string(),
            font_size: 24,
            color: "#FFFFFF".to_string(),
            opacity: 0.85,
            anchor,
            offset_x: 24,
            offset_y: 24,
        }
    }

    fn request(anchor: Anchor, raster: Option<&str>) -> ExportRequest {
        ExportRequest {
            input: PathBuf::from("in.mp4"),
            output: PathBuf::from("out.mp4"),
            trim: TrimWindow { start: 2.0, end: 7.5 },
            watermark: watermark(anchor),
            hardware_accel: false,
            quality: 18,
            audio_bitrate: "192k".to_string(),
            watermark_image: raster.map(PathBuf::from),
        }
    }

    fn position_of(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap()
    }

    #[test]
    fn test_global_flags_lead() {
        let args = build_export_args(&request(Anchor::BottomRight, None));
        assert_eq!(&args[..2], &["-hide_banner".to_string(), "-y".to_string()]);
    }

    #[test]
    fn test_trim_duration_is_end_minus_start() {
        let args = build_export_args(&request(Anchor::BottomRight, None));
        let t = position_of(&args, "-t");
        assert_eq!(args[t + 1], "5.5");
        let ss = position_of(&args, "-ss");
        assert_eq!(args[ss + 1], "2");
    }

    #[test]
    fn test_zero_width_trim_never_negative() {
        let mut req = request(Anchor::TopLeft, None);
        req.trim = TrimWindow { start: 5.0, end: 5.0 };
        let args = build_export_args(&req);
        let t = position_of(&args, "-t");
        assert_eq!(args[t + 1], "0");
    }

    #[test]
    fn test_exactly_one_strategy_text() {
        let args = build_export_args(&request(Anchor::BottomRight, None));
        assert!(args.contains(&"-vf".to_string()));
        assert!(!args.contains(&"-filter_complex".to_string()));
    }

    #[test]
    fn test_exactly_one_strategy_raster() {
        let args = build_export_args(&request(Anchor::BottomRight, Some("wm.png")));
        assert!(args.contains(&"-filter_complex".to_string()));
        assert!(!args.contains(&"-vf".to_string()));
        assert!(!args.iter().any(|a| a.contains("drawtext")));
    }

    #[test]
    fn test_no_watermark_when_text_empty() {
        let mut req = request(Anchor::TopLeft, None);
        req.watermark.text = String::new();
        let args = build_export_args(&req);
        assert!(!args.contains(&"-vf".to_string()));
        assert!(!args.contains(&"-filter_complex".to_string()));
    }

    #[test]
    fn test_raster_input_between_primary_input_and_trim() {
        let args = build_export_args(&request(Anchor::TopLeft, Some("wm.png")));
        let primary = args.iter().position(|a| a == "in.mp4").unwrap();
        let secondary = args.iter().position(|a| a == "wm.png").unwrap();
        let looped = position_of(&args, "-loop");
        let seek = position_of(&args, "-ss");

        assert!(primary < secondary);
        assert!(looped < secondary && looped > primary);
        assert!(secondary < seek);
    }

    #[test]
    fn test_raster_maps_graph_output_and_optional_audio() {
        let args = build_export_args(&request(Anchor::TopLeft, Some("wm.png")));
        let maps: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-map")
            .map(|(i, _)| &args[i + 1])
            .collect();
        assert_eq!(maps, vec!["[outv]", "0:a?"]);

        let graph = &args[position_of(&args, "-filter_complex") + 1];
        assert!(graph.starts_with("[1:v]format=rgba,setsar=1[wm]"));
        assert!(graph.contains("overlay=x=24:y=24"));
        assert!(graph.ends_with("[outv]"));
    }

    #[test]
    fn test_anchor_mirror_symmetry() {
        assert_eq!(
            overlay_position(Anchor::TopLeft, 24, 24),
            ("24".to_string(), "24".to_string())
        );
        assert_eq!(
            overlay_position(Anchor::TopRight, 24, 24),
            ("W-w-24".to_string(), "24".to_string())
        );
        assert_eq!(
            overlay_position(Anchor::BottomLeft, 24, 24),
            ("24".to_string(), "H-h-24".to_string())
        );
        assert_eq!(
            overlay_position(Anchor::BottomRight, 24, 24),
            ("W-w-24".to_string(), "H-h-24".to_string())
        );

        assert_eq!(
            drawtext_position(Anchor::BottomRight, 24, 24),
            ("w-text_w-24".to_string(), "h-text_h-24".to_string())
        );
        assert_eq!(
            drawtext_position(Anchor::TopRight, 0, 0),
            ("w-text_w-0".to_string(), "0".to_string())
        );
    }

    #[test]
    fn test_encoder_ordering_and_normalization() {
        let args = build_export_args(&request(Anchor::BottomRight, None));
        let vf = position_of(&args, "-vf");
        let codec = position_of(&args, "-c:v");
        let pix = position_of(&args, "-pix_fmt");
        let movflags = position_of(&args, "-movflags");
        let shortest = position_of(&args, "-shortest");
        let audio = position_of(&args, "-c:a");

        assert!(vf < codec);
        assert!(codec < pix && pix < movflags && movflags < shortest);
        assert!(shortest < audio);
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert_eq!(args[args.len() - 2], "192k");
    }

    #[test]
    fn test_software_and_hardware_quality_branches() {
        let args = build_export_args(&request(Anchor::BottomRight, None));
        let crf = position_of(&args, "-crf");
        assert_eq!(args[crf + 1], "18");
        assert_eq!(args[position_of(&args, "-c:v") + 1], "libx264");
        assert!(!args.contains(&"-cq".to_string()));

        let mut req = request(Anchor::BottomRight, None);
        req.hardware_accel = true;
        req.quality = 30;
        let args = build_export_args(&req);
        let cq = position_of(&args, "-cq");
        assert_eq!(args[cq + 1], "30");
        assert_eq!(args[position_of(&args, "-c:v") + 1], "h264_nvenc");
        assert!(!args.contains(&"-crf".to_string()));
    }

    #[test]
    fn test_bottom_right_text_scenario() {
        let args = build_export_args(&request(Anchor::BottomRight, None));
        let t = position_of(&args, "-t");
        assert_eq!(args[t + 1], "5.5");

        let filter = &args[position_of(&args, "-vf") + 1];
        assert!(filter.contains("x=w-text_w-24"));
        assert!(filter.contains("y=h-text_h-24"));
        assert!(filter.contains("fontcolor=0xFFFFFF@0.85"));
        assert!(filter.contains("box=1"));
        assert!(filter.contains("shadowx=2"));

        let crf = position_of(&args, "-crf");
        assert_eq!(args[crf + 1], "18");
    }

    #[test]
    fn test_drawtext_escaping() {
        assert_eq!(escape_drawtext(r"a\b"), r"a\\b");
        assert_eq!(escape_drawtext("12:30"), r"12\:30");
        assert_eq!(escape_drawtext("it's"), r"it\'s");
    }

    #[test]
    fn test_builder_is_deterministic() {
        let req = request(Anchor::BottomLeft, Some("wm.png"));
        assert_eq!(build_export_args(&req), build_export_args(&req));
    }
}
