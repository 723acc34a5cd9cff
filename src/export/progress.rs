//! Incremental progress extraction from the transcoder's diagnostic stream.
//!
//! ffmpeg reports progress as human-readable stats lines containing an
//! elapsed-time marker (`time=HH:MM:SS.ff`). The stream arrives in arbitrary
//! chunks from a live subprocess, so the scanner is a character-fed state
//! machine rather than a rescan of an accumulated buffer: a marker or
//! timestamp split across chunk boundaries is handled transparently.

/// Marker preceding the elapsed-time stamp in ffmpeg stats output
const MARKER: &[u8] = b"time=";

/// Longest plausible timestamp; anything beyond this is garbage
const MAX_STAMP_LEN: usize = 16;

#[derive(Debug)]
enum ScanState {
    /// Matching the marker; holds the number of marker bytes already seen
    Seeking(usize),
    /// Accumulating timestamp characters after a complete marker
    Collecting(String),
}

/// Chunk-fed scanner yielding elapsed seconds per completed timestamp
#[derive(Debug)]
pub struct TimecodeScanner {
    state: ScanState,
}

impl TimecodeScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Seeking(0),
        }
    }

    /// Feed one chunk of diagnostic text. Returns the largest elapsed-seconds
    /// value completed within this chunk, if any.
    pub fn feed(&mut self, chunk: &str) -> Option<f64> {
        let mut latest = None;

        for ch in chunk.chars() {
            match &mut self.state {
                ScanState::Seeking(matched) => {
                    if ch == MARKER[*matched] as char {
                        *matched += 1;
                        if *matched == MARKER.len() {
                            self.state = ScanState::Collecting(String::new());
                        }
                    } else {
                        // Restart, allowing the mismatch itself to open a new marker
                        self.state = ScanState::Seeking(usize::from(ch == MARKER[0] as char));
                    }
                }
                ScanState::Collecting(stamp) => {
                    if ch.is_ascii_digit() || ch == ':' || ch == '.' {
                        if stamp.len() >= MAX_STAMP_LEN {
                            self.state = ScanState::Seeking(0);
                            continue;
                        }
                        stamp.push(ch);
                    } else {
                        if let Some(seconds) = parse_timestamp(stamp) {
                            latest = Some(latest.map_or(seconds, |best: f64| best.max(seconds)));
                        }
                        self.state = ScanState::Seeking(usize::from(ch == MARKER[0] as char));
                    }
                }
            }
        }

        latest
    }
}

/// Parse `hours:minutes:seconds(.fraction)` into total seconds
fn parse_timestamp(stamp: &str) -> Option<f64> {
    let mut parts = stamp.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Converts scanned elapsed time into the monotonic, clamped export ratio.
/// With a zero target, or before the first parseable stamp, nothing is
/// reported at all.
#[derive(Debug)]
pub struct ExportProgress {
    scanner: TimecodeScanner,
    target_seconds: f64,
    last_ratio: Option<f64>,
}

impl ExportProgress {
    /// `target_seconds` is the trim window duration the ratio is measured against
    pub fn new(target_seconds: f64) -> Self {
        Self {
            scanner: TimecodeScanner::new(),
            target_seconds,
            last_ratio: None,
        }
    }

    /// Feed one diagnostic chunk; returns a ratio only when it advanced
    pub fn push(&mut self, chunk: &str) -> Option<f64> {
        let elapsed = self.scanner.feed(chunk)?;
        if self.target_seconds <= 0.0 {
            return None;
        }
        let ratio = (elapsed / self.target_seconds).clamp(0.0, 1.0);
        match self.last_ratio {
            Some(previous) if ratio <= previous => None,
            _ => {
                self.last_ratio = Some(ratio);
                Some(ratio)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:00"), Some(0.0));
        assert_eq!(parse_timestamp("00:01:00.00"), Some(60.0));
        assert_eq!(parse_timestamp("01:00:00"), Some(3600.0));
        assert!((parse_timestamp("00:00:30.50").unwrap() - 30.5).abs() < 1e-9);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("30.5"), None);
        assert_eq!(parse_timestamp("00:00:00:00"), None);
    }

    #[test]
    fn test_scanner_whole_line() {
        let mut scanner = TimecodeScanner::new();
        let line = "frame=  120 fps= 30 q=28.0 size=512kB time=00:00:04.00 bitrate=1024kbits/s\n";
        assert_eq!(scanner.feed(line), Some(4.0));
    }

    #[test]
    fn test_scanner_marker_split_across_chunks() {
        let mut scanner = TimecodeScanner::new();
        assert_eq!(scanner.feed("size=512kB ti"), None);
        assert_eq!(scanner.feed("me=00:0"), None);
        assert_eq!(scanner.feed("0:05.20 bitrate="), Some(5.2));
    }

    #[test]
    fn test_scanner_ignores_non_timestamp_values() {
        let mut scanner = TimecodeScanner::new();
        assert_eq!(scanner.feed("time=N/A bitrate=N/A\n"), None);
        assert_eq!(scanner.feed("out_time=garbage "), None);
    }

    #[test]
    fn test_scanner_takes_largest_in_chunk() {
        let mut scanner = TimecodeScanner::new();
        let chunk = "time=00:00:02.00 ... time=00:00:01.00 ... time=00:00:03.00 x";
        assert_eq!(scanner.feed(chunk), Some(3.0));
    }

    #[test]
    fn test_ratio_monotonic_under_restated_lines() {
        let mut progress = ExportProgress::new(10.0);
        assert_eq!(progress.push("time=00:00:02.00 x"), Some(0.2));
        // Diagnostic output can restate or backtrack; never report lower
        assert_eq!(progress.push("time=00:00:01.00 x"), None);
        assert_eq!(progress.push("time=00:00:02.00 x"), None);
        assert_eq!(progress.push("time=00:00:05.00 x"), Some(0.5));
    }

    #[test]
    fn test_ratio_clamped_to_one() {
        let mut progress = ExportProgress::new(4.0);
        assert_eq!(progress.push("time=00:00:08.00 x"), Some(1.0));
        assert_eq!(progress.push("time=00:00:09.00 x"), None);
    }

    #[test]
    fn test_zero_target_never_reports() {
        let mut progress = ExportProgress::new(0.0);
        assert_eq!(progress.push("time=00:00:08.00 x"), None);
    }

    #[test]
    fn test_arbitrary_single_byte_chunking() {
        let mut progress = ExportProgress::new(10.0);
        let line = "frame= 1 time=00:00:06.00 bitrate=1k\n";
        let mut reported = Vec::new();
        for ch in line.chars() {
            if let Some(ratio) = progress.push(&ch.to_string()) {
                reported.push(ratio);
            }
        }
        assert_eq!(reported, vec![0.6]);
    }
}
