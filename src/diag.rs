use std::collections::VecDeque;

/// Number of trailing lines retained for failure reporting
const TAIL_LINES: usize = 12;

/// Cap on a single retained line; diagnostic streams can emit very long ones
const MAX_LINE_LEN: usize = 512;

/// Bounded tail of the most recent non-empty diagnostic lines.
///
/// Subprocess error channels are unstructured noise while a run is healthy,
/// but the last lines usually name the actual failure; both runners feed
/// their diagnostic stream through this so a nonzero exit can carry them.
#[derive(Debug, Default)]
pub struct DiagnosticTail {
    lines: VecDeque<String>,
    current: String,
}

impl DiagnosticTail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk; line boundaries may fall anywhere
    pub fn push_chunk(&mut self, chunk: &str) {
        for ch in chunk.chars() {
            if ch == '\n' || ch == '\r' {
                self.commit();
            } else if self.current.len() < MAX_LINE_LEN {
                self.current.push(ch);
            }
        }
    }

    /// Feed one complete line
    pub fn push_line(&mut self, line: &str) {
        self.current.push_str(line);
        self.commit();
    }

    fn commit(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            if self.lines.len() == TAIL_LINES {
                self.lines.pop_front();
            }
            self.lines.push_back(line.to_string());
        }
        self.current.clear();
    }

    /// The retained tail as a single string, including any unfinished line
    pub fn into_detail(mut self) -> String {
        self.commit();
        let lines: Vec<String> = self.lines.into_iter().collect();
        lines.join("\n")
    }
}
