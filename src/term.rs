//! Terminal rendering of the chat view.
//!
//! The "input field" is the most recent stdin line staged by the session
//! loop; the "message list" is the output stream. Printed lines cannot be
//! taken back, so eviction only adjusts the line count and a replaced
//! transcript is reprinted under a marker. Local notices go to their own
//! stream so the transcript stream holds chat lines only.

#[cfg(test)]
#[path = "term_test.rs"]
mod term_test;

use std::io::Write;

use crate::client::ChatView;
use crate::util::render::ChatLine;

pub const HISTORY_MARKER: &str = "-- history --";

pub struct TerminalView<W: Write, N: Write> {
    out: W,
    notices: N,
    input: String,
    lines: usize,
}

impl<W: Write, N: Write> TerminalView<W, N> {
    pub fn new(out: W, notices: N) -> Self {
        Self { out, notices, input: String::new(), lines: 0 }
    }

    /// Make `line` the pending input for the next send.
    pub fn stage_input(&mut self, line: String) {
        self.input = line;
    }

    /// Lines currently part of the transcript.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Print a local notice on the notice stream.
    pub fn notice(&mut self, text: &str) {
        write_line(&mut self.notices, &format!("* {text}"));
        flush(&mut self.notices);
    }

    /// Transcript and notice streams.
    pub fn into_parts(self) -> (W, N) {
        (self.out, self.notices)
    }
}

fn write_line(out: &mut impl Write, text: &str) {
    if let Err(e) = writeln!(out, "{text}") {
        log::warn!("terminal write failed: {e}");
    }
}

fn flush(out: &mut impl Write) {
    if let Err(e) = out.flush() {
        log::warn!("terminal flush failed: {e}");
    }
}

impl<W: Write, N: Write> ChatView for TerminalView<W, N> {
    fn input_text(&self) -> String {
        self.input.clone()
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn append_line(&mut self, line: &ChatLine) {
        write_line(&mut self.out, &line.to_terminal());
        self.lines += 1;
    }

    fn remove_oldest(&mut self, count: usize) {
        self.lines = self.lines.saturating_sub(count);
    }

    fn replace_lines(&mut self, lines: &[ChatLine]) {
        write_line(&mut self.out, HISTORY_MARKER);
        for line in lines {
            write_line(&mut self.out, &line.to_terminal());
        }
        self.lines = lines.len();
    }

    fn scroll_to_latest(&mut self) {
        flush(&mut self.out);
    }
}
