//! Line-oriented output for the operator display and the durable session log.
//!
//! Sinks are fire-and-forget: a failed write is reported through `tracing`
//! and never interrupts the session.

use std::fs::{File, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;

use tracing::warn;

pub trait Sink {
    /// Append a line to the session log only.
    fn log(&mut self, line: &str);

    /// Show a line to the operator only.
    fn display(&mut self, line: &str);

    /// Overwrite the operator's status line in place (live readings).
    fn preview(&mut self, line: &str);

    fn log_and_display(&mut self, line: &str) {
        self.display(line);
        self.log(line);
    }
}

/// Operator display on a terminal plus an append-mode log file.
pub struct ConsoleSink<O: Write, L: Write> {
    out: O,
    log: L,
    previewing: bool,
}

impl ConsoleSink<Stdout, File> {
    /// Display on stdout, log appended to `log_path`.
    pub fn open(log_path: &Path) -> io::Result<Self> {
        let log = OpenOptions::new().create(true).append(true).open(log_path)?;
        Ok(Self::new(io::stdout(), log))
    }
}

impl<O: Write, L: Write> ConsoleSink<O, L> {
    pub fn new(out: O, log: L) -> Self {
        Self {
            out,
            log,
            previewing: false,
        }
    }

    pub fn into_parts(self) -> (O, L) {
        (self.out, self.log)
    }

    fn write_out(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("display write failed: {e}");
        }
    }
}

impl<O: Write, L: Write> Sink for ConsoleSink<O, L> {
    fn log(&mut self, line: &str) {
        if let Err(e) = writeln!(self.log, "{line}").and_then(|_| self.log.flush()) {
            warn!("session log write failed: {e}");
        }
    }

    fn display(&mut self, line: &str) {
        // The terminal may be in raw mode, so return the carriage explicitly
        let mut text = String::new();
        if self.previewing {
            text.push_str("\r\n");
            self.previewing = false;
        }
        text.push_str(line);
        text.push_str("\r\n");
        self.write_out(&text);
    }

    fn preview(&mut self, line: &str) {
        self.previewing = true;
        self.write_out(&format!("\r{line}"));
    }
}

/// Collects everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub logged: Vec<String>,
    pub displayed: Vec<String>,
    pub previews: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for MemorySink {
    fn log(&mut self, line: &str) {
        self.logged.push(line.to_string());
    }

    fn display(&mut self, line: &str) {
        self.displayed.push(line.to_string());
    }

    fn preview(&mut self, line: &str) {
        self.previews.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_console_sink_routes_lines() {
        let mut sink = ConsoleSink::new(Vec::new(), Vec::new());
        sink.log("log only");
        sink.display("display only");
        sink.log_and_display("both");

        let (out, log) = sink.into_parts();
        assert_eq!(String::from_utf8(out).unwrap(), "display only\r\nboth\r\n");
        assert_eq!(String::from_utf8(log).unwrap(), "log only\nboth\n");
    }

    #[test]
    fn test_preview_then_display_starts_new_line() {
        let mut sink = ConsoleSink::new(Vec::new(), Vec::new());
        sink.preview("   12.000 mm");
        sink.preview("   12.001 mm");
        sink.display("next");

        let (out, log) = sink.into_parts();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\r   12.000 mm\r   12.001 mm\r\nnext\r\n"
        );
        assert!(log.is_empty());
    }

    #[test]
    fn test_open_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let mut sink = ConsoleSink::open(&path).unwrap();
        sink.log("later");
        drop(sink);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.log_and_display("x");
        sink.preview("p");
        assert_eq!(sink.logged, vec!["x"]);
        assert_eq!(sink.displayed, vec!["x"]);
        assert_eq!(sink.previews, vec!["p"]);
    }
}
