//! Console rendering of check results.

use std::cell::RefCell;
use std::fmt;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";

/// Width of heading rules.
const RULE_WIDTH: usize = 60;

/// Colour of an emphasised line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Green.
    Success,
    /// Red.
    Error,
    /// Yellow.
    Warning,
}

impl Tone {
    const fn color(self) -> &'static str {
        match self {
            Self::Success => GREEN,
            Self::Error => RED,
            Self::Warning => YELLOW,
        }
    }

    const fn glyph(self) -> char {
        match self {
            Self::Success => '✓',
            Self::Error => '✗',
            Self::Warning => '⚠',
        }
    }
}

/// Destination for the report.
pub trait OutputSink {
    /// A passed check.
    fn success(&self, message: &str);
    /// A failed check.
    fn error(&self, message: &str);
    /// Something worth noticing that does not fail a check.
    fn warning(&self, message: &str);
    /// Uncoloured text.
    fn plain(&self, message: &str);
    /// A section title between rules.
    fn heading(&self, title: &str);
    /// Coloured text without a glyph.
    fn emphasis(&self, tone: Tone, message: &str);
}

/// Writes the report to stdout with ANSI colours.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn marked(tone: Tone, message: &str) {
        println!("{}{}{RESET} {message}", tone.color(), tone.glyph());
    }
}

impl OutputSink for ConsoleSink {
    fn success(&self, message: &str) {
        Self::marked(Tone::Success, message);
    }

    fn error(&self, message: &str) {
        Self::marked(Tone::Error, message);
    }

    fn warning(&self, message: &str) {
        Self::marked(Tone::Warning, message);
    }

    fn plain(&self, message: &str) {
        println!("{message}");
    }

    fn heading(&self, title: &str) {
        let rule = "=".repeat(RULE_WIDTH);
        println!("\n{rule}\n{title}\n{rule}");
    }

    fn emphasis(&self, tone: Tone, message: &str) {
        println!("{}{message}{RESET}", tone.color());
    }
}

/// Kind of a recorded line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// [`OutputSink::success`].
    Success,
    /// [`OutputSink::error`].
    Error,
    /// [`OutputSink::warning`].
    Warning,
    /// [`OutputSink::plain`].
    Plain,
    /// [`OutputSink::heading`].
    Heading,
    /// [`OutputSink::emphasis`].
    Emphasis(Tone),
}

/// Collects the report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: RefCell<Vec<(LineKind, String)>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded line.
    #[must_use]
    pub fn lines(&self) -> Vec<(LineKind, String)> {
        self.lines.borrow().clone()
    }

    /// Returns the messages of one kind.
    #[must_use]
    pub fn messages(&self, kind: LineKind) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Returns true if any line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|(_, m)| m.contains(needle))
    }

    fn push(&self, kind: LineKind, message: &str) {
        self.lines.borrow_mut().push((kind, message.to_string()));
    }
}

impl fmt::Display for MemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, message) in self.lines.borrow().iter() {
            writeln!(f, "{kind:?}: {message}")?;
        }
        Ok(())
    }
}

impl OutputSink for MemorySink {
    fn success(&self, message: &str) {
        self.push(LineKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(LineKind::Error, message);
    }

    fn warning(&self, message: &str) {
        self.push(LineKind::Warning, message);
    }

    fn plain(&self, message: &str) {
        self.push(LineKind::Plain, message);
    }

    fn heading(&self, title: &str) {
        self.push(LineKind::Heading, title);
    }

    fn emphasis(&self, tone: Tone, message: &str) {
        self.push(LineKind::Emphasis(tone), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.heading("Title");
        sink.success("ok");
        sink.error("bad");
        sink.emphasis(Tone::Warning, "note");

        assert_eq!(
            sink.lines(),
            vec![
                (LineKind::Heading, "Title".to_string()),
                (LineKind::Success, "ok".to_string()),
                (LineKind::Error, "bad".to_string()),
                (LineKind::Emphasis(Tone::Warning), "note".to_string()),
            ]
        );
        assert_eq!(sink.messages(LineKind::Error), vec!["bad".to_string()]);
        assert!(sink.contains("not"));
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(Tone::Success.glyph(), '✓');
        assert_eq!(Tone::Error.glyph(), '✗');
        assert_eq!(Tone::Warning.glyph(), '⚠');
    }
}
