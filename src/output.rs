//! Terminal output for the psdpack CLI.
//!
//! Status lines follow Cargo's layout: a right-aligned coloured verb, then
//! the message. Everything here writes to stderr so `gather --list-only`
//! can keep stdout for sprite paths.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::validation::{Diagnostic, Severity};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Width of the verb column.
const VERB_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Green,
    Cyan,
    Yellow,
    Red,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Green => "\x1b[32m",
            Tone::Cyan => "\x1b[36m",
            Tone::Yellow => "\x1b[33m",
            Tone::Red => "\x1b[31m",
        }
    }
}

impl From<Severity> for Tone {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => Tone::Yellow,
            Severity::Error => Tone::Red,
        }
    }
}

/// Status printer. Colour is on when stderr is a terminal.
pub struct Printer {
    color: bool,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
        }
    }

    /// A printer that never emits escape codes.
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Progress line, e.g. "     Reading island.psd".
    pub fn status(&self, verb: &str, message: &str) {
        self.verb_line(Tone::Green, verb, message);
    }

    pub fn success(&self, verb: &str, message: &str) {
        self.verb_line(Tone::Green, verb, message);
    }

    pub fn info(&self, verb: &str, message: &str) {
        self.verb_line(Tone::Cyan, verb, message);
    }

    pub fn error(&self, verb: &str, message: &str) {
        self.verb_line(Tone::Red, verb, message);
    }

    /// Grey text for secondary details.
    pub fn dim(&self, text: &str) -> String {
        if self.color {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// "warning" or "error", coloured by severity.
    pub fn severity(&self, severity: Severity) -> String {
        self.paint(Tone::from(severity), &severity.to_string())
    }

    /// Print one diagnostic and its help line.
    pub fn diagnostic(&self, d: &Diagnostic) {
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "{}", self.format_diagnostic(d));
    }

    fn format_diagnostic(&self, d: &Diagnostic) -> String {
        let mut text = format!("  {}[{}]: {}\n", self.severity(d.severity), d.code, d.message);
        if let Some(help) = &d.help {
            text.push_str(&format!("    {}\n", self.dim(&format!("help: {}", help))));
        }
        text
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if self.color {
            format!("{BOLD}{}{text}{RESET}", tone.code())
        } else {
            text.to_string()
        }
    }

    fn verb_line(&self, tone: Tone, verb: &str, message: &str) {
        let verb = self.paint(tone, &format!("{verb:>VERB_WIDTH$}"));
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{verb} {message}");
    }
}

/// `plural(1, "sprite", "sprites")` is "1 sprite".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, pluralized)
    }
}

/// Path relative to the working directory when it lies inside it.
pub fn display_path(path: &Path) -> String {
    let Ok(cwd) = std::env::current_dir() else {
        return path.display().to_string();
    };
    match path.strip_prefix(&cwd) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
