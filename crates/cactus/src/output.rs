//! Colored terminal output utilities.

use std::fmt::Display;

use console::{Style, Term};

/// Width of the label column in startup settings.
const LABEL_WIDTH: usize = 12;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    dim: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            dim: Style::new().dim(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print the address the site is served on (cyan bold).
    pub(crate) fn serving(&self, url: &str) {
        let line = format!("Serving site at {}", self.cyan_bold.apply_to(url));
        let _ = self.term.write_line(&line);
    }

    /// Print a `label  value` line with a dimmed label.
    pub(crate) fn setting(&self, label: &str, value: impl Display) {
        let label = format!("{label:<width$}", width = LABEL_WIDTH);
        let _ = self
            .term
            .write_line(&format!("  {} {value}", self.dim.apply_to(label)));
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}
