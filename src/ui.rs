use console::{Style, Term};
use std::{env, fmt::Display, path::Path};

use http_mutant::pipeline::BatchSummary;

use crate::report::format_summary;

/// Stream and styling of one kind of human-readable line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Plain,
    Title,
    Written,
    Warning,
    Failure,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Plain => Style::new(),
            Tone::Title => Style::new().bold(),
            Tone::Written => Style::new().green(),
            Tone::Warning => Style::new().yellow(),
            Tone::Failure => Style::new().red().bold(),
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Tone::Warning | Tone::Failure)
    }
}

/// Human-facing output of the binary.
///
/// With `--json` every human line goes to stderr so stdout carries only the
/// report. Colors are used only on a terminal with neither `NO_COLOR` nor `CI` set.
#[derive(Debug, Clone)]
pub struct Ui {
    out: Term,
    err: Term,
    fancy: bool,
    enabled: bool,

    // Counters for tests; they never change what is printed.
    shards_reported: u64,
    errors: u64,
}

impl Ui {
    pub fn new(json: bool) -> Self {
        let out = if json { Term::stderr() } else { Term::stdout() };
        let fancy = out.is_term()
            && env::var_os("NO_COLOR").is_none()
            && env::var_os("CI").is_none();

        Self {
            out,
            err: Term::stderr(),
            fancy,
            enabled: true,
            shards_reported: 0,
            errors: 0,
        }
    }

    #[cfg(test)]
    pub fn silent() -> Self {
        Self {
            enabled: false,
            fancy: false,
            ..Self::new(false)
        }
    }

    fn emit(&self, tone: Tone, msg: impl Display) {
        if !self.enabled {
            return;
        }
        let text = if self.fancy {
            tone.style().apply_to(msg).to_string()
        } else {
            msg.to_string()
        };
        let term = if tone.to_stderr() { &self.err } else { &self.out };
        let _ = term.write_line(&text);
    }

    pub fn line(&self, msg: impl Display) {
        self.emit(Tone::Plain, msg);
    }

    pub fn title(&self, msg: impl Display) {
        self.emit(Tone::Title, msg);
    }

    pub fn error(&mut self, msg: impl Display) {
        self.errors += 1;
        self.emit(Tone::Failure, msg);
    }

    pub fn shard(&mut self, path: &Path) {
        self.shards_reported += 1;
        self.emit(Tone::Written, format!("wrote {}", path.display()));
    }

    pub fn summary(&self, summary: &BatchSummary) {
        self.line(format_summary(summary));
        if summary.skipped > 0 {
            self.emit(
                Tone::Warning,
                format!("{} input line(s) were skipped", summary.skipped),
            );
        }
    }
}
