//! Stage messages and a one-line export counter on stderr.

use std::io::{IsTerminal, Write};

use colored::Colorize;

/// Progress reporting for a run.
///
/// Stage messages are printed unless quiet. The `[n/total]` counter is only
/// drawn on a terminal, since it rewrites its line with `\r`.
#[derive(Debug, Default)]
pub struct Progress {
    messages: bool,
    counter: bool,
    drawn: bool,
}

impl Progress {
    /// Report to stderr, honoring `--quiet`.
    #[must_use]
    pub fn stderr(quiet: bool) -> Self {
        Self {
            messages: !quiet,
            counter: !quiet && std::io::stderr().is_terminal(),
            drawn: false,
        }
    }

    /// Report nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn stage(&self, message: &str) {
        if self.messages {
            eprintln!("{message}");
        }
    }

    pub fn tick(&mut self, done: usize, total: Option<usize>) {
        if !self.counter {
            return;
        }
        let position = match total {
            Some(total) => format!("[{done}/{total}]"),
            None => format!("[{done}]"),
        };
        let mut err = std::io::stderr().lock();
        write!(err, "\r{} {}", "Exporting notes".cyan(), position.dimmed()).ok();
        err.flush().ok();
        self.drawn = true;
    }

    /// End the counter line.
    pub fn finish(&mut self) {
        if self.drawn {
            eprintln!();
            self.drawn = false;
        }
    }
}
