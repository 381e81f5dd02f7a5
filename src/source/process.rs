//! Child process plumbing for `osascript`.
//!
//! AppleScript `log` output goes to stderr, so record streams are read from
//! the child's stderr line by line while stdout is discarded.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStderr, Command, Stdio};

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Run a script to completion and return its combined output, trimmed.
///
/// # Errors
///
/// Returns an `Extractor` error if the program cannot be started or exits
/// unsuccessfully.
pub fn run_script(program: &str, script: &str) -> Result<String> {
    debug!(program, "Running script");
    let output = Command::new(program)
        .arg("-e")
        .arg(script)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(program, &e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        return Err(Error::Extractor(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(format!("{stdout}{stderr}").trim().to_string())
}

fn spawn_error(program: &str, err: &std::io::Error) -> Error {
    Error::Extractor(format!("failed to run {program}: {err}"))
}

/// Trimmed output lines of a running script.
///
/// A non-zero exit surfaces as a final `Err` item once the output is
/// exhausted. Dropping the iterator early kills and reaps the child.
#[derive(Debug)]
pub struct ProcessLines {
    program: String,
    child: Option<Child>,
    reader: BufReader<ChildStderr>,
    buf: Vec<u8>,
}

impl ProcessLines {
    /// Start `program -e script`.
    ///
    /// # Errors
    ///
    /// Returns an `Extractor` error if the program cannot be started.
    pub fn spawn(program: &str, script: &str) -> Result<Self> {
        debug!(program, "Starting script");
        let mut child = Command::new(program)
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(program, &e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Extractor(format!("{program} has no output pipe")))?;

        Ok(Self {
            program: program.to_string(),
            child: Some(child),
            reader: BufReader::new(stderr),
            buf: Vec::new(),
        })
    }

    /// Reap the child after end of output.
    fn finish(&mut self) -> Option<Result<String>> {
        let mut child = self.child.take()?;
        match child.wait() {
            Ok(status) if status.success() => None,
            Ok(status) => Some(Err(Error::Extractor(format!(
                "{} exited with {status}",
                self.program
            )))),
            Err(e) => Some(Err(Error::Io(e))),
        }
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(program = %self.program, "Stopping unfinished script");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Iterator for ProcessLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.child.as_ref()?;

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => self.finish(),
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.buf).trim().to_string();
                trace!(%line, "script output");
                Some(Ok(line))
            }
            Err(e) => {
                self.kill();
                Some(Err(Error::Io(e)))
            }
        }
    }
}

impl Drop for ProcessLines {
    fn drop(&mut self) {
        self.kill();
    }
}
