//! Hand-off of finished text to the screen.
//!
//! `--single-page` writes straight to stdout; otherwise the text is piped
//! through `--pager` / `$JUT_PAGER`, `$PAGER`, or `less`, in that order.

use std::env;
use std::io::{self, IsTerminal, Write};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

const DEFAULT_PAGER: &str = "less";

pub trait Pager {
    fn display(&self, text: &str) -> Result<()>;
}

/// Writes everything to stdout in one go.
pub struct StdoutPager;

impl Pager for StdoutPager {
    fn display(&self, text: &str) -> Result<()> {
        let stdout = io::stdout();
        write_text(&mut stdout.lock(), text).context("Failed to write to stdout")
    }
}

/// Writes `text`, treating a closed pipe (`jut nb.ipynb | head`) as success.
fn write_text<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

pub struct SystemPager {
    command: String,
}

impl SystemPager {
    /// Uses `configured` (from `--pager` or `JUT_PAGER`) when set, else `$PAGER`.
    pub fn new(configured: Option<String>) -> Self {
        let command = configured
            .filter(|cmd| !cmd.trim().is_empty())
            .or_else(|| env::var("PAGER").ok().filter(|cmd| !cmd.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_PAGER.to_string());
        Self { command }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Pipes `text` through the pager and waits for it to exit. Only a failed
    /// spawn is an error: past that point the pager may have shown something.
    fn run(&self, text: &str) -> io::Result<ExitStatus> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().unwrap_or(DEFAULT_PAGER);

        let mut cmd = Command::new(program);
        cmd.args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        // -R keeps colours, -F quits when the text fits, -X keeps it on screen.
        if env::var_os("LESS").is_none() {
            cmd.env("LESS", "-RFX");
        }

        let mut child = cmd.spawn()?;
        // The user may quit the pager before reading everything. Stdin is
        // closed at the end of the match so the pager sees EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => write_text(&mut stdin, text),
            None => Ok(()),
        };
        let status = child.wait()?;
        if let Err(err) = written {
            tracing::warn!(pager = self.command(), "writing to pager failed: {err}");
        }
        Ok(status)
    }
}

impl Pager for SystemPager {
    fn display(&self, text: &str) -> Result<()> {
        if text.is_empty() || !io::stdout().is_terminal() {
            return StdoutPager.display(text);
        }

        tracing::debug!(pager = self.command(), bytes = text.len(), "starting pager");
        match self.run(text) {
            Ok(status) if !status.success() => {
                tracing::warn!(pager = self.command(), %status, "pager exited unsuccessfully");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    pager = self.command(),
                    "pager failed to start, writing to stdout: {err}"
                );
                return StdoutPager.display(text);
            }
        }
        Ok(())
    }
}
