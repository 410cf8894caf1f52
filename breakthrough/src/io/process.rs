//! Child process helper for command-backed generation.
//!
//! The request is fed on stdin from its own thread while stdout and stderr are
//! drained concurrently, so large prompts and large responses cannot deadlock
//! on full pipes.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Captured output of a finished (or killed) child.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes of stdout discarded past the limit.
    pub stdout_dropped: usize,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stdout_truncated_notice(&self) -> String {
        if self.stdout_dropped > 0 {
            format!("\n[stdout truncated {} bytes]\n", self.stdout_dropped)
        } else {
            String::new()
        }
    }

    /// Last non-empty stderr line, for compact error reporting.
    pub fn stderr_tail(&self) -> Option<String> {
        String::from_utf8_lossy(&self.stderr)
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    }
}

/// Spawn `cmd`, write `input` to its stdin, and wait up to `timeout`.
///
/// Each of stdout and stderr keeps at most `output_limit_bytes`; the rest is
/// drained and counted. A child that outlives the timeout is killed.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), input_bytes = input.len()))]
pub fn run_with_input(
    mut cmd: Command,
    input: Vec<u8>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<ProcessOutput> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning generation command");
    let mut child = cmd.spawn().context("spawn generation command")?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin was not piped"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let writer = thread::spawn(move || -> std::io::Result<()> {
        stdin.write_all(&input)?;
        // Dropping stdin closes the pipe so the child sees EOF.
        Ok(())
    });
    let stdout_reader = thread::spawn(move || read_limited(stdout, output_limit_bytes));
    let stderr_reader = thread::spawn(move || read_limited(stderr, output_limit_bytes));

    let (status, timed_out) = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => (status, false),
        None => {
            warn!(timeout_secs = timeout.as_secs(), "generation command timed out, killing");
            child.kill().context("kill command")?;
            (child.wait().context("wait command after kill")?, true)
        }
    };

    if let Err(err) = join(writer)? {
        // The child may exit without reading all of stdin; that is its choice.
        debug!(err = %err, "stdin closed early");
    }
    let (stdout, stdout_dropped) = join(stdout_reader)?.context("read stdout")?;
    let (stderr, stderr_dropped) = join(stderr_reader)?.context("read stderr")?;
    if stdout_dropped > 0 || stderr_dropped > 0 {
        warn!(stdout_dropped, stderr_dropped, "command output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "generation command finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        stdout_dropped,
        timed_out,
    })
}

fn join<T>(handle: JoinHandle<T>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("process I/O thread panicked"))
}

fn read_limited<R: Read>(mut reader: R, limit: usize) -> std::io::Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Ok((kept, dropped));
        }
        let keep = n.min(limit.saturating_sub(kept.len()));
        kept.extend_from_slice(&chunk[..keep]);
        dropped += n - keep;
    }
}
