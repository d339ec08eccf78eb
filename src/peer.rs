//! GTP peers reached over a byte stream.
//!
//! [`ProcessPeer`] runs an external engine as a child process and talks GTP
//! over its stdin/stdout. Each [`send`](Transport::send) writes one command and
//! blocks until the blank line that ends the response, or until the per-call
//! timeout expires.
//!
//! A reader thread forwards stdout lines over a channel so waits can be
//! bounded. After a timeout the unread rest of that response may still
//! arrive, so the peer is poisoned and refuses further commands instead of
//! handing a stale block to the next caller.

use std::fmt;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::QUIT_GRACE_PERIOD;
use crate::engine::Engine;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{label}: I/O error: {source}")]
    Io {
        label: String,
        #[source]
        source: io::Error,
    },
    #[error("{label}: no response within {timeout:?}")]
    Timeout { label: String, timeout: Duration },
    #[error("{label}: peer terminated unexpectedly")]
    Terminated { label: String },
    #[error("{label}: peer unusable after an earlier failure")]
    Poisoned { label: String },
    #[error("{label}: {command:?} rejected: {reason}")]
    Rejected {
        label: String,
        command: String,
        reason: String,
    },
    #[error("{label}: malformed response to {command:?}: {reason}")]
    Malformed {
        label: String,
        command: String,
        reason: String,
    },
}

/// Something that answers GTP command lines with response blocks.
pub trait Transport {
    /// Send one command line (with trailing newline) and return its response
    /// block without the terminating blank line.
    fn send(&mut self, line: &str) -> Result<String, PeerError>;

    /// Ask the peer to quit and release it.
    fn close(&mut self) -> Result<(), PeerError>;

    /// Rename the peer in log output.
    fn set_label(&mut self, _label: &str) {}
}

/// How to launch an engine: program plus its own arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineSpec {
    pub fn new(command: impl Into<String>, args: &[&str]) -> Self {
        Self {
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Split a command line on whitespace, e.g. `"gnugo --mode gtp"`.
    /// Returns `None` for a blank line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(String::from);
        let command = parts.next()?;
        Some(Self {
            command,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for EngineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Process Peer
// =============================================================================

pub struct ProcessPeer {
    label: String,
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    rx: Receiver<String>,
    timeout: Duration,
    poisoned: bool,
}

impl ProcessPeer {
    /// Launch `spec` with piped stdin/stdout.
    pub fn spawn(label: &str, spec: &EngineSpec, timeout: Duration) -> Result<Self, PeerError> {
        let spawn_error = |source| PeerError::Spawn {
            command: spec.to_string(),
            source,
        };
        let mut child = Command::new(&spec.command)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        let missing = |what: &str| spawn_error(io::Error::other(format!("no {what} pipe")));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;

        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            // Raw bytes, so a stray non-UTF-8 byte cannot end the stream.
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        let line = line.trim_end_matches(['\n', '\r']).to_string();
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        info!(peer = label, command = %spec, "subprocess created");
        Ok(Self {
            label: label.to_string(),
            child,
            stdin: Some(BufWriter::new(stdin)),
            rx,
            timeout,
            poisoned: false,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))?;
        stdin.write_all(line.as_bytes())?;
        if !line.ends_with('\n') {
            stdin.write_all(b"\n")?;
        }
        stdin.flush()
    }

    /// Collect lines up to the blank terminator. Blank lines before the
    /// first response line are skipped.
    fn read_block(&mut self) -> Result<String, PeerError> {
        let deadline = Instant::now() + self.timeout;
        let mut block = String::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(line) if line.trim().is_empty() => {
                    if !block.is_empty() {
                        return Ok(block);
                    }
                }
                Ok(line) => {
                    block.push_str(&line);
                    block.push('\n');
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(PeerError::Timeout {
                        label: self.label.clone(),
                        timeout: self.timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(PeerError::Terminated {
                        label: self.label.clone(),
                    });
                }
            }
        }
    }

    fn wait_or_kill(&mut self) {
        let deadline = Instant::now() + QUIT_GRACE_PERIOD;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        warn!(peer = %self.label, "did not exit after quit, killing");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Transport for ProcessPeer {
    fn send(&mut self, line: &str) -> Result<String, PeerError> {
        if self.poisoned {
            return Err(PeerError::Poisoned {
                label: self.label.clone(),
            });
        }

        debug!(peer = %self.label, "-> {}", line.trim_end());
        if let Err(source) = self.write_line(line) {
            self.poisoned = true;
            return Err(match source.kind() {
                io::ErrorKind::BrokenPipe => PeerError::Terminated {
                    label: self.label.clone(),
                },
                _ => PeerError::Io {
                    label: self.label.clone(),
                    source,
                },
            });
        }

        let block = self.read_block().inspect_err(|_| self.poisoned = true)?;
        if block.trim() != "=" {
            debug!(peer = %self.label, "<- {}", block.trim());
        }
        Ok(block)
    }

    /// Send `quit`, close stdin and wait for the process to exit. The
    /// acknowledgement is not awaited; the process is killed if it lingers.
    fn close(&mut self) -> Result<(), PeerError> {
        if self.stdin.is_none() {
            return Ok(());
        }
        info!(peer = %self.label, "quitting subprocess");

        let result = self.write_line("quit\n").map_err(|source| PeerError::Io {
            label: self.label.clone(),
            source,
        });
        self.stdin = None;
        self.wait_or_kill();
        match result {
            Err(PeerError::Io { source, .. }) if source.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }

    fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }
}

impl Drop for ProcessPeer {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// =============================================================================
// In-process Loopback
// =============================================================================

/// An [`Engine`] answers directly, without a process in between.
impl Transport for Engine {
    fn send(&mut self, line: &str) -> Result<String, PeerError> {
        if self.is_disconnected() {
            return Err(PeerError::Terminated {
                label: "loopback".to_string(),
            });
        }
        let mut block = Engine::send(self, line);
        block.pop();
        Ok(block)
    }

    fn close(&mut self) -> Result<(), PeerError> {
        if !self.is_disconnected() {
            Engine::send(self, "quit");
        }
        Ok(())
    }
}
