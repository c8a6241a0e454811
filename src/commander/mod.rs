//! The Commander — a synchronous, single-flight TCP text client (§4.2).
//!
//! Grounded on the reference `InterpreterClient` (`interpreter.rs`): a blocking
//! `std::net::TcpStream`, a byte-at-a-time reply reader guarded by a socket read
//! timeout, and a `Drop` impl that never sends a parting command the peer wasn't
//! asked for. The spec additionally requires single-flight serialization across
//! threads, so the session state here lives behind a `std::sync::Mutex` and
//! `Commander` itself is handed out as `Arc<Commander>` to share across workers —
//! the synchronous analogue of the reference's `Arc<tokio::sync::Mutex<RobotController>>`.

pub mod args;
mod typed;

use regex::Regex;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::discovery;
use crate::error::{Error, Result};

pub use args::Arg;
pub use typed::{ArmorEventKind, BlasterFireMode, LedComponent, RobotMode, SoundEventKind};

const HANDSHAKE_CMD: &str = "command";
const HANDSHAKE_OK: &str = "ok";

struct Inner {
    stream: TcpStream,
    /// Set once a read times out; every subsequent `do_cmd` short-circuits with
    /// `Error::Closed` without touching the socket (Testable Property 9).
    poisoned: bool,
}

/// A connected session to one robot's text-protocol port (40923 by default).
///
/// At most one request is ever in flight per `Commander` (the session mutex
/// enforces this); build additional `Commander`s against the same host for
/// parallel command streams (§4.2 "Contract for movement commands").
pub struct Commander {
    host: String,
    timeout: Duration,
    /// Identity tag for log correlation, per §3 "Commander session".
    id: uuid::Uuid,
    error_pattern: Regex,
    inner: Mutex<Inner>,
}

impl Commander {
    /// Connect to `host` (or discover it via the UDP broadcast beacon when
    /// `host` is `None`), complete the `command;` handshake, and return a ready
    /// session.
    pub fn connect(host: Option<&str>, port: u16, timeout: Duration) -> Result<Self> {
        Self::connect_with_discovery_port(host, port, timeout, 40926, timeout)
    }

    pub fn connect_with_discovery_port(
        host: Option<&str>,
        port: u16,
        timeout: Duration,
        discovery_port: u16,
        discovery_timeout: Duration,
    ) -> Result<Self> {
        let host = match host {
            Some(h) => h.to_string(),
            None => discovery::discover_ip(discovery_port, discovery_timeout)?,
        };

        let id = uuid::Uuid::new_v4();
        tracing::info!(%id, %host, port, "connecting to robot");

        let stream = TcpStream::connect((host.as_str(), port))?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;

        let error_pattern = Regex::new(r"(?i)^error").expect("static regex is valid");

        let commander = Self {
            host,
            timeout,
            id,
            error_pattern,
            inner: Mutex::new(Inner { stream, poisoned: false }),
        };

        let greeting = commander.do_cmd_raw(HANDSHAKE_CMD, &[], true)?;
        if greeting != HANDSHAKE_OK {
            return Err(Error::Handshake { got: greeting });
        }

        tracing::info!(id = %commander.id, "handshake complete");
        Ok(commander)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Close the socket without sending `quit;`, per spec.md §9 Open Question (c) —
    /// other Commanders sharing the robot are left undisturbed.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|poison| poison.into_inner());
        inner.poisoned = true;
        tracing::info!(id = %self.id, "commander closed");
    }

    /// Request primitive (§4.2 step-by-step): compose `cmd arg1 arg2 ...;`, write
    /// it, read the reply up to the next `;`, and classify the result.
    ///
    /// `expects_ok` marks "void" commands whose only successful body is `ok`;
    /// any other body for such a command is a `Remote` error. Query commands pass
    /// `expects_ok = false` and their body is returned verbatim unless it matches
    /// the error pattern `/^error/i`.
    pub fn do_cmd(&self, cmd: &str, args: &[Arg], expects_ok: bool) -> Result<String> {
        self.do_cmd_raw(cmd, args, expects_ok)
    }

    fn do_cmd_raw(&self, cmd: &str, args: &[Arg], expects_ok: bool) -> Result<String> {
        let mut inner = self.inner.lock().unwrap_or_else(|poison| poison.into_inner());

        if inner.poisoned {
            return Err(Error::Closed);
        }

        let line = compose_line(cmd, args);
        tracing::debug!(id = %self.id, %line, "sending command");

        if let Err(e) = inner.stream.write_all(line.as_bytes()) {
            inner.poisoned = true;
            return Err(e.into());
        }

        match read_until_semicolon(&mut inner.stream, self.timeout) {
            Ok(body) => {
                tracing::debug!(id = %self.id, %body, "received response");
                classify(&body, expects_ok, &self.error_pattern)
            }
            Err(Error::Timeout) => {
                inner.poisoned = true;
                tracing::warn!(id = %self.id, "read timed out, session poisoned");
                Err(Error::Timeout)
            }
            Err(e) => {
                inner.poisoned = true;
                Err(e)
            }
        }
    }

    /// Explicitly send `quit;` and mark the session closed. Unlike `close`, this
    /// is only invoked when a caller opts in (§4.2 "Session").
    pub fn quit(&self) -> Result<()> {
        let body = self.do_cmd_raw("quit", &[], true)?;
        debug_assert_eq!(body, HANDSHAKE_OK);
        self.close();
        Ok(())
    }
}

impl Drop for Commander {
    fn drop(&mut self) {
        // Best effort: never send `quit;` implicitly (spec.md §9 preserves this).
        tracing::debug!(id = %self.id, "commander dropped");
    }
}

fn compose_line(cmd: &str, args: &[Arg]) -> String {
    let mut line = String::from(cmd);
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string());
    }
    line.push(';');
    line
}

fn classify(body: &str, expects_ok: bool, error_pattern: &Regex) -> Result<String> {
    if expects_ok {
        if body == HANDSHAKE_OK {
            return Ok(body.to_string());
        }
        return Err(Error::Remote(body.to_string()));
    }

    if error_pattern.is_match(body) {
        return Err(Error::Remote(body.to_string()));
    }

    Ok(body.to_string())
}

fn read_until_semicolon(stream: &mut TcpStream, timeout: Duration) -> Result<String> {
    let deadline = Instant::now() + timeout;
    let mut collected = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        if Instant::now() >= deadline {
            return Err(Error::Timeout);
        }

        match stream.read_exact(&mut byte) {
            Ok(()) => {
                if byte[0] == b';' {
                    break;
                }
                collected.push(byte[0]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                return Err(Error::Timeout);
            }
            Err(e) => return Err(e.into()),
        }
    }

    String::from_utf8(collected).map_err(|e| Error::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_line_formats_args_and_terminator() {
        let line = compose_line("chassis_speed", &[Arg::Float(1.0), Arg::Float(0.0), Arg::Int(0)]);
        assert_eq!(line, "chassis_speed 1.000 0.000 0;");
    }

    #[test]
    fn compose_line_with_no_args() {
        assert_eq!(compose_line("command", &[]), "command;");
    }

    #[test]
    fn classify_void_command_requires_ok() {
        let re = Regex::new(r"(?i)^error").unwrap();
        assert_eq!(classify("ok", true, &re).unwrap(), "ok");
        assert!(classify("error", true, &re).is_err());
        assert!(classify("anything-else", true, &re).is_err());
    }

    #[test]
    fn classify_query_passes_through_unless_error_prefixed() {
        let re = Regex::new(r"(?i)^error").unwrap();
        assert_eq!(classify("version 00.00.00.60", false, &re).unwrap(), "version 00.00.00.60");
        assert!(classify("error: out of range", false, &re).is_err());
        assert!(classify("ERROR", false, &re).is_err());
    }
}
