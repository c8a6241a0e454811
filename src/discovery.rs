//! IP Discovery — listens on the robot's UDP broadcast beacon (§4.1).
//!
//! The robot periodically broadcasts an ASCII datagram of the form
//! `robot ip <dotted-quad>`. This mirrors the reference `InterpreterClient::connect`'s
//! blocking-socket-with-read-timeout discipline (`interpreter.rs`), applied to a UDP
//! recv loop instead of a TCP stream.

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const BEACON_PREFIX: &str = "robot ip ";

/// Block on the all-interfaces broadcast port until a beacon datagram arrives or
/// `timeout` elapses, returning the robot's self-announced IPv4 address.
pub fn discover_ip(broadcast_port: u16, timeout: Duration) -> Result<String> {
    let socket = UdpSocket::bind(("0.0.0.0", broadcast_port))?;
    socket.set_broadcast(true)?;

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; 512];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::DiscoveryTimeout);
        }
        // Poll in short slices so a caller-chosen overall timeout is still honored
        // even though UdpSocket::set_read_timeout only takes one fixed value.
        socket.set_read_timeout(Some(remaining.min(Duration::from_millis(250))))?;

        match socket.recv_from(&mut buf) {
            Ok((n, _addr)) => {
                let payload = String::from_utf8_lossy(&buf[..n]);
                if let Some(ip) = parse_beacon(&payload) {
                    return Ok(ip);
                }
                // Not a recognized beacon; keep listening until the deadline.
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn parse_beacon(payload: &str) -> Option<String> {
    payload
        .strip_prefix(BEACON_PREFIX)
        .map(|rest| rest.trim_matches(|c: char| c == '\0' || c.is_whitespace()).to_string())
}
