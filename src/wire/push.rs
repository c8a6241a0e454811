//! Push telegram parsing — periodic telemetry from `chassis_push`/`gimbal_push`
//! subscriptions (§4.3).
//!
//! Grounded on `RTDESubscriber`'s decode loop (`rtde.rs`): a fixed set of known
//! record shapes, a fallback path for anything else, and a once-per-key log so
//! an unrecognized tag doesn't flood the log at push frequency.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::OnceLock;

use serde::Serialize;

use crate::error::{Error, Result};
use super::{split_telegrams, tokenize};

/// Serializable so a caller can forward decoded telemetry to a log sink or a
/// bridge process as JSON, the way the teacher's `json_output.rs` did for its
/// own command/status events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum PushRecord {
    ChassisPosition { x: f64, y: f64, z: f64 },
    ChassisAttitude { pitch: f64, roll: f64, yaw: f64 },
    ChassisStatus(ChassisStatus),
    GimbalAttitude { pitch: f64, yaw: f64 },
}

/// The eleven boolean flags reported by `chassis status` pushes, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChassisStatus {
    pub is_static: bool,
    pub uphill: bool,
    pub downhill: bool,
    pub on_slope: bool,
    pub is_pick_up: bool,
    pub slip: bool,
    pub impact_x: bool,
    pub impact_y: bool,
    pub impact_z: bool,
    pub roll_over: bool,
    pub hill_static: bool,
}

fn unknown_keys_seen() -> &'static Mutex<HashSet<String>> {
    static SEEN: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    SEEN.get_or_init(|| Mutex::new(HashSet::new()))
}

fn warn_once(key: &str, payload: &str) {
    let mut seen = unknown_keys_seen().lock().unwrap_or_else(|p| p.into_inner());
    if seen.insert(key.to_string()) {
        tracing::warn!(%key, %payload, "unrecognized push telegram, dropping (further instances suppressed)");
    }
}

/// Parse a raw push datagram payload, which may concatenate several telegrams
/// separated by `;` with no guarantee of a space after the separator (§4.3).
/// Each telegram is split and decoded independently: a malformed or unknown
/// telegram is logged and dropped without discarding its neighbors. Returns
/// the records found, in arrival order within the datagram.
pub fn parse(payload: &str) -> Vec<PushRecord> {
    split_telegrams(payload).filter_map(parse_one).collect()
}

fn parse_one(telegram: &str) -> Option<PushRecord> {
    let tokens = tokenize(telegram);
    if tokens.len() < 2 {
        warn_once("push:short-telegram", telegram);
        return None;
    }

    let subsystem = tokens[0];
    let group = tokens[1];
    let values = &tokens[2..];

    let result = match (subsystem, group) {
        ("chassis", "position") => parse_chassis_position(values),
        ("chassis", "attitude") => parse_chassis_attitude(values),
        ("chassis", "status") => parse_chassis_status(values),
        ("gimbal", "attitude") => parse_gimbal_attitude(values),
        _ => {
            warn_once(&format!("push:{subsystem}:{group}"), telegram);
            return None;
        }
    };

    match result {
        Ok(record) => Some(record),
        Err(e) => {
            warn_once(&format!("push:{subsystem}:{group}:parse-error"), telegram);
            tracing::debug!(error = %e, telegram = %telegram, "push telegram parse error");
            None
        }
    }
}

fn parse_f64(values: &[&str], idx: usize, field: &'static str) -> Result<f64> {
    values
        .get(idx)
        .ok_or_else(|| Error::Parse(format!("missing field {field}")))?
        .parse::<f64>()
        .map_err(|e| Error::Parse(format!("field {field}: {e}")))
}

fn parse_bool01(values: &[&str], idx: usize, field: &'static str) -> Result<bool> {
    match values.get(idx) {
        Some(&"0") => Ok(false),
        Some(&"1") => Ok(true),
        Some(other) => Err(Error::Parse(format!("field {field}: expected 0/1, got {other:?}"))),
        None => Err(Error::Parse(format!("missing field {field}"))),
    }
}

fn parse_chassis_position(values: &[&str]) -> Result<PushRecord> {
    Ok(PushRecord::ChassisPosition {
        x: parse_f64(values, 0, "x")?,
        y: parse_f64(values, 1, "y")?,
        z: parse_f64(values, 2, "z")?,
    })
}

fn parse_chassis_attitude(values: &[&str]) -> Result<PushRecord> {
    Ok(PushRecord::ChassisAttitude {
        pitch: parse_f64(values, 0, "pitch")?,
        roll: parse_f64(values, 1, "roll")?,
        yaw: parse_f64(values, 2, "yaw")?,
    })
}

fn parse_chassis_status(values: &[&str]) -> Result<PushRecord> {
    Ok(PushRecord::ChassisStatus(ChassisStatus {
        is_static: parse_bool01(values, 0, "static")?,
        uphill: parse_bool01(values, 1, "uphill")?,
        downhill: parse_bool01(values, 2, "downhill")?,
        on_slope: parse_bool01(values, 3, "on_slope")?,
        is_pick_up: parse_bool01(values, 4, "pick_up")?,
        slip: parse_bool01(values, 5, "slip")?,
        impact_x: parse_bool01(values, 6, "impact_x")?,
        impact_y: parse_bool01(values, 7, "impact_y")?,
        impact_z: parse_bool01(values, 8, "impact_z")?,
        roll_over: parse_bool01(values, 9, "roll_over")?,
        hill_static: parse_bool01(values, 10, "hill_static")?,
    }))
}

fn parse_gimbal_attitude(values: &[&str]) -> Result<PushRecord> {
    Ok(PushRecord::GimbalAttitude {
        pitch: parse_f64(values, 0, "pitch")?,
        yaw: parse_f64(values, 1, "yaw")?,
    })
}
