//! Event telegram parsing — one-shot notifications from `armor_event`/
//! `sound_event` subscriptions (§4.4).
//!
//! Shares framing with [`super::push`] but each telegram is its own occurrence
//! rather than a periodic sample; arrival-order, not a push cadence, is the
//! property callers care about here.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use serde::Serialize;

use crate::error::{Error, Result};
use super::{split_telegrams, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum EventRecord {
    ArmorHit { index: u8, kind: ArmorHitKind },
    /// `count` is an unconstrained repeat count (spec.md Open Question (b)):
    /// any `u8` on the wire is accepted and forwarded as-is.
    Applause { count: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArmorHitKind {
    Impact,
    Sound,
}

fn unknown_keys_seen() -> &'static Mutex<HashSet<String>> {
    static SEEN: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    SEEN.get_or_init(|| Mutex::new(HashSet::new()))
}

fn warn_once(key: &str, payload: &str) {
    let mut seen = unknown_keys_seen().lock().unwrap_or_else(|p| p.into_inner());
    if seen.insert(key.to_string()) {
        tracing::warn!(%key, %payload, "unrecognized event telegram, dropping (further instances suppressed)");
    }
}

/// Parse a raw event datagram payload, which may concatenate several
/// telegrams separated by `;` with no guarantee of a space after the
/// separator (§4.4), following the same split-then-decode-each, drop-and-log
/// discipline as [`super::push::parse`].
pub fn parse(payload: &str) -> Vec<EventRecord> {
    split_telegrams(payload).filter_map(parse_one).collect()
}

fn parse_one(telegram: &str) -> Option<EventRecord> {
    let tokens = tokenize(telegram);
    if tokens.len() < 2 {
        warn_once("event:short-telegram", telegram);
        return None;
    }

    let subsystem = tokens[0];
    let group = tokens[1];
    let values = &tokens[2..];

    let result = match (subsystem, group) {
        ("armor", "hit") => parse_armor_hit(values),
        ("sound", "applause") => parse_applause(values),
        _ => {
            warn_once(&format!("event:{subsystem}:{group}"), telegram);
            return None;
        }
    };

    match result {
        Ok(record) => Some(record),
        Err(e) => {
            warn_once(&format!("event:{subsystem}:{group}:parse-error"), telegram);
            tracing::debug!(error = %e, telegram = %telegram, "event telegram parse error");
            None
        }
    }
}

fn parse_armor_hit(values: &[&str]) -> Result<EventRecord> {
    let index = values
        .first()
        .ok_or_else(|| Error::Parse("missing armor index".to_string()))?
        .parse::<u8>()
        .map_err(|e| Error::Parse(format!("armor index: {e}")))?;
    let kind = match values.get(1) {
        Some(&"1") => ArmorHitKind::Impact,
        Some(&"2") => ArmorHitKind::Sound,
        Some(other) => return Err(Error::Parse(format!("unknown armor hit kind {other:?}"))),
        None => return Err(Error::Parse("missing armor hit kind".to_string())),
    };
    Ok(EventRecord::ArmorHit { index, kind })
}

fn parse_applause(values: &[&str]) -> Result<EventRecord> {
    let count = values
        .first()
        .ok_or_else(|| Error::Parse("missing applause count".to_string()))?
        .parse::<u8>()
        .map_err(|e| Error::Parse(format!("applause count: {e}")))?;
    Ok(EventRecord::Applause { count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_armor_hit() {
        assert_eq!(parse("armor hit 3 1;"), vec![EventRecord::ArmorHit { index: 3, kind: ArmorHitKind::Impact }]);
    }

    #[test]
    fn parses_applause() {
        assert_eq!(parse("sound applause 2;"), vec![EventRecord::Applause { count: 2 }]);
    }

    #[test]
    fn applause_count_is_unconstrained() {
        assert_eq!(parse("sound applause 255;"), vec![EventRecord::Applause { count: 255 }]);
        assert_eq!(parse("sound applause 0;"), vec![EventRecord::Applause { count: 0 }]);
    }

    #[test]
    fn splits_multiple_records_concatenated_with_no_space_after_separator() {
        let records = parse("armor hit 3 1;sound applause 2;");
        assert_eq!(
            records,
            vec![
                EventRecord::ArmorHit { index: 3, kind: ArmorHitKind::Impact },
                EventRecord::Applause { count: 2 },
            ]
        );
    }

    #[test]
    fn unknown_event_drops_without_panicking() {
        assert_eq!(parse("arm hit 3 1;"), Vec::new());
    }

    #[test]
    fn malformed_armor_kind_drops_without_panicking() {
        assert_eq!(parse("armor hit 3 9;"), Vec::new());
    }
}
