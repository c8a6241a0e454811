//! Shared framing helpers for the UDP push (§4.3) and event (§4.4) telegrams.
//!
//! Both wire formats are whitespace-tokenized ASCII records, one or more of
//! which may be concatenated into a single datagram separated by `;` (with no
//! guarantee of a space after the separator). Parsing here never panics: a
//! malformed or unknown telegram is logged and dropped without taking the
//! rest of the datagram down with it.

pub mod event;
pub mod push;

/// Split a raw datagram payload into its constituent `;`-separated telegrams.
/// Trailing NUL/CR/LF padding is stripped first; empty segments (a trailing
/// `;` with nothing after it) are discarded.
pub(crate) fn split_telegrams(payload: &str) -> impl Iterator<Item = &str> {
    payload
        .trim_end_matches(['\0', '\r', '\n'])
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

/// Tokenize a single already-split telegram on whitespace.
pub(crate) fn tokenize(telegram: &str) -> Vec<&str> {
    telegram.split_whitespace().collect()
}
