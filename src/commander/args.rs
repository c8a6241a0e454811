//! Wire-level argument encoding and host-side range validation (§4.2).
//!
//! Every value that travels in a Commander request line passes through [`Arg`],
//! which owns the locale-independent formatting the spec requires: booleans become
//! `on`/`off`, floats are fixed-precision, enums emit their wire token.

use std::fmt;

use crate::error::{Error, Result};

/// One positional token in a Commander request line.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Bool(bool),
    Token(&'static str),
    Text(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{v}"),
            // Fixed 3-decimal, locale-independent: no thousands separators, '.' always.
            Arg::Float(v) => write!(f, "{v:.3}"),
            Arg::Bool(v) => write!(f, "{}", if *v { "on" } else { "off" }),
            Arg::Token(t) => write!(f, "{t}"),
            Arg::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<u8> for Arg {
    fn from(v: u8) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Float(v as f64)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

/// Push/gimbal-attitude update frequencies the firmware accepts, in Hz.
/// Resolves spec.md's Open Question (a): asserted here, not documented on the wire.
pub const VALID_PUSH_FREQUENCIES: &[u32] = &[1, 5, 10, 20, 30, 50];

pub fn validate_push_frequency(field: &'static str, hz: u32) -> Result<()> {
    if VALID_PUSH_FREQUENCIES.contains(&hz) {
        Ok(())
    } else {
        Err(Error::invalid_arg(
            field,
            format!("must be one of {VALID_PUSH_FREQUENCIES:?}, got {hz}"),
        ))
    }
}

pub fn validate_range_f64(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::invalid_arg(field, format!("must be within [{min}, {max}], got {value}")))
    }
}

pub fn validate_range_i64(field: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::invalid_arg(field, format!("must be within [{min}, {max}], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_formats_as_on_off() {
        assert_eq!(Arg::Bool(true).to_string(), "on");
        assert_eq!(Arg::Bool(false).to_string(), "off");
    }

    #[test]
    fn float_formats_fixed_precision() {
        assert_eq!(Arg::Float(1.0).to_string(), "1.000");
        assert_eq!(Arg::Float(-0.5).to_string(), "-0.500");
    }

    #[test]
    fn frequency_validation_rejects_arbitrary_values() {
        assert!(validate_push_frequency("pos_freq", 10).is_ok());
        assert!(validate_push_frequency("pos_freq", 7).is_err());
    }

    #[test]
    fn range_validation_rejects_out_of_bounds() {
        assert!(validate_range_i64("sensitivity", 5, 1, 10).is_ok());
        assert!(validate_range_i64("sensitivity", 0, 1, 10).is_err());
        assert!(validate_range_i64("sensitivity", 11, 1, 10).is_err());
    }
}
