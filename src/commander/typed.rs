//! Typed method surface over [`Commander::do_cmd`] (§4.2 "Supported commands").
//!
//! Each method here does exactly three things: validate its arguments against
//! the wire-side constraints in [`super::args`], compose the correct `Arg` list,
//! and pick `expects_ok` for the command's reply shape. No method talks to the
//! socket directly — that discipline lives entirely in `do_cmd`.

use super::args::{validate_push_frequency, validate_range_f64, validate_range_i64};
use super::{Arg, Commander};
use crate::error::Result;

impl Commander {
    // ---- Session -------------------------------------------------------

    pub fn version(&self) -> Result<String> {
        self.do_cmd("version", &[], false)
    }

    pub fn get_robot_mode(&self) -> Result<String> {
        self.do_cmd("robot_mode", &[], false)
    }

    pub fn robot_mode(&self, mode: RobotMode) -> Result<()> {
        self.do_cmd("robot_mode", &[Arg::Token(mode.wire_token())], true)?;
        Ok(())
    }

    pub fn get_ip(&self) -> Result<String> {
        self.do_cmd("ip", &[], false)
    }

    // ---- Chassis ---------------------------------------------------------

    /// Continuous velocity drive: `x`/`y` in m/s, `z` (yaw rate) in deg/s.
    pub fn chassis_speed(&self, x: f64, y: f64, z: f64) -> Result<()> {
        validate_range_f64("x", x, -3.5, 3.5)?;
        validate_range_f64("y", y, -3.5, 3.5)?;
        validate_range_f64("z", z, -600.0, 600.0)?;
        self.do_cmd("chassis_speed", &[Arg::Float(x), Arg::Float(y), Arg::Float(z)], true)?;
        Ok(())
    }

    /// Relative positional move: `x`/`y` in meters, `z` in degrees, at `speed` m/s.
    pub fn chassis_move(&self, x: f64, y: f64, z: f64, speed: f64) -> Result<()> {
        validate_range_f64("x", x, -5.0, 5.0)?;
        validate_range_f64("y", y, -5.0, 5.0)?;
        validate_range_f64("z", z, -1800.0, 1800.0)?;
        validate_range_f64("speed", speed, 0.0, 3.5)?;
        self.do_cmd(
            "chassis_move",
            &[Arg::Float(x), Arg::Float(y), Arg::Float(z), Arg::Float(speed)],
            true,
        )?;
        Ok(())
    }

    /// Per-wheel speed in RPM, ordered front-right/front-left/rear-left/rear-right.
    pub fn chassis_wheel(&self, w1: i64, w2: i64, w3: i64, w4: i64) -> Result<()> {
        for (field, w) in [("w1", w1), ("w2", w2), ("w3", w3), ("w4", w4)] {
            validate_range_i64(field, w, -1000, 1000)?;
        }
        self.do_cmd(
            "chassis_wheel",
            &[Arg::Int(w1), Arg::Int(w2), Arg::Int(w3), Arg::Int(w4)],
            true,
        )?;
        Ok(())
    }

    /// Enable chassis telemetry push at independently configurable frequencies
    /// (Hz, must be one of [`super::args::VALID_PUSH_FREQUENCIES`]).
    pub fn chassis_push_on(&self, pos_freq: u32, attitude_freq: u32, status_freq: u32) -> Result<()> {
        validate_push_frequency("pos_freq", pos_freq)?;
        validate_push_frequency("attitude_freq", attitude_freq)?;
        validate_push_frequency("status_freq", status_freq)?;
        self.do_cmd(
            "chassis_push",
            &[
                Arg::Token("pos"),
                Arg::Token("on"),
                Arg::Token("pos_freq"),
                Arg::Int(pos_freq as i64),
                Arg::Token("attitude"),
                Arg::Token("on"),
                Arg::Token("attitude_freq"),
                Arg::Int(attitude_freq as i64),
                Arg::Token("status"),
                Arg::Token("on"),
                Arg::Token("status_freq"),
                Arg::Int(status_freq as i64),
            ],
            true,
        )?;
        Ok(())
    }

    pub fn chassis_push_off(&self) -> Result<()> {
        self.do_cmd(
            "chassis_push",
            &[Arg::Token("pos"), Arg::Token("off"), Arg::Token("attitude"), Arg::Token("off"), Arg::Token("status"), Arg::Token("off")],
            true,
        )?;
        Ok(())
    }

    pub fn get_chassis_position(&self) -> Result<String> {
        self.do_cmd("chassis_position", &[], false)
    }

    pub fn get_chassis_attitude(&self) -> Result<String> {
        self.do_cmd("chassis_attitude", &[], false)
    }

    pub fn get_chassis_status(&self) -> Result<String> {
        self.do_cmd("chassis_status", &[], false)
    }

    // ---- Gimbal ------------------------------------------------------------

    /// Relative move: `pitch`/`yaw` in degrees at `pitch_speed`/`yaw_speed` deg/s.
    pub fn gimbal_move(&self, pitch: f64, yaw: f64, pitch_speed: f64, yaw_speed: f64) -> Result<()> {
        validate_range_f64("pitch", pitch, -55.0, 55.0)?;
        validate_range_f64("yaw", yaw, -250.0, 250.0)?;
        validate_range_f64("pitch_speed", pitch_speed, 0.0, 540.0)?;
        validate_range_f64("yaw_speed", yaw_speed, 0.0, 540.0)?;
        self.do_cmd(
            "gimbal_move",
            &[
                Arg::Token("pitch"), Arg::Float(pitch),
                Arg::Token("yaw"), Arg::Float(yaw),
                Arg::Token("pitch_speed"), Arg::Float(pitch_speed),
                Arg::Token("yaw_speed"), Arg::Float(yaw_speed),
            ],
            true,
        )?;
        Ok(())
    }

    /// Absolute move to `pitch`/`yaw` degrees, robot-frame-zero referenced.
    pub fn gimbal_moveto(&self, pitch: f64, yaw: f64, pitch_speed: f64, yaw_speed: f64) -> Result<()> {
        validate_range_f64("pitch", pitch, -55.0, 55.0)?;
        validate_range_f64("yaw", yaw, -250.0, 250.0)?;
        validate_range_f64("pitch_speed", pitch_speed, 0.0, 540.0)?;
        validate_range_f64("yaw_speed", yaw_speed, 0.0, 540.0)?;
        self.do_cmd(
            "gimbal_moveto",
            &[
                Arg::Token("pitch"), Arg::Float(pitch),
                Arg::Token("yaw"), Arg::Float(yaw),
                Arg::Token("pitch_speed"), Arg::Float(pitch_speed),
                Arg::Token("yaw_speed"), Arg::Float(yaw_speed),
            ],
            true,
        )?;
        Ok(())
    }

    pub fn gimbal_suspend(&self) -> Result<()> {
        self.do_cmd("gimbal_suspend", &[], true)?;
        Ok(())
    }

    pub fn gimbal_resume(&self) -> Result<()> {
        self.do_cmd("gimbal_resume", &[], true)?;
        Ok(())
    }

    pub fn gimbal_recenter(&self) -> Result<()> {
        self.do_cmd("gimbal_recenter", &[], true)?;
        Ok(())
    }

    pub fn gimbal_push_on(&self, attitude_freq: u32) -> Result<()> {
        validate_push_frequency("attitude_freq", attitude_freq)?;
        self.do_cmd(
            "gimbal_push",
            &[Arg::Token("attitude"), Arg::Token("on"), Arg::Token("attitude_freq"), Arg::Int(attitude_freq as i64)],
            true,
        )?;
        Ok(())
    }

    // ---- Blaster -------------------------------------------------------------

    pub fn blaster_fire(&self, kind: BlasterFireMode) -> Result<()> {
        self.do_cmd("blaster_fire", &[Arg::Token(kind.wire_token())], true)?;
        Ok(())
    }

    /// Fire `count` water bead rounds.
    pub fn blaster_bead(&self, count: u8) -> Result<()> {
        self.do_cmd("blaster_bead", &[Arg::Int(count as i64)], true)?;
        Ok(())
    }

    // ---- Sensors / LEDs ---------------------------------------------------

    /// Armor-hit detection sensitivity, 1 (least sensitive) to 10 (most).
    pub fn armor_sensitivity(&self, level: u8) -> Result<()> {
        validate_range_i64("level", level as i64, 1, 10)?;
        self.do_cmd("armor_sensitivity", &[Arg::Int(level as i64)], true)?;
        Ok(())
    }

    pub fn armor_event(&self, kind: ArmorEventKind, on: bool) -> Result<()> {
        self.do_cmd("armor_event", &[Arg::Token(kind.wire_token()), Arg::Bool(on)], true)?;
        Ok(())
    }

    pub fn sound_event(&self, kind: SoundEventKind, on: bool) -> Result<()> {
        self.do_cmd("sound_event", &[Arg::Token(kind.wire_token()), Arg::Bool(on)], true)?;
        Ok(())
    }

    pub fn led_control(&self, comp: LedComponent, r: u8, g: u8, b: u8) -> Result<()> {
        self.do_cmd(
            "led_control",
            &[Arg::Token(comp.wire_token()), Arg::Int(r as i64), Arg::Int(g as i64), Arg::Int(b as i64)],
            true,
        )?;
        Ok(())
    }

    // ---- Video -------------------------------------------------------------

    pub fn stream(&self, on: bool) -> Result<()> {
        self.do_cmd("stream", &[Arg::Bool(on)], true)?;
        Ok(())
    }
}

/// `robot_mode` wire tokens (§4.2 "Session").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotMode {
    Chassis,
    Gimbal,
    Free,
}

impl RobotMode {
    fn wire_token(self) -> &'static str {
        match self {
            RobotMode::Chassis => "chassis_lead",
            RobotMode::Gimbal => "gimbal_lead",
            RobotMode::Free => "free",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlasterFireMode {
    Infrared,
    Bead,
}

impl BlasterFireMode {
    fn wire_token(self) -> &'static str {
        match self {
            BlasterFireMode::Infrared => "ir",
            BlasterFireMode::Bead => "water",
        }
    }
}

/// `armor_event` subscription kind (§4.2 "Sensors/LEDs").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmorEventKind {
    Hit,
    Click,
}

impl ArmorEventKind {
    fn wire_token(self) -> &'static str {
        match self {
            ArmorEventKind::Hit => "hit",
            ArmorEventKind::Click => "click",
        }
    }
}

/// `sound_event` subscription kind. Only `applause` is decoded on the event
/// socket today (`wire::event::EventRecord::Applause`); the variant still
/// exists on its own so a new sound kind can be added without renaming the
/// subscribe-toggle method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEventKind {
    Applause,
}

impl SoundEventKind {
    fn wire_token(self) -> &'static str {
        match self {
            SoundEventKind::Applause => "applause",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedComponent {
    All,
    Top,
    Bottom,
}

impl LedComponent {
    fn wire_token(self) -> &'static str {
        match self {
            LedComponent::All => "all",
            LedComponent::Top => "top",
            LedComponent::Bottom => "bottom",
        }
    }
}
