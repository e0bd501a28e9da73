//! Firmware settings table (`$n=value`).

use crate::error::GrblError;
use crate::Axis;
use std::collections::BTreeMap;

pub const STATUS_REPORT_MASK: u16 = 10;
pub const SOFT_LIMITS: u16 = 20;
pub const HARD_LIMITS: u16 = 21;
pub const HOMING_ENABLE: u16 = 22;
pub const HOMING_FEED: u16 = 24;
pub const HOMING_SEEK: u16 = 25;
pub const HOMING_PULLOFF: u16 = 27;
pub const MAX_SPINDLE_SPEED: u16 = 30;
pub const LASER_MODE: u16 = 32;
pub const STEPS_PER_MM: u16 = 100;
pub const MAX_RATE: u16 = 110;
pub const ACCELERATION: u16 = 120;
pub const MAX_TRAVEL: u16 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Integer,
    Float,
}

struct SettingDef {
    index: u16,
    kind: Kind,
    default: f64,
}

const fn int(index: u16, default: f64) -> SettingDef {
    SettingDef { index, kind: Kind::Integer, default }
}

const fn float(index: u16, default: f64) -> SettingDef {
    SettingDef { index, kind: Kind::Float, default }
}

// Grbl 1.1 defaults
const TABLE: &[SettingDef] = &[
    int(0, 10.0),
    int(1, 25.0),
    int(2, 0.0),
    int(3, 0.0),
    int(4, 0.0),
    int(5, 0.0),
    int(6, 0.0),
    int(STATUS_REPORT_MASK, 1.0),
    float(11, 0.010),
    float(12, 0.002),
    int(13, 0.0),
    int(SOFT_LIMITS, 0.0),
    int(HARD_LIMITS, 0.0),
    int(HOMING_ENABLE, 0.0),
    int(23, 0.0),
    float(HOMING_FEED, 25.0),
    float(HOMING_SEEK, 500.0),
    int(26, 250.0),
    float(HOMING_PULLOFF, 1.0),
    int(MAX_SPINDLE_SPEED, 1000.0),
    int(31, 0.0),
    int(LASER_MODE, 0.0),
    float(STEPS_PER_MM, 250.0),
    float(STEPS_PER_MM + 1, 250.0),
    float(STEPS_PER_MM + 2, 250.0),
    float(MAX_RATE, 500.0),
    float(MAX_RATE + 1, 500.0),
    float(MAX_RATE + 2, 500.0),
    float(ACCELERATION, 10.0),
    float(ACCELERATION + 1, 10.0),
    float(ACCELERATION + 2, 10.0),
    float(MAX_TRAVEL, 200.0),
    float(MAX_TRAVEL + 1, 200.0),
    float(MAX_TRAVEL + 2, 200.0),
];

fn def(index: u16) -> Option<&'static SettingDef> {
    TABLE.iter().find(|d| d.index == index)
}

/// Sparse map from setting index to value.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    values: BTreeMap<u16, f64>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            values: TABLE.iter().map(|d| (d.index, d.default)).collect(),
        }
    }

    pub fn is_known(index: u16) -> bool {
        def(index).is_some()
    }

    pub fn get(&self, index: u16) -> f64 {
        self.values.get(&index).copied().unwrap_or(0.0)
    }

    /// Stores a value; integer settings are truncated.
    pub fn set(&mut self, index: u16, value: f64) -> Result<(), GrblError> {
        let def = def(index).ok_or(GrblError::InvalidStatement)?;
        if !value.is_finite() || value < 0.0 {
            return Err(GrblError::InvalidStatement);
        }
        let value = match def.kind {
            Kind::Integer => value.trunc(),
            Kind::Float => value,
        };
        self.values.insert(index, value);
        tracing::debug!("${}={}", index, value);
        Ok(())
    }

    pub fn restore_defaults(&mut self) {
        *self = Self::new();
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// `$n=value` lines for every setting, as printed by `$$`.
    pub fn report(&self) -> String {
        self.iter()
            .map(|(index, value)| format!("${}={}\r\n", index, Self::format_value(index, value)))
            .collect()
    }

    pub fn format_value(index: u16, value: f64) -> String {
        match def(index).map(|d| d.kind) {
            Some(Kind::Integer) => format!("{}", value as i64),
            _ => format!("{:.3}", value),
        }
    }

    pub fn report_machine_position(&self) -> bool {
        (self.get(STATUS_REPORT_MASK) as u32) & 1 == 1
    }

    pub fn soft_limits_enabled(&self) -> bool {
        self.get(SOFT_LIMITS) != 0.0
    }

    pub fn homing_enabled(&self) -> bool {
        self.get(HOMING_ENABLE) != 0.0
    }

    pub fn homing_seek_rate(&self) -> f64 {
        self.get(HOMING_SEEK)
    }

    pub fn laser_mode(&self) -> bool {
        self.get(LASER_MODE) != 0.0
    }

    pub fn max_spindle_speed(&self) -> f64 {
        self.get(MAX_SPINDLE_SPEED)
    }

    pub fn max_rate(&self, axis: Axis) -> f64 {
        self.get(MAX_RATE + axis.index() as u16)
    }

    pub fn max_travel(&self, axis: Axis) -> f64 {
        self.get(MAX_TRAVEL + axis.index() as u16)
    }

    /// Rapid rate: the fastest configured axis.
    pub fn rapid_rate(&self) -> f64 {
        Axis::ALL.iter().map(|a| self.max_rate(*a)).fold(0.0, f64::max)
    }

    pub fn largest_travel(&self) -> f64 {
        Axis::ALL.iter().map(|a| self.max_travel(*a)).fold(0.0, f64::max)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
