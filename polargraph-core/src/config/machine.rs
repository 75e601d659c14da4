//! Machine geometry
//!
//! Two anchors sit `width` apart on the x axis. Each cable winds on a spool
//! of `spool_radius`, turned by a stepper with `steps_per_revolution` steps.

use core::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::loader::ConfigError;
use crate::motion::{GeometryError, Point};

/// Largest step count an `f64` length converts to exactly (2^53)
const MAX_EXACT_STEPS: f64 = 9_007_199_254_740_992.0;

/// Immutable machine geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineConfig {
    width: f64,
    spool_radius: f64,
    steps_per_revolution: f64,
}

impl MachineConfig {
    /// Create a validated configuration
    ///
    /// All three values must be finite and strictly positive.
    pub fn new(
        width: f64,
        spool_radius: f64,
        steps_per_revolution: f64,
    ) -> Result<Self, ConfigError> {
        positive("width", width)?;
        positive("spool radius", spool_radius)?;
        positive("steps per revolution", steps_per_revolution)?;
        Ok(Self {
            width,
            spool_radius,
            steps_per_revolution,
        })
    }

    /// Anchor separation
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Spool radius
    pub fn spool_radius(&self) -> f64 {
        self.spool_radius
    }

    /// Motor steps per spool revolution
    pub fn steps_per_revolution(&self) -> f64 {
        self.steps_per_revolution
    }

    /// Left anchor, always the origin
    pub fn left_anchor(&self) -> Point {
        Point::ORIGIN
    }

    /// Right anchor, always `(width, 0)`
    pub fn right_anchor(&self) -> Point {
        Point::new(self.width, 0.0)
    }

    /// Cable length paid out by a number of steps
    pub fn steps_to_length(&self, steps: i64) -> f64 {
        2.0 * PI * self.spool_radius * (steps as f64 / self.steps_per_revolution)
    }

    /// Nearest step count for a cable length
    ///
    /// Halves round away from zero.
    pub fn length_to_steps(&self, length: f64) -> i64 {
        (length / self.steps_to_length(1)).round() as i64
    }

    /// Nearest step count for a cable length, if it has an exact one
    ///
    /// Lengths that are not finite, or too long to count in whole steps
    /// without losing precision, are an error instead of a saturated count.
    pub fn checked_length_to_steps(&self, length: f64) -> Result<i64, GeometryError> {
        let steps = (length / self.steps_to_length(1)).round();
        if steps.is_nan() || steps.abs() > MAX_EXACT_STEPS {
            return Err(GeometryError::StepOverflow { steps });
        }
        Ok(steps as i64)
    }

    /// Angle of the left cable below the anchor line, from both cable lengths
    ///
    /// Law of cosines on the anchor/anchor/effector triangle. Lengths that
    /// cannot form that triangle are an error; the cosine is never clamped.
    pub fn left_cable_angle(&self, left_len: f64, right_len: f64) -> Result<f64, GeometryError> {
        let w = self.width;
        let cosine = (w * w + left_len * left_len - right_len * right_len) / (2.0 * w * left_len);
        if !(-1.0..=1.0).contains(&cosine) {
            // Also catches NaN from a zero-length left cable
            return Err(GeometryError::Unreachable { cosine });
        }
        Ok(cosine.acos())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}

/// The five startup values: geometry plus the effector's initial position
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachineSetup {
    /// Anchor separation
    pub width: f64,
    /// Spool radius
    pub spool_radius: f64,
    /// Motor steps per spool revolution
    pub steps_per_revolution: f64,
    /// Initial effector x
    pub initial_x: f64,
    /// Initial effector y
    pub initial_y: f64,
}

impl MachineSetup {
    /// Validated machine geometry
    pub fn machine_config(&self) -> Result<MachineConfig, ConfigError> {
        MachineConfig::new(self.width, self.spool_radius, self.steps_per_revolution)
    }

    /// Initial effector position
    pub fn initial_position(&self) -> Result<Point, ConfigError> {
        let position = Point::new(self.initial_x, self.initial_y);
        if !position.is_finite() {
            return Err(ConfigError::InvalidPosition {
                x: self.initial_x,
                y: self.initial_y,
            });
        }
        Ok(position)
    }
}
