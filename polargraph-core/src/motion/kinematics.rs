//! Inverse kinematics for a two-cable suspended effector
//!
//! For each target the engine computes both cable lengths, rounds them to
//! whole motor steps, and then moves its tracked position to the point those
//! rounded steps actually reach. Tracking the achieved point rather than the
//! requested one keeps the tracked position honest about what the motors
//! did; over many moves it drifts from the nominal path by at most the
//! step quantization.

use polargraph_protocol::MAX_STEPS;
use thiserror::Error;

use super::geometry::Point;
use super::instruction::{Instruction, InstructionPair};
use crate::config::{ConfigError, MachineConfig, MachineSetup};

/// Geometry errors during a conversion
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// The cable lengths cannot meet at a point
    #[error("target unreachable: left cable angle cosine {cosine} is outside [-1, 1]")]
    Unreachable { cosine: f64 },

    /// A cable needs more steps than one motor frame can carry
    #[error("move of {steps} steps exceeds the frame limit of {max}", max = MAX_STEPS)]
    StepOverflow { steps: f64 },
}

/// A move computed for a target but not yet applied to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedMove {
    /// Instructions to send to the motors
    pub instructions: InstructionPair,
    /// Step counts of the achieved left and right cable lengths
    pub steps: (i64, i64),
    /// Point the rounded step counts reach
    pub position: Point,
}

/// What the step counts in an instruction mean to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepMode {
    /// Total steps for the full cable length, counted from zero
    #[default]
    Absolute,
    /// Steps relative to the previously commanded cable length
    Relative,
}

/// Machine geometry plus the effector's tracked position
#[derive(Debug, Clone)]
pub struct KinematicsEngine {
    config: MachineConfig,
    position: Point,
    mode: StepMode,
    /// Step counts for the current left and right cable lengths
    commanded: (i64, i64),
}

impl KinematicsEngine {
    /// Configure an engine from raw geometry and the initial position
    pub fn configure(
        width: f64,
        spool_radius: f64,
        steps_per_revolution: f64,
        initial_position: Point,
    ) -> Result<Self, ConfigError> {
        let config = MachineConfig::new(width, spool_radius, steps_per_revolution)?;
        if !initial_position.is_finite() {
            return Err(ConfigError::InvalidPosition {
                x: initial_position.x,
                y: initial_position.y,
            });
        }
        Ok(Self::new(config, initial_position))
    }

    /// Configure an engine from the values read at startup
    pub fn from_setup(setup: &MachineSetup) -> Result<Self, ConfigError> {
        Ok(Self::new(setup.machine_config()?, setup.initial_position()?))
    }

    /// Create an engine from validated geometry
    pub fn new(config: MachineConfig, initial_position: Point) -> Self {
        let commanded = (
            config.length_to_steps(initial_position.distance_to(config.left_anchor())),
            config.length_to_steps(initial_position.distance_to(config.right_anchor())),
        );
        Self {
            config,
            position: initial_position,
            mode: StepMode::Absolute,
            commanded,
        }
    }

    /// Select how step counts are expressed
    pub fn with_step_mode(mut self, mode: StepMode) -> Self {
        self.mode = mode;
        self
    }

    /// Machine geometry
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Where the effector actually is
    pub fn position(&self) -> Point {
        self.position
    }

    /// Current step mode
    pub fn step_mode(&self) -> StepMode {
        self.mode
    }

    /// Step counts of the current left and right cable lengths
    pub fn commanded_steps(&self) -> (i64, i64) {
        self.commanded
    }

    /// Current left and right cable lengths
    pub fn cable_lengths(&self) -> (f64, f64) {
        (
            self.position.distance_to(self.config.left_anchor()),
            self.position.distance_to(self.config.right_anchor()),
        )
    }

    /// Cable length paid out by a number of steps
    pub fn steps_to_length(&self, steps: i64) -> f64 {
        self.config.steps_to_length(steps)
    }

    /// Nearest step count for a cable length
    pub fn length_to_steps(&self, length: f64) -> i64 {
        self.config.length_to_steps(length)
    }

    /// Left cable angle below the anchor line
    pub fn left_cable_angle(&self, left_len: f64, right_len: f64) -> Result<f64, GeometryError> {
        self.config.left_cable_angle(left_len, right_len)
    }

    /// Convert a target into a pair of instructions
    ///
    /// On success the tracked position moves to the point the rounded step
    /// counts reach. On error nothing changes.
    pub fn compute_instruction(&mut self, target: Point) -> Result<InstructionPair, GeometryError> {
        let planned = self.plan_instruction(target)?;
        self.commit(&planned);
        Ok(planned.instructions)
    }

    /// Compute the move to a target without applying it
    ///
    /// Every magnitude in the returned instructions fits in a motor frame.
    pub fn plan_instruction(&self, target: Point) -> Result<PlannedMove, GeometryError> {
        let target_left = target.distance_to(self.config.left_anchor());
        let target_right = target.distance_to(self.config.right_anchor());

        let left_steps = self.config.checked_length_to_steps(target_left)?;
        let right_steps = self.config.checked_length_to_steps(target_right)?;

        // Re-quantize: the lengths the motors can really produce
        let achieved_left = self.config.steps_to_length(left_steps);
        let achieved_right = self.config.steps_to_length(right_steps);
        let angle = self.config.left_cable_angle(achieved_left, achieved_right)?;

        let (left, right) = match self.mode {
            StepMode::Absolute => (left_steps, right_steps),
            StepMode::Relative => (left_steps - self.commanded.0, right_steps - self.commanded.1),
        };
        for delta in [left, right] {
            if delta.unsigned_abs() > MAX_STEPS as u64 {
                return Err(GeometryError::StepOverflow {
                    steps: delta as f64,
                });
            }
        }

        Ok(PlannedMove {
            instructions: InstructionPair {
                left: Instruction::from_signed(left),
                right: Instruction::from_signed(right),
            },
            steps: (left_steps, right_steps),
            position: Point::new(achieved_left * angle.cos(), achieved_left * angle.sin()),
        })
    }

    /// Apply a planned move once the motors have carried it out
    pub fn commit(&mut self, planned: &PlannedMove) {
        self.commanded = planned.steps;
        self.position = planned.position;
    }
}
