//! Board-agnostic core logic for the polargraph controller
//!
//! This crate contains everything between the text inputs and the wire:
//!
//! - Machine configuration and its `label:value` source format
//! - Target point stream parsing
//! - Inverse kinematics from a 2-D target to a pair of step instructions
//!
//! Unlike the protocol and link crates this one needs `std`: the kinematics
//! are `f64` trigonometry.

#![deny(unsafe_code)]

pub mod config;
pub mod motion;
pub mod source;

pub use config::{ConfigError, MachineConfig, MachineSetup};
pub use motion::{
    Direction, GeometryError, Instruction, InstructionPair, KinematicsEngine, PlannedMove, Point,
    StepMode,
};
pub use source::{PointError, PointReader, PointSource};
