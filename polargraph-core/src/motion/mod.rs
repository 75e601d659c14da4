//! Inverse kinematics
//!
//! Converts target points into paired step instructions and tracks where the
//! effector actually ends up after step quantization.

pub mod geometry;
pub mod instruction;
pub mod kinematics;

pub use geometry::Point;
pub use instruction::{Direction, Instruction, InstructionPair};
pub use kinematics::{GeometryError, KinematicsEngine, PlannedMove, StepMode};
