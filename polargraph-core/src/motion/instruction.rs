//! Per-motor step instructions

pub use polargraph_protocol::Direction;

/// One motor's share of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instruction {
    /// Which way the spool turns
    pub direction: Direction,
    /// Number of steps, always non-negative
    pub steps: u32,
}

impl Instruction {
    /// Split a signed step count into direction and magnitude
    ///
    /// Magnitudes beyond `u32::MAX` saturate. The kinematics engine rejects
    /// moves that large before they become instructions.
    pub fn from_signed(steps: i64) -> Self {
        Self {
            direction: Direction::from_signed(steps),
            steps: u32::try_from(steps.unsigned_abs()).unwrap_or(u32::MAX),
        }
    }

    /// Signed step count
    pub fn signed_steps(&self) -> i64 {
        match self.direction {
            Direction::Forward => self.steps as i64,
            Direction::Reverse => -(self.steps as i64),
        }
    }
}

/// Left and right instructions for one tick, always sent together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstructionPair {
    pub left: Instruction,
    pub right: Instruction,
}
