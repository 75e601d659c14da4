//! Command frame encoding and slave-side parsing.
//!
//! Frame layout (one byte exchanged per slot):
//! - HANDSHAKE: START (`'c'`) then the command or first direction byte,
//!   repeated until the slave answers the second byte with ACK (`'a'`)
//! - PAYLOAD: P1 low, P1 high, [second direction byte], P2 low, P2 high
//! - RESULT: two FILLER bytes, whose replies form the i16 result (LE)

use heapless::Vec;

use crate::messages::{is_reserved_command, Direction};

/// Handshake start byte
pub const START_BYTE: u8 = b'c';

/// Slave acknowledge byte
pub const ACK_BYTE: u8 = b'a';

/// Byte clocked out while reading back the result
pub const FILLER_BYTE: u8 = 0x00;

/// Payload size of a motor frame (two parameters plus second direction)
pub const MOTOR_PAYLOAD_SIZE: usize = 5;

/// Payload size of a generic frame (two parameters)
pub const GENERIC_PAYLOAD_SIZE: usize = 4;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = MOTOR_PAYLOAD_SIZE;

/// Largest step count a motor frame can carry
pub const MAX_STEPS: u32 = i16::MAX as u32;

/// Errors that can occur during frame construction or parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Parameter does not fit in a signed 16-bit field
    ParameterOutOfRange,
    /// Command code collides with the start or a direction byte
    ReservedCommand,
    /// Invalid frame structure
    InvalidFrame,
}

/// Encode a parameter as little-endian bytes
pub fn encode_param(value: i16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Decode a little-endian parameter or result
pub fn decode_param(bytes: [u8; 2]) -> i16 {
    i16::from_le_bytes(bytes)
}

/// One command, ready to be clocked out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandFrame {
    /// Step both motors; the left direction rides in the handshake
    Motor {
        left_dir: Direction,
        left_steps: u16,
        right_dir: Direction,
        right_steps: u16,
    },
    /// Any other command with two parameters
    Generic { command: u8, param1: i16, param2: i16 },
}

impl CommandFrame {
    /// Build a motor frame
    ///
    /// Step counts above [`MAX_STEPS`] are rejected instead of truncated.
    pub fn motor(
        left_dir: Direction,
        left_steps: u32,
        right_dir: Direction,
        right_steps: u32,
    ) -> Result<Self, FrameError> {
        Ok(CommandFrame::Motor {
            left_dir,
            left_steps: steps_param(left_steps)?,
            right_dir,
            right_steps: steps_param(right_steps)?,
        })
    }

    /// Build a generic command frame
    pub fn generic(command: u8, param1: i16, param2: i16) -> Result<Self, FrameError> {
        if is_reserved_command(command) {
            return Err(FrameError::ReservedCommand);
        }
        Ok(CommandFrame::Generic {
            command,
            param1,
            param2,
        })
    }

    /// Byte sent in the second handshake exchange
    pub fn handshake_byte(&self) -> u8 {
        match self {
            CommandFrame::Motor { left_dir, .. } => left_dir.as_byte(),
            CommandFrame::Generic { command, .. } => *command,
        }
    }

    /// Check whether this is a motor frame
    pub fn is_motor(&self) -> bool {
        matches!(self, CommandFrame::Motor { .. })
    }

    /// Payload bytes, in transmission order
    pub fn payload(&self) -> Vec<u8, MAX_PAYLOAD_SIZE> {
        let mut payload = Vec::new();
        // Both shapes are at most MAX_PAYLOAD_SIZE bytes
        match *self {
            CommandFrame::Motor {
                left_steps,
                right_dir,
                right_steps,
                ..
            } => {
                let _ = payload.extend_from_slice(&encode_param(left_steps as i16));
                let _ = payload.push(right_dir.as_byte());
                let _ = payload.extend_from_slice(&encode_param(right_steps as i16));
            }
            CommandFrame::Generic { param1, param2, .. } => {
                let _ = payload.extend_from_slice(&encode_param(param1));
                let _ = payload.extend_from_slice(&encode_param(param2));
            }
        }
        payload
    }
}

fn steps_param(steps: u32) -> Result<u16, FrameError> {
    if steps > MAX_STEPS {
        return Err(FrameError::ParameterOutOfRange);
    }
    Ok(steps as u16)
}

/// Slave-side state machine that rebuilds frames from the master's bytes
///
/// Only the handshake and payload are parsed; the result phase is driven
/// by whoever answers the filler bytes.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    handshake: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for START byte
    WaitingForStart,
    /// Got START, waiting for the command or direction byte
    WaitingForCommand,
    /// Reading payload bytes
    ReadingPayload { expected: usize },
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
            handshake: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
        self.handshake = 0;
    }

    /// Check whether a handshake has completed and payload bytes are expected
    pub fn awaiting_payload(&self) -> bool {
        matches!(self.state, ParseState::ReadingPayload { .. })
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when the last payload byte arrives,
    /// `Ok(None)` when more bytes are needed, or `Err` on a malformed payload.
    pub fn feed(&mut self, byte: u8) -> Result<Option<CommandFrame>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == START_BYTE {
                    self.state = ParseState::WaitingForCommand;
                }
                // Silently ignore anything else while idle
                Ok(None)
            }
            ParseState::WaitingForCommand => {
                // A repeated START is the master retrying; keep waiting
                if byte != START_BYTE {
                    self.handshake = byte;
                    self.buffer.clear();
                    let expected = if Direction::from_byte(byte).is_some() {
                        MOTOR_PAYLOAD_SIZE
                    } else {
                        GENERIC_PAYLOAD_SIZE
                    };
                    self.state = ParseState::ReadingPayload { expected };
                }
                Ok(None)
            }
            ParseState::ReadingPayload { expected } => {
                // Cannot overflow: expected <= MAX_PAYLOAD_SIZE
                let _ = self.buffer.push(byte);
                if self.buffer.len() < expected {
                    return Ok(None);
                }
                let frame = self.decode();
                self.reset();
                frame.map(Some)
            }
        }
    }

    fn decode(&self) -> Result<CommandFrame, FrameError> {
        let b = &self.buffer;
        match Direction::from_byte(self.handshake) {
            Some(left_dir) => {
                let right_dir = Direction::from_byte(b[2]).ok_or(FrameError::InvalidFrame)?;
                let left_steps = decode_param([b[0], b[1]]);
                let right_steps = decode_param([b[3], b[4]]);
                if left_steps < 0 || right_steps < 0 {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(CommandFrame::Motor {
                    left_dir,
                    left_steps: left_steps as u16,
                    right_dir,
                    right_steps: right_steps as u16,
                })
            }
            None => Ok(CommandFrame::Generic {
                command: self.handshake,
                param1: decode_param([b[0], b[1]]),
                param2: decode_param([b[2], b[3]]),
            }),
        }
    }
}
