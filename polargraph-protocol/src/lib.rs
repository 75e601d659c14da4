//! Polargraph motor controller protocol
//!
//! This crate defines the byte protocol between the host (link master) and
//! the motor controller (link slave). Every byte the master sends is answered
//! by one byte from the slave, so a command is a fixed sequence of exchanges
//! rather than a length-prefixed packet.
//!
//! # Protocol Overview
//!
//! ```text
//!  handshake (repeated until ACK)   payload                          result
//! ┌───────┬───────────┐            ┌──────┬──────┬──────┬──────┬──────┬──────┬──────┐
//! │ 'c'   │ CMD / DIR │ ──ACK('a')→│ P1 L │ P1 H │ DIR2*│ P2 L │ P2 H │ 0x00 │ 0x00 │
//! └───────┴───────────┘            └──────┴──────┴──────┴──────┴──────┴──────┴──────┘
//!                                   * motor frames only        replies → i16 LE
//! ```
//!
//! Parameters and the result are signed 16-bit little-endian values.
//! There is no checksum; a frame is only protected by the handshake.

#![no_std]
#![deny(unsafe_code)]

// Property tests need the standard library
#[cfg(test)]
extern crate std;

pub mod frame;
pub mod messages;

pub use frame::{
    decode_param, encode_param, CommandFrame, FrameError, FrameParser, ACK_BYTE, FILLER_BYTE,
    MAX_PAYLOAD_SIZE, MAX_STEPS, START_BYTE,
};
pub use messages::{Direction, CMD_ADD, CMD_SUBTRACT};
