//! Link driver implementations
//!
//! This crate drives the motor controller over any
//! [`polargraph_hal::ByteChannel`]:
//!
//! - [`link::CommandLink`] - handshake, payload and result read-back
//! - [`link::SimulatedSlave`] - in-process stand-in for the controller

#![no_std]
#![deny(unsafe_code)]

// Property tests need the standard library
#[cfg(test)]
extern crate std;

pub mod link;

pub use link::{
    CommandLink, HandshakePolicy, LinkConfig, LinkError, LinkState, LinkStats, SimulatedSlave,
};
