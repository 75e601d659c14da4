//! Polargraph Hardware Abstraction Layer
//!
//! This crate defines the byte-level link abstraction the command transport
//! talks through, plus the UART traits a platform implements to provide one.
//! SPI masters come from any `embedded_hal::spi::SpiBus` implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Command transport (polargraph-drivers) │
//! └─────────────────────────────────────────┘
//!                     │ ByteChannel
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  polargraph-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  SpiChannel   │       │  UartChannel  │
//! │ (SPI master)  │       │ (serial port) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`channel::ByteChannel`] - One-byte synchronous exchange
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod channel;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use channel::{ByteChannel, SpiChannel, UartChannel, UartChannelError};
pub use uart::{UartConfig, UartRx, UartTx};
