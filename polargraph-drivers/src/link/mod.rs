//! Motor controller link

pub mod command;
pub mod sim;

pub use command::{
    CommandLink, HandshakePolicy, LinkConfig, LinkError, LinkState, LinkStats,
    DEFAULT_BYTE_DELAY_US, DEFAULT_MAX_HANDSHAKES,
};
pub use sim::SimulatedSlave;
