//! Machine configuration
//!
//! Geometry is read once at startup from a `label:value` text source and
//! never changes afterwards.

pub mod loader;
pub mod machine;

pub use loader::{parse_setup, read_setup, ConfigError, SETUP_FIELDS};
pub use machine::{MachineConfig, MachineSetup};
