//! Direction bytes and command codes
//!
//! The byte sent in the second handshake exchange tells the slave what kind
//! of frame follows: a direction byte starts a motor frame, anything else is
//! a generic command code.

use crate::frame::START_BYTE;

/// Direction byte: lengthen the cable
pub const DIR_FORWARD: u8 = b'f';

/// Direction byte: shorten the cable
pub const DIR_REVERSE: u8 = b'r';

/// Generic command: slave returns `param1 + param2`
pub const CMD_ADD: u8 = b'+';

/// Generic command: slave returns `param1 - param2`
pub const CMD_SUBTRACT: u8 = b'-';

/// Motor rotation direction as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Pay out cable (non-negative step count)
    #[default]
    Forward,
    /// Reel in cable (negative step count)
    Reverse,
}

impl Direction {
    /// Direction for a signed step count
    ///
    /// Zero counts as forward.
    pub fn from_signed(steps: i64) -> Self {
        if steps < 0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    /// Wire byte for this direction
    pub fn as_byte(self) -> u8 {
        match self {
            Direction::Forward => DIR_FORWARD,
            Direction::Reverse => DIR_REVERSE,
        }
    }

    /// Parse a wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            DIR_FORWARD => Some(Direction::Forward),
            DIR_REVERSE => Some(Direction::Reverse),
            _ => None,
        }
    }
}

/// Check whether a generic command code would be misread by the slave
///
/// The start byte restarts a handshake and direction bytes announce a
/// motor frame, so neither can be used as a command code.
pub fn is_reserved_command(code: u8) -> bool {
    code == START_BYTE || Direction::from_byte(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_signed() {
        assert_eq!(Direction::from_signed(-1), Direction::Reverse);
        assert_eq!(Direction::from_signed(0), Direction::Forward);
        assert_eq!(Direction::from_signed(4242), Direction::Forward);
    }

    #[test]
    fn test_direction_bytes() {
        assert_eq!(Direction::Forward.as_byte(), b'f');
        assert_eq!(Direction::Reverse.as_byte(), b'r');
        assert_eq!(Direction::from_byte(b'f'), Some(Direction::Forward));
        assert_eq!(Direction::from_byte(b'r'), Some(Direction::Reverse));
        assert_eq!(Direction::from_byte(b'x'), None);
    }

    #[test]
    fn test_reserved_commands() {
        assert!(is_reserved_command(b'c'));
        assert!(is_reserved_command(b'f'));
        assert!(is_reserved_command(b'r'));
        assert!(!is_reserved_command(CMD_ADD));
        assert!(!is_reserved_command(CMD_SUBTRACT));
        // The ack byte is only ever sent by the slave
        assert!(!is_reserved_command(b'a'));
    }
}
