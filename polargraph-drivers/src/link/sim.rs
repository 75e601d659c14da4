//! Simulated motor controller
//!
//! Answers the master byte for byte the way the controller firmware does:
//! ACK on a complete handshake, filler while the payload arrives, then the
//! two result bytes. Useful for dry runs and for exercising the link without
//! hardware.

use core::convert::Infallible;

use polargraph_hal::ByteChannel;
use polargraph_protocol::{
    encode_param, CommandFrame, Direction, FrameParser, ACK_BYTE, CMD_ADD, CMD_SUBTRACT,
};

/// Result returned for frames the slave could not make sense of
pub const REJECTED_RESULT: i16 = -1;

/// In-process stand-in for the motor controller
#[derive(Debug, Clone, Default)]
pub struct SimulatedSlave {
    parser: FrameParser,
    busy_handshakes: u32,
    pending: Option<[u8; 2]>,
    pending_index: usize,
    last_frame: Option<CommandFrame>,
    frames_received: u32,
    left_position: i64,
    right_position: i64,
}

impl SimulatedSlave {
    /// Create a slave that acknowledges every handshake
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` handshakes before acknowledging
    pub fn with_busy_handshakes(mut self, count: u32) -> Self {
        self.busy_handshakes = count;
        self
    }

    /// The most recently received frame
    pub fn last_frame(&self) -> Option<CommandFrame> {
        self.last_frame
    }

    /// Number of complete frames received
    pub fn frames_received(&self) -> u32 {
        self.frames_received
    }

    /// Net signed steps applied to each motor so far
    pub fn motor_positions(&self) -> (i64, i64) {
        (self.left_position, self.right_position)
    }

    fn respond(&mut self, frame: &CommandFrame) -> i16 {
        match *frame {
            CommandFrame::Motor {
                left_dir,
                left_steps,
                right_dir,
                right_steps,
            } => {
                self.left_position += signed(left_dir, left_steps);
                self.right_position += signed(right_dir, right_steps);
                0
            }
            CommandFrame::Generic {
                command: CMD_ADD,
                param1,
                param2,
            } => param1.wrapping_add(param2),
            CommandFrame::Generic {
                command: CMD_SUBTRACT,
                param1,
                param2,
            } => param1.wrapping_sub(param2),
            CommandFrame::Generic { .. } => REJECTED_RESULT,
        }
    }

    fn queue_result(&mut self, result: i16) {
        self.pending = Some(encode_param(result));
        self.pending_index = 0;
    }
}

fn signed(dir: Direction, steps: u16) -> i64 {
    match dir {
        Direction::Forward => steps as i64,
        Direction::Reverse => -(steps as i64),
    }
}

impl ByteChannel for SimulatedSlave {
    type Error = Infallible;

    fn exchange(&mut self, byte: u8) -> Result<u8, Infallible> {
        if let Some(result) = self.pending {
            let reply = result[self.pending_index];
            self.pending_index += 1;
            if self.pending_index == result.len() {
                self.pending = None;
            }
            return Ok(reply);
        }

        let was_handshaking = !self.parser.awaiting_payload();
        match self.parser.feed(byte) {
            Ok(Some(frame)) => {
                let result = self.respond(&frame);
                self.last_frame = Some(frame);
                self.frames_received += 1;
                self.queue_result(result);
                Ok(0)
            }
            Ok(None) if was_handshaking && self.parser.awaiting_payload() => {
                if self.busy_handshakes > 0 {
                    self.busy_handshakes -= 1;
                    self.parser.reset();
                    Ok(0)
                } else {
                    Ok(ACK_BYTE)
                }
            }
            Ok(None) => Ok(0),
            Err(_) => {
                self.queue_result(REJECTED_RESULT);
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polargraph_protocol::START_BYTE;

    fn exchange_all(slave: &mut SimulatedSlave, bytes: &[u8]) -> heapless::Vec<u8, 16> {
        let mut replies = heapless::Vec::new();
        for &b in bytes {
            replies.push(slave.exchange(b).unwrap()).unwrap();
        }
        replies
    }

    #[test]
    fn test_acks_handshake_then_returns_result() {
        let mut slave = SimulatedSlave::new();
        let replies = exchange_all(
            &mut slave,
            &[START_BYTE, CMD_SUBTRACT, 10, 0, 3, 0, 0x00, 0x00],
        );

        assert_eq!(replies[1], ACK_BYTE);
        assert_eq!(&replies[6..], &[7, 0]);
        assert_eq!(slave.frames_received(), 1);
    }

    #[test]
    fn test_busy_handshake_not_acked() {
        let mut slave = SimulatedSlave::new().with_busy_handshakes(1);
        let replies = exchange_all(&mut slave, &[START_BYTE, CMD_ADD, START_BYTE, CMD_ADD]);
        assert_eq!(replies.as_slice(), &[0, 0, 0, ACK_BYTE]);
    }

    #[test]
    fn test_motor_frame_tracks_positions() {
        let mut slave = SimulatedSlave::new();
        exchange_all(&mut slave, &[START_BYTE, b'f', 10, 0, b'r', 4, 0, 0, 0]);
        exchange_all(&mut slave, &[START_BYTE, b'r', 3, 0, b'r', 1, 0, 0, 0]);

        assert_eq!(slave.motor_positions(), (7, -5));
        assert_eq!(
            slave.last_frame(),
            Some(CommandFrame::Motor {
                left_dir: Direction::Reverse,
                left_steps: 3,
                right_dir: Direction::Reverse,
                right_steps: 1,
            })
        );
    }

    #[test]
    fn test_unknown_command_rejected() {
        let mut slave = SimulatedSlave::new();
        let replies = exchange_all(&mut slave, &[START_BYTE, b'?', 1, 0, 1, 0, 0, 0]);
        assert_eq!(&replies[6..], &encode_param(REJECTED_RESULT));
    }
}
