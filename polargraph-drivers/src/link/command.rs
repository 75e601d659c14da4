//! Command transport over a byte channel
//!
//! A frame moves through four states:
//!
//! ```text
//! Idle ──► Handshake ──► SendPayload ──► ReceiveResult ──► Idle
//!             │  ▲
//!             └──┘ no ACK: repeat 'c' + command byte
//! ```
//!
//! Every exchange is followed by a short delay so the slave can reload its
//! output register. One call sends exactly one frame; frames are never
//! pipelined.

use embedded_hal::delay::DelayNs;
use polargraph_hal::ByteChannel;
use polargraph_protocol::{
    decode_param, CommandFrame, Direction, FrameError, ACK_BYTE, FILLER_BYTE, START_BYTE,
};

/// Default pause after each byte exchange, in microseconds
pub const DEFAULT_BYTE_DELAY_US: u32 = 10;

/// Default number of handshake attempts before giving up
pub const DEFAULT_MAX_HANDSHAKES: u32 = 10_000;

/// How long to keep retrying the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandshakePolicy {
    /// Give up with [`LinkError::Stall`] after this many attempts
    Bounded(u32),
    /// Retry forever; a silent slave blocks the caller indefinitely
    Unbounded,
}

impl HandshakePolicy {
    /// Policy from an attempt count, where zero means unbounded
    pub fn from_attempts(attempts: u32) -> Self {
        if attempts == 0 {
            HandshakePolicy::Unbounded
        } else {
            HandshakePolicy::Bounded(attempts)
        }
    }

    fn allows(self, attempt: u32) -> bool {
        match self {
            HandshakePolicy::Bounded(max) => attempt <= max,
            HandshakePolicy::Unbounded => true,
        }
    }
}

/// Link timing and retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Pause after each byte exchange, in microseconds
    pub byte_delay_us: u32,
    /// Handshake retry policy
    pub handshake: HandshakePolicy,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            byte_delay_us: DEFAULT_BYTE_DELAY_US,
            handshake: HandshakePolicy::Bounded(DEFAULT_MAX_HANDSHAKES),
        }
    }
}

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No frame in flight
    #[default]
    Idle,
    /// Sending start and command bytes until the slave acknowledges
    Handshake,
    /// Clocking out parameter bytes
    SendPayload,
    /// Clocking in the two result bytes
    ReceiveResult,
}

/// Errors that can occur while sending a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// The slave never acknowledged the handshake
    Stall { attempts: u32 },
    /// The command could not be framed; nothing was sent
    Frame(FrameError),
    /// The underlying channel failed
    Channel(E),
}

impl<E> From<FrameError> for LinkError<E> {
    fn from(e: FrameError) -> Self {
        LinkError::Frame(e)
    }
}

/// Link counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames that completed with a result
    pub frames: u32,
    /// Handshake attempts used by the most recent frame
    pub last_handshake_attempts: u32,
    /// Handshake attempts across all frames
    pub total_handshake_attempts: u64,
    /// Frames abandoned because the handshake stalled
    pub stalls: u32,
}

/// Master side of the motor controller link
pub struct CommandLink<C, D> {
    channel: C,
    delay: D,
    config: LinkConfig,
    state: LinkState,
    stats: LinkStats,
}

impl<C: ByteChannel, D: DelayNs> CommandLink<C, D> {
    /// Create a link over a channel
    pub fn new(channel: C, delay: D, config: LinkConfig) -> Self {
        Self {
            channel,
            delay,
            config,
            state: LinkState::Idle,
            stats: LinkStats::default(),
        }
    }

    /// Get the current transport state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Get the link counters
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Get the link configuration
    pub fn config(&self) -> LinkConfig {
        self.config
    }

    /// Borrow the underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Borrow the delay provider (the control loop paces ticks with it)
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Release the channel and delay provider
    pub fn into_parts(self) -> (C, D) {
        (self.channel, self.delay)
    }

    /// Step both motors
    ///
    /// The left direction is injected in the handshake, the right direction
    /// between the two step counts.
    pub fn send_motor_command(
        &mut self,
        left_dir: Direction,
        left_steps: u32,
        right_dir: Direction,
        right_steps: u32,
    ) -> Result<i16, LinkError<C::Error>> {
        let frame = CommandFrame::motor(left_dir, left_steps, right_dir, right_steps)?;
        self.send_frame(&frame)
    }

    /// Send a generic command with two parameters
    pub fn send_generic_command(
        &mut self,
        command: u8,
        param1: i16,
        param2: i16,
    ) -> Result<i16, LinkError<C::Error>> {
        let frame = CommandFrame::generic(command, param1, param2)?;
        self.send_frame(&frame)
    }

    /// Send one frame and return the slave's result
    pub fn send_frame(&mut self, frame: &CommandFrame) -> Result<i16, LinkError<C::Error>> {
        let result = self.run_frame(frame);
        self.state = LinkState::Idle;
        if result.is_ok() {
            self.stats.frames = self.stats.frames.wrapping_add(1);
        }
        result
    }

    fn run_frame(&mut self, frame: &CommandFrame) -> Result<i16, LinkError<C::Error>> {
        self.state = LinkState::Handshake;
        self.handshake(frame.handshake_byte())?;

        self.state = LinkState::SendPayload;
        for &byte in frame.payload().iter() {
            self.exchange(byte)?;
        }

        self.state = LinkState::ReceiveResult;
        let lo = self.exchange(FILLER_BYTE)?;
        // No turnaround needed after the final byte
        let hi = self.channel.exchange(FILLER_BYTE).map_err(LinkError::Channel)?;
        Ok(decode_param([lo, hi]))
    }

    /// Repeat start + command until the reply to the command byte is ACK
    ///
    /// A timed-out exchange counts as a missing ACK. Returns the number of
    /// attempts used.
    fn handshake(&mut self, command: u8) -> Result<u32, LinkError<C::Error>> {
        let mut attempt = 1u32;
        loop {
            let acked = match self.handshake_exchange(START_BYTE)? {
                Some(_) => self.handshake_exchange(command)? == Some(ACK_BYTE),
                None => false,
            };
            self.stats.total_handshake_attempts += 1;
            self.stats.last_handshake_attempts = attempt;

            if acked {
                return Ok(attempt);
            }

            attempt = attempt.saturating_add(1);
            if !self.config.handshake.allows(attempt) {
                self.stats.stalls = self.stats.stalls.wrapping_add(1);
                return Err(LinkError::Stall {
                    attempts: attempt - 1,
                });
            }
        }
    }

    /// Exchange during the handshake; `None` if the channel timed out
    fn handshake_exchange(&mut self, byte: u8) -> Result<Option<u8>, LinkError<C::Error>> {
        match self.exchange(byte) {
            Ok(reply) => Ok(Some(reply)),
            Err(LinkError::Channel(e)) if C::is_timeout(&e) => {
                self.delay.delay_us(self.config.byte_delay_us);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn exchange(&mut self, byte: u8) -> Result<u8, LinkError<C::Error>> {
        let reply = self.channel.exchange(byte).map_err(LinkError::Channel)?;
        self.delay.delay_us(self.config.byte_delay_us);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::SimulatedSlave;
    use heapless::Vec;
    use polargraph_hal::{UartChannel, UartChannelError, UartRx, UartTx};
    use polargraph_protocol::{encode_param, CMD_ADD};
    use proptest::prelude::*;

    /// Delay that only counts how long it was asked to wait
    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    /// Channel wrapper that records every byte sent
    struct Recording<C> {
        inner: C,
        sent: Vec<u8, 512>,
    }

    impl<C> Recording<C> {
        fn new(inner: C) -> Self {
            Self {
                inner,
                sent: Vec::new(),
            }
        }
    }

    impl<C: ByteChannel> ByteChannel for Recording<C> {
        type Error = C::Error;

        fn exchange(&mut self, byte: u8) -> Result<u8, C::Error> {
            let _ = self.sent.push(byte);
            self.inner.exchange(byte)
        }

        fn is_timeout(error: &C::Error) -> bool {
            C::is_timeout(error)
        }
    }

    /// Slave that never answers with anything but zero
    struct Silent;

    impl ByteChannel for Silent {
        type Error = ();

        fn exchange(&mut self, _byte: u8) -> Result<u8, ()> {
            Ok(0)
        }
    }

    /// Channel that fails after a fixed number of exchanges
    struct Flaky {
        remaining: u32,
    }

    impl ByteChannel for Flaky {
        type Error = &'static str;

        fn exchange(&mut self, _byte: u8) -> Result<u8, &'static str> {
            if self.remaining == 0 {
                return Err("bus fault");
            }
            self.remaining -= 1;
            Ok(ACK_BYTE)
        }
    }

    /// Serial port whose reads always time out
    struct DeadSerial;

    impl UartTx for DeadSerial {
        type Error = &'static str;

        fn write_blocking(&mut self, _data: &[u8]) -> Result<(), &'static str> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), &'static str> {
            Ok(())
        }
    }

    impl UartRx for DeadSerial {
        type Error = &'static str;

        fn read_blocking(&mut self, _buf: &mut [u8]) -> Result<usize, &'static str> {
            Err("timed out")
        }

        fn is_timeout(error: &&'static str) -> bool {
            *error == "timed out"
        }
    }

    /// Channel that plays back scripted replies, `None` being a timeout,
    /// then answers every byte with ACK
    struct Scripted {
        replies: &'static [Option<u8>],
        index: usize,
    }

    impl ByteChannel for Scripted {
        type Error = &'static str;

        fn exchange(&mut self, _byte: u8) -> Result<u8, &'static str> {
            let reply = self.replies.get(self.index).copied().unwrap_or(Some(ACK_BYTE));
            self.index += 1;
            reply.ok_or("timed out")
        }

        fn is_timeout(error: &&'static str) -> bool {
            *error == "timed out"
        }
    }

    fn link<C: ByteChannel>(channel: C, config: LinkConfig) -> CommandLink<C, CountingDelay> {
        CommandLink::new(channel, CountingDelay::default(), config)
    }

    #[test]
    fn test_motor_frame_wire_sequence() {
        let mut link = link(Recording::new(SimulatedSlave::new()), LinkConfig::default());

        let result = link
            .send_motor_command(Direction::Forward, 0x0102, Direction::Reverse, 5)
            .unwrap();

        assert_eq!(result, 0);
        assert_eq!(
            link.channel().sent.as_slice(),
            &[b'c', b'f', 0x02, 0x01, b'r', 0x05, 0x00, 0x00, 0x00]
        );
        assert_eq!(link.state(), LinkState::Idle);
    }

    #[test]
    fn test_generic_frame_wire_sequence() {
        let mut link = link(Recording::new(SimulatedSlave::new()), LinkConfig::default());

        let result = link.send_generic_command(CMD_ADD, 300, -12).unwrap();

        assert_eq!(result, 288);
        assert_eq!(
            link.channel().sent.as_slice(),
            &[b'c', CMD_ADD, 0x2C, 0x01, 0xF4, 0xFF, 0x00, 0x00]
        );
    }

    #[test]
    fn test_handshake_acked_on_nth_attempt() {
        for n in 1..=5u32 {
            let slave = SimulatedSlave::new().with_busy_handshakes(n - 1);
            let mut link = link(Recording::new(slave), LinkConfig::default());

            link.send_generic_command(CMD_ADD, 1, 1).unwrap();

            let sent = &link.channel().sent;
            let handshake_bytes = 2 * n as usize;
            assert_eq!(link.stats().last_handshake_attempts, n);
            // Only start/command pairs precede the payload
            for pair in sent[..handshake_bytes].chunks(2) {
                assert_eq!(pair, &[b'c', CMD_ADD]);
            }
            assert_eq!(sent.len(), handshake_bytes + 4 + 2);
        }
    }

    #[test]
    fn test_bounded_handshake_stalls() {
        let config = LinkConfig {
            handshake: HandshakePolicy::Bounded(5),
            ..LinkConfig::default()
        };
        let mut link = link(Recording::new(Silent), config);

        let err = link
            .send_motor_command(Direction::Forward, 1, Direction::Forward, 1)
            .unwrap_err();

        assert_eq!(err, LinkError::Stall { attempts: 5 });
        assert_eq!(link.channel().sent.len(), 10);
        assert_eq!(link.state(), LinkState::Idle);
        assert_eq!(link.stats().stalls, 1);
        assert_eq!(link.stats().frames, 0);
    }

    #[test]
    fn test_read_timeouts_count_as_missed_acks() {
        let config = LinkConfig {
            handshake: HandshakePolicy::Bounded(5),
            ..LinkConfig::default()
        };
        let mut link = link(UartChannel::new(DeadSerial), config);

        let err = link
            .send_motor_command(Direction::Forward, 1, Direction::Forward, 1)
            .unwrap_err();

        assert_eq!(err, LinkError::Stall { attempts: 5 });
        assert_eq!(link.stats().total_handshake_attempts, 5);
        assert_eq!(link.stats().stalls, 1);
        assert_eq!(link.state(), LinkState::Idle);
    }

    #[test]
    fn test_handshake_recovers_after_timeouts() {
        // Start byte times out, then the command byte, then a plain non-ACK
        let channel = Scripted {
            replies: &[None, Some(0), None, Some(0), Some(0)],
            index: 0,
        };
        let mut link = link(channel, LinkConfig::default());

        let result = link.send_generic_command(CMD_ADD, 1, 1).unwrap();

        assert_eq!(result, i16::from_le_bytes([ACK_BYTE, ACK_BYTE]));
        assert_eq!(link.stats().last_handshake_attempts, 4);
        // 4 attempts minus the skipped command byte, 4 payload, 2 result
        assert_eq!(link.channel().index, 7 + 4 + 2);
    }

    #[test]
    fn test_serial_write_error_is_fatal() {
        struct Unplugged;

        impl UartTx for Unplugged {
            type Error = &'static str;

            fn write_blocking(&mut self, _data: &[u8]) -> Result<(), &'static str> {
                Err("unplugged")
            }

            fn flush(&mut self) -> Result<(), &'static str> {
                Ok(())
            }
        }

        impl UartRx for Unplugged {
            type Error = &'static str;

            fn read_blocking(&mut self, _buf: &mut [u8]) -> Result<usize, &'static str> {
                Err("timed out")
            }

            fn is_timeout(error: &&'static str) -> bool {
                *error == "timed out"
            }
        }

        let mut link = link(UartChannel::new(Unplugged), LinkConfig::default());

        let err = link.send_generic_command(CMD_ADD, 1, 1).unwrap_err();

        assert_eq!(err, LinkError::Channel(UartChannelError::Tx("unplugged")));
        assert_eq!(link.stats().total_handshake_attempts, 0);
    }

    #[test]
    fn test_out_of_range_steps_sends_nothing() {
        let mut link = link(Recording::new(SimulatedSlave::new()), LinkConfig::default());

        let err = link
            .send_motor_command(Direction::Forward, 40_000, Direction::Forward, 0)
            .unwrap_err();

        assert_eq!(err, LinkError::Frame(FrameError::ParameterOutOfRange));
        assert!(link.channel().sent.is_empty());
    }

    #[test]
    fn test_reserved_generic_command_rejected() {
        let mut link = link(Silent, LinkConfig::default());
        assert_eq!(
            link.send_generic_command(b'r', 0, 0),
            Err(LinkError::Frame(FrameError::ReservedCommand))
        );
    }

    #[test]
    fn test_channel_error_resets_state() {
        // Handshake succeeds (every reply is ACK), payload fails midway
        let mut link = link(Flaky { remaining: 4 }, LinkConfig::default());

        let err = link.send_generic_command(CMD_ADD, 1, 2).unwrap_err();

        assert_eq!(err, LinkError::Channel("bus fault"));
        assert_eq!(link.state(), LinkState::Idle);
        assert_eq!(link.stats().frames, 0);
    }

    #[test]
    fn test_byte_delay_between_exchanges() {
        let config = LinkConfig {
            byte_delay_us: 25,
            ..LinkConfig::default()
        };
        let mut link = link(SimulatedSlave::new(), config);

        link.send_generic_command(CMD_ADD, 0, 0).unwrap();

        // 2 handshake + 4 payload + 2 result bytes, no pause after the last
        let (_, delay) = link.into_parts();
        assert_eq!(delay.total_ns, 7 * 25_000);
    }

    #[test]
    fn test_stats_accumulate() {
        let slave = SimulatedSlave::new().with_busy_handshakes(2);
        let mut link = link(slave, LinkConfig::default());

        link.send_generic_command(CMD_ADD, 1, 1).unwrap();
        link.send_generic_command(CMD_ADD, 2, 2).unwrap();

        let stats = link.stats();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.last_handshake_attempts, 1);
        assert_eq!(stats.total_handshake_attempts, 4);
    }

    proptest! {
        #[test]
        fn prop_simulated_add_matches_wrapping_add(a in any::<i16>(), b in any::<i16>()) {
            let mut link = link(Recording::new(SimulatedSlave::new()), LinkConfig::default());

            let result = link.send_generic_command(CMD_ADD, a, b).unwrap();

            prop_assert_eq!(result, a.wrapping_add(b));
            let sent = link.channel().sent.as_slice();
            prop_assert_eq!(&sent[2..4], &encode_param(a));
            prop_assert_eq!(&sent[4..6], &encode_param(b));
        }
    }

    #[test]
    fn test_policy_from_attempts() {
        assert_eq!(HandshakePolicy::from_attempts(0), HandshakePolicy::Unbounded);
        assert_eq!(HandshakePolicy::from_attempts(3), HandshakePolicy::Bounded(3));
    }
}
