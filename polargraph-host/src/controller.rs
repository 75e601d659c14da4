//! Control loop
//!
//! One tick per target point: read the point, convert it to a motor
//! instruction, send it, log the result, then pause. The loop ends quietly
//! when the point stream runs out; every other failure ends it with an error.

use std::fmt;

use embedded_hal::delay::DelayNs;
use polargraph_core::{
    GeometryError, InstructionPair, KinematicsEngine, Point, PointError, PointSource,
};
use polargraph_drivers::{CommandLink, LinkError, LinkStats};
use polargraph_hal::ByteChannel;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default pause between ticks, in milliseconds
pub const DEFAULT_TICK_MS: u32 = 1000;

/// Handshake attempts above which a tick is logged as slow
const SLOW_HANDSHAKE_ATTEMPTS: u32 = 100;

/// Errors that end a run
#[derive(Debug, Error)]
pub enum ControlError<E: fmt::Debug> {
    /// The point stream failed or held a malformed line
    #[error(transparent)]
    Point(#[from] PointError),

    /// The target cannot be reached with the configured geometry
    #[error("tick {tick}: {source}")]
    Geometry {
        tick: u32,
        #[source]
        source: GeometryError,
    },

    /// The motor controller never acknowledged the handshake
    #[error("tick {tick}: no acknowledgement after {attempts} handshake attempts")]
    Stall { tick: u32, attempts: u32 },

    /// Framing or channel failure
    #[error("tick {tick}: link failure: {error:?}")]
    Link { tick: u32, error: LinkError<E> },
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Points sent to the controller
    pub ticks: u32,
    /// Result of the last command, if any was sent
    pub last_result: Option<i16>,
    /// Tracked effector position at the end of the run
    pub final_position: Point,
    /// Link counters at the end of the run
    pub link: LinkStats,
}

/// Drives the plotter from a stream of target points
pub struct Controller<C, D> {
    link: CommandLink<C, D>,
    tick_ms: u32,
    ticks: u32,
}

impl<C, D> Controller<C, D>
where
    C: ByteChannel,
    C::Error: fmt::Debug,
    D: DelayNs,
{
    /// Create a controller pausing `tick_ms` after every point
    pub fn new(link: CommandLink<C, D>, tick_ms: u32) -> Self {
        Self {
            link,
            tick_ms,
            ticks: 0,
        }
    }

    /// The underlying link
    pub fn link(&self) -> &CommandLink<C, D> {
        &self.link
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Run until the point stream is exhausted
    pub fn run<P: PointSource>(
        &mut self,
        engine: &mut KinematicsEngine,
        points: &mut P,
    ) -> Result<RunSummary, ControlError<C::Error>> {
        let mut last_result = None;

        while let Some(target) = points.next_point()? {
            last_result = Some(self.tick(engine, target)?);
            self.link.delay_mut().delay_ms(self.tick_ms);
        }

        info!(ticks = self.ticks, "point stream exhausted");
        Ok(RunSummary {
            ticks: self.ticks,
            last_result,
            final_position: engine.position(),
            link: self.link.stats(),
        })
    }

    /// Convert one target and send it to the controller
    pub fn tick(
        &mut self,
        engine: &mut KinematicsEngine,
        target: Point,
    ) -> Result<i16, ControlError<C::Error>> {
        let tick = self.ticks + 1;

        let planned = engine
            .plan_instruction(target)
            .map_err(|source| ControlError::Geometry { tick, source })?;
        let pair = planned.instructions;
        log_instruction(tick, target, &pair);

        // The engine only moves once the controller has taken the command
        let result = self
            .link
            .send_motor_command(
                pair.left.direction,
                pair.left.steps,
                pair.right.direction,
                pair.right.steps,
            )
            .map_err(|error| match error {
                LinkError::Stall { attempts } => ControlError::Stall { tick, attempts },
                error => ControlError::Link { tick, error },
            })?;
        engine.commit(&planned);

        let attempts = self.link.stats().last_handshake_attempts;
        if attempts > SLOW_HANDSHAKE_ATTEMPTS {
            warn!(tick, attempts, "slow handshake");
        }

        let position = engine.position();
        info!(tick, result, x = position.x, y = position.y, "tick complete");

        self.ticks = tick;
        Ok(result)
    }
}

fn log_instruction(tick: u32, target: Point, pair: &InstructionPair) {
    debug!(
        tick,
        target_x = target.x,
        target_y = target.y,
        left = pair.left.signed_steps(),
        right = pair.right.signed_steps(),
        "instruction"
    );
}
