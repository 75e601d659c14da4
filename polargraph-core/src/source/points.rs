//! Point stream
//!
//! One target per line, written `x,y`. The stream ends when the underlying
//! reader runs out of lines; a line that does not parse is an error for that
//! tick and is never mistaken for the end of the stream.

use std::io::{BufRead, Lines};

use thiserror::Error;

use crate::motion::Point;

/// Errors while reading the point stream
#[derive(Debug, Error)]
pub enum PointError {
    /// The line is not two comma-separated numbers
    #[error("line {line}: expected `x,y`, got {text:?}")]
    Malformed { line: usize, text: String },

    /// The stream could not be read
    #[error("failed to read point stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of target points
pub trait PointSource {
    /// Next target, or `None` once the stream is exhausted
    fn next_point(&mut self) -> Result<Option<Point>, PointError>;
}

/// Point source over any buffered reader
pub struct PointReader<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: BufRead> PointReader<R> {
    /// Read points from a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> PointSource for PointReader<R> {
    fn next_point(&mut self) -> Result<Option<Point>, PointError> {
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let line = line?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            return parse_point(text).map(Some).ok_or_else(|| PointError::Malformed {
                line: self.line_number,
                text: text.to_string(),
            });
        }
        Ok(None)
    }
}

/// Parse `x,y` into a point
///
/// Both coordinates must be finite numbers; surrounding whitespace is allowed.
pub fn parse_point(text: &str) -> Option<Point> {
    let (x, y) = text.split_once(',')?;
    let point = Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?);
    point.is_finite().then_some(point)
}
