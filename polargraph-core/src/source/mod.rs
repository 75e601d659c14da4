//! Target point input

pub mod points;

pub use points::{parse_point, PointError, PointReader, PointSource};
