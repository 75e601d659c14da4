//! `label:value` configuration source
//!
//! The configuration file is a short list of lines such as
//!
//! ```text
//! width: 500
//! spool radius: 5
//! steps per rev: 200
//! start x: 250
//! start y: 300
//! ```
//!
//! Only the text after the first `:` is read; labels are for humans. Values
//! are consumed strictly in the order of [`SETUP_FIELDS`]. Blank lines and
//! `#` comments are skipped.

use std::io::BufRead;

use thiserror::Error;

use super::machine::MachineSetup;

/// Field names, in the order the source must provide them
pub const SETUP_FIELDS: [&str; 5] = [
    "width",
    "spool radius",
    "steps per revolution",
    "initial x",
    "initial y",
];

/// Configuration errors; all of them abort startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source ended before every field was read
    #[error("configuration ended before `{field}` was given")]
    Missing { field: &'static str },

    /// A line has no `:` separator
    #[error("line {line}: expected `label:value` for `{field}`, got {text:?}")]
    Malformed {
        line: usize,
        field: &'static str,
        text: String,
    },

    /// The value after `:` is not a number
    #[error("line {line}: `{field}` is not a number: {text:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        text: String,
    },

    /// A geometry value is zero, negative or not finite
    #[error("`{field}` must be a positive finite number, got {value}")]
    InvalidValue { field: &'static str, value: f64 },

    /// The initial position is not finite
    #[error("initial position ({x}, {y}) is not finite")]
    InvalidPosition { x: f64, y: f64 },

    /// The source could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the five setup values from a line-oriented source
///
/// Lines after the fifth value are ignored.
pub fn read_setup<R: BufRead>(reader: R) -> Result<MachineSetup, ConfigError> {
    let mut values = [0.0f64; SETUP_FIELDS.len()];
    let mut filled = 0;

    for (index, line) in reader.lines().enumerate() {
        if filled == values.len() {
            break;
        }
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        values[filled] = parse_value(index + 1, SETUP_FIELDS[filled], text)?;
        filled += 1;
    }

    if filled < values.len() {
        return Err(ConfigError::Missing {
            field: SETUP_FIELDS[filled],
        });
    }

    let [width, spool_radius, steps_per_revolution, initial_x, initial_y] = values;
    Ok(MachineSetup {
        width,
        spool_radius,
        steps_per_revolution,
        initial_x,
        initial_y,
    })
}

/// Parse setup values from an in-memory string
pub fn parse_setup(input: &str) -> Result<MachineSetup, ConfigError> {
    read_setup(input.as_bytes())
}

/// Parse the number after the first `:` of a line
fn parse_value(line: usize, field: &'static str, text: &str) -> Result<f64, ConfigError> {
    let (_, value) = text.split_once(':').ok_or_else(|| ConfigError::Malformed {
        line,
        field,
        text: text.to_string(),
    })?;
    let value = value.trim();
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        line,
        field,
        text: value.to_string(),
    })
}
