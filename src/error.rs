//! Error type shared by every pipeline stage.
//!
//! All of these are fatal at generation time: the generator aborts rather
//! than emit a table with an undefined entry.

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::lut::domain::Axis;

#[derive(Error, Debug)]
pub enum LutError {
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration or weights file failed to parse; `text` is kept so the
    /// CLI can render the diagnostic against it.
    #[error("{}: {diagnostic}", path.display())]
    Parse {
        path: PathBuf,
        text: String,
        diagnostic: Diagnostic,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{what}: expected {expected} values, found {found}")]
    Dimension {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("weights are encoded at scale {weights} but the configuration evaluates at scale {config}")]
    ScaleMismatch { weights: i32, config: i32 },

    #[error("{axis} raw value {value} outside declared domain [{min}, {max}]")]
    OutOfDomain {
        axis: Axis,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("32-bit overflow in {stage} unit {unit}")]
    Overflow { stage: &'static str, unit: usize },

    #[error("decision code {code} does not fit in {bits} bits")]
    PackOverflow { code: u8, bits: u32 },

    #[error("table length {found} bytes, expected {expected}")]
    Length { expected: usize, found: usize },

    #[error("manifest disagrees with {what}: recorded {recorded}, actual {actual}")]
    Manifest {
        what: &'static str,
        recorded: String,
        actual: String,
    },

    #[error("verification failed: {mismatches} of {checked} sampled entries differ")]
    Verification { checked: usize, mismatches: usize },
}

impl LutError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LutError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn dimension(what: impl Into<String>, expected: usize, found: usize) -> Self {
        LutError::Dimension {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Render to stderr, using ariadne for errors that point into a file.
    pub fn report(&self) {
        match self {
            LutError::Parse {
                path,
                text,
                diagnostic,
            } => diagnostic.render(&path.to_string_lossy(), text),
            other => eprintln!("error: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_domain_message_names_axis() {
        let e = LutError::OutOfDomain {
            axis: Axis::BallVy,
            value: 5,
            min: -4,
            max: 4,
        };
        assert_eq!(
            e.to_string(),
            "ball_vy raw value 5 outside declared domain [-4, 4]"
        );
    }

    #[test]
    fn dimension_message() {
        let e = LutError::dimension("weights1 row 2", 8, 7);
        assert_eq!(e.to_string(), "weights1 row 2: expected 8 values, found 7");
    }
}
