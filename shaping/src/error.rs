//! Shaper-level error kinds (§7): a thin wrap over [`otf_read::ReadError`]
//! plus the one error this crate adds, a malformed feature string.

use std::fmt;

use otf_read::ReadError;

#[derive(Debug)]
pub enum ShapingError {
    /// The font container or a required table failed to parse.
    Font(ReadError),
    /// A feature string did not match the `[+|-]tag[start:end][=value]` grammar.
    InvalidFeature(String),
}

impl From<ReadError> for ShapingError {
    fn from(err: ReadError) -> Self {
        ShapingError::Font(err)
    }
}

impl fmt::Display for ShapingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapingError::Font(err) => write!(f, "font error: {err}"),
            ShapingError::InvalidFeature(s) => write!(f, "invalid feature string: {s:?}"),
        }
    }
}

impl std::error::Error for ShapingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShapingError::Font(err) => Some(err),
            ShapingError::InvalidFeature(_) => None,
        }
    }
}
