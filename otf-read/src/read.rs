//! Traits for interpreting font data.

use otf_types::Tag;

use crate::font_data::FontData;

/// A type that can be parsed from font data with no external context.
pub trait FontRead<'a>: Sized {
    fn read(data: FontData<'a>) -> Result<Self, ReadError>;
}

impl<'a> FontRead<'a> for FontData<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        Ok(data)
    }
}

/// A type that needs additional context (counts from a sibling field, the
/// containing table's format, ...) in order to be parsed.
pub trait ReadArgs {
    type Args: Copy;
}

pub trait FontReadWithArgs<'a>: Sized + ReadArgs {
    fn read_with_args(data: FontData<'a>, args: &Self::Args) -> Result<Self, ReadError>;
}

impl<'a, T: FontRead<'a>> ReadArgs for T {
    type Args = ();
}

impl<'a, T: FontRead<'a>> FontReadWithArgs<'a> for T {
    fn read_with_args(data: FontData<'a>, _: &Self::Args) -> Result<Self, ReadError> {
        Self::read(data)
    }
}

/// A type whose on-disk size can be computed from its `Args` alone, without
/// reading any bytes (e.g. a `ValueRecord`, whose size follows from its
/// `ValueFormat`).
pub trait ComputeSize: ReadArgs {
    fn compute_size(args: &Self::Args) -> Result<usize, ReadError>;
}

/// Errors that can occur while reading font data.
///
/// Every variant is produced in response to malformed or truncated bytes;
/// none of them indicate a bug in the reader itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    OutOfBounds,
    InvalidFormat(u16),
    InvalidSfnt(u32),
    InvalidTtc(Tag),
    InvalidCollectionIndex(u32),
    InvalidArrayLen,
    NullOffset,
    TableIsMissing(Tag),
    MalformedData(&'static str),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::OutOfBounds => write!(f, "an offset was out of bounds"),
            ReadError::InvalidFormat(x) => write!(f, "invalid format discriminant '{x}'"),
            ReadError::InvalidSfnt(ver) => write!(f, "invalid sfnt version 0x{ver:08X}"),
            ReadError::InvalidTtc(tag) => write!(f, "invalid ttc tag {tag}"),
            ReadError::InvalidCollectionIndex(ix) => {
                write!(f, "invalid index {ix} for font collection")
            }
            ReadError::InvalidArrayLen => {
                write!(f, "array length is not a multiple of the item size")
            }
            ReadError::NullOffset => write!(f, "an offset was unexpectedly null"),
            ReadError::TableIsMissing(tag) => write!(f, "the {tag} table is missing"),
            ReadError::MalformedData(msg) => write!(f, "malformed data: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReadError {}
