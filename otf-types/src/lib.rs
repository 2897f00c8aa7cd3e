//! Scalar data types shared by OpenType font tables.
//!
//! These mirror the handful of primitive encodings the OpenType spec uses
//! everywhere: big-endian integers of various widths, 16.16 and 2.14
//! fixed-point fractions, four-byte tags, glyph identifiers, and offsets.
//! Nothing here knows how to parse a *table* — that lives in `otf-read`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate core as std;

mod fixed;
mod glyph_id;
mod offset;
mod raw;
mod tag;
mod uint24;

#[cfg(all(test, feature = "serde"))]
mod serde_test;

pub use fixed::{F2Dot14, Fixed};
pub use glyph_id::GlyphId;
pub use offset::{Nullable, Offset16, Offset24, Offset32};
pub use raw::{BigEndian, FixedSize, Scalar};
pub use tag::{InvalidTag, Tag};
pub use uint24::Uint24;

/// A glyph-space design unit delta, stored as `i16` (FWORD in the OpenType spec).
pub type FWord = i16;
/// An unsigned glyph-space design unit, stored as `u16` (UFWORD in the OpenType spec).
pub type UfWord = u16;

/// The header tag of a font-collection (`ttcf`) file.
pub const TTC_HEADER_TAG: Tag = Tag::new(b"ttcf");
/// sfnt version for TrueType-outline fonts.
pub const TT_SFNT_VERSION: u32 = 0x0001_0000;
/// sfnt version used by legacy Apple TrueType fonts.
pub const TRUE_SFNT_VERSION: u32 = 0x7472_7565;
/// sfnt version for CFF-outline (OpenType/CFF) fonts.
pub const OTTO_SFNT_VERSION: u32 = 0x4F54_544F;
