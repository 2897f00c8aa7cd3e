use crate::raw::{FixedSize, Scalar};

/// A 16-bit glyph identifier. Glyph 0 is `.notdef`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphId(u16);

impl GlyphId {
    pub const NOTDEF: GlyphId = GlyphId(0);

    pub const fn new(raw: u16) -> Self {
        GlyphId(raw)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }
}

impl std::fmt::Debug for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GID_{}", self.0)
    }
}

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for GlyphId {
    fn from(raw: u16) -> Self {
        GlyphId(raw)
    }
}

impl FixedSize for GlyphId {
    const RAW_BYTE_LEN: usize = 2;
}

impl Scalar for GlyphId {
    type Raw = [u8; 2];
    fn from_raw(raw: Self::Raw) -> Self {
        GlyphId(u16::from_be_bytes(raw))
    }
    fn to_raw(self) -> Self::Raw {
        self.0.to_be_bytes()
    }
}
