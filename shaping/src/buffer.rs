//! The glyph stream: `GlyphInfo`/`GlyphPosition` pairs the shaper mutates in
//! place, plus the attachment bookkeeping GPOS cursive/mark lookups record.

use otf_types::GlyphId;

/// The caller-supplied shaping direction (§6). This core does not guess it
/// and does not reorder the stream for it; it only changes which axis GPOS
/// treats as "advance" and which way cursive/mark sign conventions run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::LeftToRight | Direction::RightToLeft)
    }

    pub fn is_backward(self) -> bool {
        matches!(self, Direction::RightToLeft | Direction::BottomToTop)
    }
}

/// How a position is attached to another position in the stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttachType {
    #[default]
    None,
    Mark,
    Cursive,
}

/// One glyph's identity and provenance: the codepoint it came from, the
/// resolved glyph ID, its original cluster index, and (once classified) its
/// GDEF glyph class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphInfo {
    pub codepoint: u32,
    pub glyph_id: GlyphId,
    pub cluster: u32,
    pub gdef_class: Option<otf_read::tables::gdef::GlyphClass>,
}

impl GlyphInfo {
    pub fn from_codepoint(codepoint: u32, cluster: u32) -> Self {
        GlyphInfo {
            codepoint,
            glyph_id: GlyphId::NOTDEF,
            cluster,
            gdef_class: None,
        }
    }
}

/// A glyph's placement and advance, plus any attachment link recorded by a
/// mark or cursive GPOS lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphPosition {
    pub x_placement: i32,
    pub y_placement: i32,
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub attach_type: AttachType,
    /// Signed offset, in stream positions, to the position this one attaches
    /// to. Zero means unattached.
    pub attach_chain: i16,
}

/// The mutable glyph stream a shape pass operates on: parallel `info`/`pos`
/// arrays of equal length, built from text and read back by the caller.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    pub info: Vec<GlyphInfo>,
    pub pos: Vec<GlyphPosition>,
    pub direction: Direction,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer::default()
    }

    /// Build a buffer from codepoints, one cluster per codepoint, in order.
    pub fn from_codepoints(codepoints: impl IntoIterator<Item = u32>) -> Self {
        let info: Vec<GlyphInfo> = codepoints
            .into_iter()
            .enumerate()
            .map(|(i, cp)| GlyphInfo::from_codepoint(cp, i as u32))
            .collect();
        let pos = vec![GlyphPosition::default(); info.len()];
        Buffer {
            info,
            pos,
            direction: Direction::default(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn len(&self) -> usize {
        self.info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    /// Panics (in debug assertions) if `info` and `pos` have drifted apart;
    /// every external observation point must uphold this.
    pub fn assert_consistent(&self) {
        debug_assert_eq!(self.info.len(), self.pos.len());
    }
}
