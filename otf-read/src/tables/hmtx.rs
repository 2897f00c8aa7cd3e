//! `hmtx`: per-glyph horizontal metrics, plus `FaceMetrics`, a small bundle
//! of font-wide numbers the shaping pipeline and callers both want (this
//! engine's addition over the bare OpenType tables it reads from).

use otf_types::GlyphId;

use super::head::Head;
use super::hhea::Hhea;
use super::maxp::Maxp;
use crate::font_data::FontData;
use crate::read::{FontRead, FontReadWithArgs, ReadArgs, ReadError};

#[derive(Clone, Copy, Debug)]
pub struct Hmtx<'a> {
    data: FontData<'a>,
    number_of_h_metrics: u16,
}

impl ReadArgs for Hmtx<'_> {
    type Args = u16;
}

impl<'a> FontReadWithArgs<'a> for Hmtx<'a> {
    fn read_with_args(data: FontData<'a>, number_of_h_metrics: &u16) -> Result<Self, ReadError> {
        Ok(Hmtx {
            data,
            number_of_h_metrics: *number_of_h_metrics,
        })
    }
}

impl<'a> Hmtx<'a> {
    /// The base advance width, in font design units, for `glyph`. Glyphs
    /// beyond the last explicit record repeat the final advance (per spec).
    pub fn advance(&self, glyph: GlyphId) -> u16 {
        if self.number_of_h_metrics == 0 {
            return 0;
        }
        let index = (glyph.to_u16() as usize).min(self.number_of_h_metrics as usize - 1);
        self.data.read_at::<u16>(index * 4).unwrap_or(0)
    }
}

/// Font-wide metrics summarized for shaping callers: units-per-em, vertical
/// extents, glyph count, and per-glyph advance lookup bundled from `hmtx`.
#[derive(Clone, Copy, Debug)]
pub struct FaceMetrics<'a> {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub num_glyphs: u16,
    hmtx: Option<Hmtx<'a>>,
}

impl<'a> FaceMetrics<'a> {
    pub fn from_tables(head: &Head, hhea: &Hhea, maxp: &Maxp, hmtx: Option<Hmtx<'a>>) -> Self {
        FaceMetrics {
            units_per_em: head.units_per_em,
            ascender: hhea.ascender,
            descender: hhea.descender,
            line_gap: hhea.line_gap,
            num_glyphs: maxp.num_glyphs,
            hmtx,
        }
    }

    /// The base advance width, in font design units, for `glyph`. Zero if
    /// the font carries no `hmtx` table.
    pub fn advance(&self, glyph: GlyphId) -> u16 {
        self.hmtx.map(|h| h.advance(glyph)).unwrap_or(0)
    }
}
