//! The shaping pipeline (§4.11): map codepoints to glyphs, classify them,
//! run GSUB, apply base advances, run GPOS.

use otf_read::{FontRef, TableProvider};
use otf_types::{Fixed, GlyphId, Tag};

use crate::buffer::Buffer;
use crate::error::ShapingError;
use crate::feature::Feature;
use crate::position;
use crate::substitute;
use crate::variation::VariationInstance;

/// A shaper bound to one font and one variation instance. Cheap to build;
/// the expensive part (parsing tables) is deferred to each `shape` call's
/// lazy table lookups, consistent with `TableProvider` being soft-failing.
pub struct Shaper<'a> {
    font: FontRef<'a>,
    variation: Option<VariationInstance>,
}

impl<'a> Shaper<'a> {
    /// Build a shaper at the font's default variation location (§3).
    pub fn new(font: FontRef<'a>) -> Self {
        let variation = font.fvar().as_ref().map(VariationInstance::new);
        Shaper { font, variation }
    }

    /// Set one variation axis's design-space value. A no-op if the font has
    /// no `fvar` or doesn't recognize `tag`.
    pub fn set_variation_value(&mut self, tag: Tag, value: Fixed) {
        let avar = self.font.avar();
        if let Some(instance) = self.variation.as_mut() {
            instance.set_design_value(tag, value, avar.as_ref());
        }
    }

    pub fn variation(&self) -> Option<&VariationInstance> {
        self.variation.as_ref()
    }

    /// Run the full pipeline over `buffer` in place: map, classify, GSUB,
    /// base advances, GPOS. `cmap` is the only table whose absence is a
    /// hard error; every other component is skipped when absent (§7).
    pub fn shape(&self, buffer: &mut Buffer, features: &[Feature]) -> Result<(), ShapingError> {
        self.map_codepoints(buffer)?;
        let gdef = self.font.gdef();
        self.classify(buffer, gdef.as_ref());

        if let Some(gsub) = self.font.gsub() {
            substitute::apply_features(&gsub, gdef.as_ref(), buffer, features);
        }
        // GSUB may have inserted or dropped positions; re-derive classes
        // for whatever glyphs now occupy the stream.
        self.classify(buffer, gdef.as_ref());

        self.apply_base_advances(buffer);

        if let Some(gpos) = self.font.gpos() {
            position::apply_features(&gpos, gdef.as_ref(), buffer, features);
        }

        buffer.assert_consistent();
        Ok(())
    }

    fn map_codepoints(&self, buffer: &mut Buffer) -> Result<(), ShapingError> {
        let cmap = self.font.cmap()?;
        for info in &mut buffer.info {
            info.glyph_id = cmap.lookup(info.codepoint).unwrap_or(GlyphId::NOTDEF);
        }
        Ok(())
    }

    fn classify(&self, buffer: &mut Buffer, gdef: Option<&otf_read::tables::gdef::Gdef>) {
        for info in &mut buffer.info {
            info.gdef_class = gdef.and_then(|g| g.glyph_class(info.glyph_id));
        }
    }

    /// `hmtx` base advance plus the `HVAR` delta at the current variation
    /// instance, if any (§4.9). Horizontal only: this core carries no
    /// vertical metrics table.
    fn apply_base_advances(&self, buffer: &mut Buffer) {
        let Some(hmtx) = self.font.hmtx() else {
            return;
        };
        let hvar = self.font.hvar();
        let coords = self.variation.as_ref().map(VariationInstance::coords);

        for (info, pos) in buffer.info.iter().zip(buffer.pos.iter_mut()) {
            let base = hmtx.advance(info.glyph_id) as i32;
            let delta = match (&hvar, coords) {
                (Some(hvar), Some(coords)) => hvar.advance_delta(info.glyph_id, coords).unwrap_or(0),
                _ => 0,
            };
            pos.x_advance = base + delta;
        }
    }
}
