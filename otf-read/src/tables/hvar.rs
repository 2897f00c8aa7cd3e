//! The `HVAR` table: per-glyph advance-width deltas for variable fonts
//! (§4.9). Unlike GPOS value records, this delta *is* applied by the core
//! shaping pipeline.

use otf_types::{F2Dot14, GlyphId, Offset32};

use super::variations::{DeltaSetIndex, DeltaSetIndexMap, ItemVariationStore};
use crate::font_data::FontData;
use crate::offset::{Offset, ResolveOffset};
use crate::read::{FontRead, ReadError};

#[derive(Clone, Copy)]
pub struct Hvar<'a> {
    data: FontData<'a>,
    item_variation_store_offset: Offset32,
    advance_width_mapping_offset: Offset32,
}

impl<'a> FontRead<'a> for Hvar<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let item_variation_store_offset = data.read_at::<Offset32>(4)?;
        let advance_width_mapping_offset = data.read_at::<Offset32>(8)?;
        Ok(Hvar {
            data,
            item_variation_store_offset,
            advance_width_mapping_offset,
        })
    }
}

impl<'a> Hvar<'a> {
    fn item_variation_store(&self) -> Result<ItemVariationStore<'a>, ReadError> {
        self.item_variation_store_offset.resolve(self.data)
    }

    fn advance_width_mapping(&self) -> Option<DeltaSetIndexMap<'a>> {
        self.advance_width_mapping_offset
            .non_null()
            .and_then(|_| self.advance_width_mapping_offset.resolve(self.data).ok())
    }

    /// The advance-width delta (in font design units) for `glyph` at the
    /// given normalized instance coordinates. Zero for an instance at the
    /// font's default (all-zero) location.
    pub fn advance_delta(&self, glyph: GlyphId, coords: &[F2Dot14]) -> Result<i32, ReadError> {
        let store = self.item_variation_store()?;
        let index = match self.advance_width_mapping() {
            Some(map) => map.get(glyph.to_u16() as u32)?,
            None => DeltaSetIndex {
                outer: 0,
                inner: glyph.to_u16(),
            },
        };
        store.compute_delta(index, coords)
    }
}
