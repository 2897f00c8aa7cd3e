//! The `GDEF` table: glyph class definitions, mark-attachment classes, mark
//! glyph sets, and the lookup-flag skip predicate built from them.

use otf_types::{GlyphId, Offset16};

use super::layout::{ClassDef, CoverageTable, LookupFlag};
use crate::font_data::FontData;
use crate::offset::{Offset, ResolveOffset};
use crate::read::{FontRead, ReadError};

/// Values of the `GlyphClassDef` enumeration (§2, "GDEF table").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphClass {
    Base,
    Ligature,
    Mark,
    Component,
}

impl GlyphClass {
    fn from_raw(value: u32) -> Option<Self> {
        match value {
            1 => Some(GlyphClass::Base),
            2 => Some(GlyphClass::Ligature),
            3 => Some(GlyphClass::Mark),
            4 => Some(GlyphClass::Component),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
pub struct Gdef<'a> {
    data: FontData<'a>,
    glyph_class_def_offset: Offset16,
    mark_attach_class_def_offset: Offset16,
    mark_glyph_sets_def_offset: Offset16,
    minor_version: u16,
}

impl<'a> FontRead<'a> for Gdef<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let major = data.read_at::<u16>(0)?;
        let minor_version = data.read_at::<u16>(2)?;
        if major != 1 {
            return Err(ReadError::InvalidFormat(major));
        }
        let glyph_class_def_offset = data.read_at::<Offset16>(4)?;
        let mark_attach_class_def_offset = data.read_at::<Offset16>(8)?;
        let mark_glyph_sets_def_offset = if minor_version >= 2 {
            data.read_at::<Offset16>(10)?
        } else {
            Offset16::new(0)
        };
        Ok(Gdef {
            data,
            glyph_class_def_offset,
            mark_attach_class_def_offset,
            mark_glyph_sets_def_offset,
            minor_version,
        })
    }
}

impl<'a> Gdef<'a> {
    pub fn glyph_class(&self, glyph: GlyphId) -> Option<GlyphClass> {
        self.glyph_class_def_offset
            .non_null()?;
        let class_def: ClassDef = self.glyph_class_def_offset.resolve(self.data).ok()?;
        GlyphClass::from_raw(class_def.class(glyph))
    }

    pub fn mark_attach_class(&self, glyph: GlyphId) -> u16 {
        if self.mark_attach_class_def_offset.non_null().is_none() {
            return 0;
        }
        let class_def: Result<ClassDef, _> = self.mark_attach_class_def_offset.resolve(self.data);
        class_def.map(|c| c.class(glyph) as u16).unwrap_or(0)
    }

    /// True if `glyph` belongs to mark-filtering set `set_index`.
    pub fn mark_set_contains(&self, set_index: u16, glyph: GlyphId) -> bool {
        if self.minor_version < 2 || self.mark_glyph_sets_def_offset.non_null().is_none() {
            return false;
        }
        let sets: Result<MarkGlyphSets, _> = self.mark_glyph_sets_def_offset.resolve(self.data);
        let Ok(sets) = sets else { return false };
        sets.contains(set_index, glyph)
    }

    /// Whether `glyph` should be skipped by lookup iteration under `flag`,
    /// consulting this table's glyph-class and mark-attachment data.
    ///
    /// `mark_filtering_set` is the lookup's own mark-filtering-set index,
    /// already gated on `flag.use_mark_filtering_set()` by the caller.
    pub fn should_skip(&self, glyph: GlyphId, flag: LookupFlag, mark_filtering_set: Option<u16>) -> bool {
        let class = self.glyph_class(glyph);
        if flag.ignore_base_glyphs() && class == Some(GlyphClass::Base) {
            return true;
        }
        if flag.ignore_ligatures() && class == Some(GlyphClass::Ligature) {
            return true;
        }
        if flag.ignore_marks() && class == Some(GlyphClass::Mark) {
            return true;
        }
        if let Some(set_index) = mark_filtering_set {
            if class == Some(GlyphClass::Mark) && !self.mark_set_contains(set_index, glyph) {
                return true;
            }
        }
        if let Some(required) = flag.mark_attachment_type() {
            if class == Some(GlyphClass::Mark) && self.mark_attach_class(glyph) != required {
                return true;
            }
        }
        false
    }
}

#[derive(Clone, Copy)]
struct MarkGlyphSets<'a> {
    data: FontData<'a>,
    count: u16,
}

impl<'a> FontRead<'a> for MarkGlyphSets<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let _format = data.read_at::<u16>(0)?;
        let count = data.read_at::<u16>(2)?;
        Ok(MarkGlyphSets { data, count })
    }
}

impl<'a> MarkGlyphSets<'a> {
    fn contains(&self, set_index: u16, glyph: GlyphId) -> bool {
        if set_index >= self.count {
            return false;
        }
        let offset: Result<Offset16, _> = self.data.read_at(4 + set_index as usize * 4);
        let Ok(offset) = offset else { return false };
        let coverage: Result<CoverageTable, _> = offset.resolve(self.data);
        coverage
            .ok()
            .and_then(|c| c.coverage_index(glyph))
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuilder;

    #[test]
    fn classifies_by_glyph_class_def() {
        let mut class_def = BeBuilder::new();
        class_def.u16(1).u16(10).u16(1);
        class_def.u16(2); // glyph 10 -> ligature
        let class_def_bytes = class_def.build();

        let mut gdef = BeBuilder::new();
        gdef.u16(1).u16(0);
        gdef.u16(12); // glyph_class_def offset
        gdef.u16(0); // mark_attach_class_def offset (null)
        gdef.bytes(&class_def_bytes);
        let bytes = gdef.build();

        let table = Gdef::read(FontData::new(&bytes)).unwrap();
        assert_eq!(table.glyph_class(GlyphId::new(10)), Some(GlyphClass::Ligature));
        assert_eq!(table.glyph_class(GlyphId::new(11)), None);
    }
}
