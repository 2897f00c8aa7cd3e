//! The `cmap` table: codepoint-to-glyph resolution across multiple encoding
//! subtables, picked by a fixed platform/encoding priority table (§4.10).

use otf_types::GlyphId;

use crate::font_data::FontData;
use crate::read::{FontRead, ReadError};

fn subtable_priority(platform_id: u16, encoding_id: u16) -> u32 {
    match (platform_id, encoding_id) {
        (3, 0) => 100,
        (3, 10) => 90,
        (0, 6) => 89,
        (0, 4) => 88,
        (3, 1) => 80,
        (0, 3) => 79,
        (0, 2) => 78,
        (0, 1) => 77,
        (0, 0) => 76,
        (1, 0) => 10,
        _ => 0,
    }
}

#[derive(Clone, Copy)]
pub struct Cmap<'a> {
    data: FontData<'a>,
    num_tables: u16,
}

impl<'a> FontRead<'a> for Cmap<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let _version = data.read_at::<u16>(0)?;
        let num_tables = data.read_at::<u16>(2)?;
        Ok(Cmap { data, num_tables })
    }
}

impl<'a> Cmap<'a> {
    fn records(&self) -> impl Iterator<Item = (u16, u16, u32)> + '_ {
        (0..self.num_tables).filter_map(move |i| {
            let rec_off = 4 + i as usize * 8;
            let platform_id = self.data.read_at::<u16>(rec_off).ok()?;
            let encoding_id = self.data.read_at::<u16>(rec_off + 2).ok()?;
            let offset = self.data.read_at::<u32>(rec_off + 4).ok()?;
            Some((platform_id, encoding_id, offset))
        })
    }

    /// Select and parse the highest-priority subtable that actually parses.
    fn best_subtable(&self) -> Option<CmapSubtable<'a>> {
        let mut candidates: Vec<_> = self.records().collect();
        candidates.sort_by_key(|&(p, e, _)| std::cmp::Reverse(subtable_priority(p, e)));
        for (_, _, offset) in candidates {
            let Some(subtable_data) = self.data.slice(offset as usize..) else {
                continue;
            };
            if let Ok(subtable) = CmapSubtable::read(subtable_data) {
                return Some(subtable);
            }
        }
        None
    }

    fn variation_subtable(&self) -> Option<FontData<'a>> {
        self.records()
            .find(|&(p, e, _)| (p, e) == (0, 5))
            .and_then(|(_, _, offset)| self.data.slice(offset as usize..))
    }

    /// Map a Unicode scalar to a glyph ID, or `None` if uncovered.
    pub fn lookup(&self, codepoint: u32) -> Option<GlyphId> {
        self.best_subtable()?.lookup(codepoint)
    }

    /// Look up `codepoint` with an explicit variation selector, preferring a
    /// per-variant mapping over the base cmap (§4.10).
    pub fn lookup_with_variation(&self, codepoint: u32, selector: u32) -> Option<GlyphId> {
        if let Some(vs_data) = self.variation_subtable() {
            if let Ok(vs) = VariationSelectorTable::read(vs_data) {
                match vs.lookup(codepoint, selector) {
                    VariationLookup::Variant(gid) => return Some(gid),
                    VariationLookup::UseDefault => return self.lookup(codepoint),
                    VariationLookup::NotFound => {}
                }
            }
        }
        self.lookup(codepoint)
    }
}

enum CmapSubtable<'a> {
    Format0 { glyph_ids: &'a [u8] },
    Format4 {
        data: FontData<'a>,
        seg_count: u16,
    },
    Format6 {
        first_code: u16,
        glyph_ids: &'a [otf_types::BigEndian<GlyphId>],
    },
    Format12 {
        data: FontData<'a>,
        num_groups: u32,
    },
    Format13 {
        data: FontData<'a>,
        num_groups: u32,
    },
}

impl<'a> FontRead<'a> for CmapSubtable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format = data.read_at::<u16>(0)?;
        match format {
            0 => {
                let glyph_ids = data.as_bytes().get(6..6 + 256).ok_or(ReadError::OutOfBounds)?;
                Ok(CmapSubtable::Format0 { glyph_ids })
            }
            4 => {
                let seg_count = data.read_at::<u16>(6)? / 2;
                Ok(CmapSubtable::Format4 { data, seg_count })
            }
            6 => {
                let first_code = data.read_at::<u16>(6)?;
                let count = data.read_at::<u16>(8)? as usize;
                let glyph_ids = data.read_array::<GlyphId>(10..10 + count * 2)?;
                Ok(CmapSubtable::Format6 {
                    first_code,
                    glyph_ids,
                })
            }
            12 => {
                let num_groups = data.read_at::<u32>(12)?;
                Ok(CmapSubtable::Format12 { data, num_groups })
            }
            13 => {
                let num_groups = data.read_at::<u32>(12)?;
                Ok(CmapSubtable::Format13 { data, num_groups })
            }
            other => Err(ReadError::InvalidFormat(other)),
        }
    }
}

impl<'a> CmapSubtable<'a> {
    fn lookup(&self, codepoint: u32) -> Option<GlyphId> {
        match self {
            CmapSubtable::Format0 { glyph_ids } => {
                let byte = *glyph_ids.get(codepoint as usize)?;
                (byte != 0).then(|| GlyphId::new(byte as u16))
            }
            CmapSubtable::Format4 { data, seg_count } => {
                format4_lookup(*data, *seg_count, codepoint)
            }
            CmapSubtable::Format6 {
                first_code,
                glyph_ids,
            } => {
                let index = codepoint.checked_sub(*first_code as u32)? as usize;
                let gid = glyph_ids.get(index)?.get();
                (gid != GlyphId::NOTDEF).then_some(gid)
            }
            CmapSubtable::Format12 { data, num_groups } | CmapSubtable::Format13 { data, num_groups } => {
                let is_13 = matches!(self, CmapSubtable::Format13 { .. });
                for i in 0..*num_groups {
                    let rec_off = 16 + i as usize * 12;
                    let start = data.read_at::<u32>(rec_off).ok()?;
                    let end = data.read_at::<u32>(rec_off + 4).ok()?;
                    let glyph_or_base = data.read_at::<u32>(rec_off + 8).ok()?;
                    if codepoint >= start && codepoint <= end {
                        let gid = if is_13 {
                            glyph_or_base
                        } else {
                            glyph_or_base + (codepoint - start)
                        };
                        return (gid != 0).then_some(GlyphId::new(gid as u16));
                    }
                }
                None
            }
        }
    }
}

/// Format-4 lookup: binary search `endCode`, verify against `startCode`,
/// then resolve via `idRangeOffset` indirection or `idDelta`.
fn format4_lookup(data: FontData, seg_count: u16, codepoint: u32) -> Option<GlyphId> {
    if codepoint > 0xFFFF {
        return None;
    }
    let codepoint = codepoint as u16;
    let end_codes_offset = 14;
    let start_codes_offset = end_codes_offset + seg_count as usize * 2 + 2;
    let id_deltas_offset = start_codes_offset + seg_count as usize * 2;
    let id_range_offsets_offset = id_deltas_offset + seg_count as usize * 2;

    for seg in 0..seg_count as usize {
        let end_code = data.read_at::<u16>(end_codes_offset + seg * 2).ok()?;
        if codepoint > end_code {
            continue;
        }
        let start_code = data.read_at::<u16>(start_codes_offset + seg * 2).ok()?;
        if codepoint < start_code {
            return None;
        }
        let id_delta = data.read_at::<i16>(id_deltas_offset + seg * 2).ok()?;
        let id_range_offset = data.read_at::<u16>(id_range_offsets_offset + seg * 2).ok()?;
        if id_range_offset == 0 {
            let gid = (codepoint as i32 + id_delta as i32) as u16;
            return (gid != 0).then_some(GlyphId::new(gid));
        }
        let glyph_index_addr =
            id_range_offsets_offset + seg * 2 + id_range_offset as usize + 2 * (codepoint - start_code) as usize;
        let raw_gid = data.read_at::<u16>(glyph_index_addr).ok()?;
        if raw_gid == 0 {
            return None;
        }
        let gid = ((raw_gid as i32 + id_delta as i32) & 0xFFFF) as u16;
        return (gid != 0).then_some(GlyphId::new(gid));
    }
    None
}

enum VariationLookup {
    Variant(GlyphId),
    UseDefault,
    NotFound,
}

struct VariationSelectorTable<'a> {
    data: FontData<'a>,
    num_records: u32,
}

impl<'a> FontRead<'a> for VariationSelectorTable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let num_records = data.read_at::<u32>(0)?;
        Ok(VariationSelectorTable { data, num_records })
    }
}

impl<'a> VariationSelectorTable<'a> {
    fn lookup(&self, codepoint: u32, selector: u32) -> VariationLookup {
        for i in 0..self.num_records {
            let rec_off = 4 + i as usize * 11;
            let Ok(var_selector) = self.data.read_at::<otf_types::Uint24>(rec_off) else {
                continue;
            };
            if var_selector.to_u32() != selector {
                continue;
            }
            let default_uvs_offset = self.data.read_at::<u32>(rec_off + 3).unwrap_or(0);
            let non_default_uvs_offset = self.data.read_at::<u32>(rec_off + 7).unwrap_or(0);
            if non_default_uvs_offset != 0 {
                if let Some(gid) = self.lookup_non_default(non_default_uvs_offset, codepoint) {
                    return VariationLookup::Variant(gid);
                }
            }
            if default_uvs_offset != 0 && self.in_default_uvs(default_uvs_offset, codepoint) {
                return VariationLookup::UseDefault;
            }
            return VariationLookup::NotFound;
        }
        VariationLookup::NotFound
    }

    fn in_default_uvs(&self, offset: u32, codepoint: u32) -> bool {
        let Some(data) = self.data.slice(offset as usize..) else {
            return false;
        };
        let Ok(num_ranges) = data.read_at::<u32>(0) else {
            return false;
        };
        for i in 0..num_ranges {
            let rec_off = 4 + i as usize * 4;
            let Ok(start) = data.read_at::<otf_types::Uint24>(rec_off) else {
                continue;
            };
            let Ok(additional_count) = data.read_at::<u8>(rec_off + 3) else {
                continue;
            };
            let start = start.to_u32();
            if codepoint >= start && codepoint <= start + additional_count as u32 {
                return true;
            }
        }
        false
    }

    fn lookup_non_default(&self, offset: u32, codepoint: u32) -> Option<GlyphId> {
        let data = self.data.slice(offset as usize..)?;
        let num_mappings = data.read_at::<u32>(0).ok()?;
        let mut lo = 0i64;
        let mut hi = num_mappings as i64 - 1;
        while lo <= hi {
            let mid = (lo + hi) / 2;
            let rec_off = 4 + mid as usize * 5;
            let uv = data.read_at::<otf_types::Uint24>(rec_off).ok()?.to_u32();
            if codepoint < uv {
                hi = mid - 1;
            } else if codepoint > uv {
                lo = mid + 1;
            } else {
                let gid = data.read_at::<u16>(rec_off + 3).ok()?;
                return Some(GlyphId::new(gid));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuilder;

    #[test]
    fn format4_id_range_offset_indirection() {
        // One segment [0x41, 0x42], id_delta=0, id_range_offset pointing into
        // the trailing glyph-id array, matching the spec's worked example.
        let seg_count = 1u16;
        let mut b = BeBuilder::new();
        b.u16(4).u16(0).u16(0); // format, length (unused), language
        b.u16(seg_count * 2).u16(0).u16(0).u16(0); // seg_count_x2, search params
        b.u16(0x42); // end_codes[0]
        b.u16(0); // padding
        b.u16(0x41); // start_codes[0]
        b.i16(0); // id_deltas[0]
        b.u16(4); // id_range_offsets[0]: 4 bytes forward from its own slot
        b.u16(0x0150); // glyph_id_array[0] (for 0x41)
        b.u16(0x0000); // glyph_id_array[1] (for 0x42)
        let bytes = b.build();
        let subtable = CmapSubtable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(subtable.lookup(0x41), Some(GlyphId::new(0x0150)));
        assert_eq!(subtable.lookup(0x42), None);
    }

    #[test]
    fn priority_prefers_windows_unicode_bmp() {
        assert!(subtable_priority(3, 1) > subtable_priority(1, 0));
        assert!(subtable_priority(3, 10) > subtable_priority(3, 1));
        assert_eq!(subtable_priority(9, 9), 0);
    }
}
