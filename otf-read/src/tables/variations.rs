//! The item variation store: per-axis region scalars and delta-set lookup,
//! shared by `HVAR` (and, upstream, by GDEF/GPOS device tables that this
//! engine doesn't resolve -- see `tables::value_record`).

use otf_types::{BigEndian, F2Dot14, Fixed, Offset32};

use crate::font_data::FontData;
use crate::offset::{Offset, ResolveOffset};
use crate::read::{FontRead, ReadError};

/// One `(outer, inner)` pair identifying a row in the variation store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeltaSetIndex {
    pub outer: u16,
    pub inner: u16,
}

/// The `ItemVariationStore` subtable.
#[derive(Clone, Copy)]
pub struct ItemVariationStore<'a> {
    data: FontData<'a>,
    variation_region_list: VariationRegionList<'a>,
    item_variation_data_offsets: &'a [BigEndian<Offset32>],
}

impl<'a> FontRead<'a> for ItemVariationStore<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let _format = data.read_at::<u16>(0)?;
        let region_list_offset = data.read_at::<Offset32>(2)?;
        let variation_region_list: VariationRegionList = region_list_offset.resolve(data)?;
        let count = data.read_at::<u16>(6)? as usize;
        let item_variation_data_offsets = data.read_array::<Offset32>(8..8 + count * 4)?;
        Ok(ItemVariationStore {
            data,
            variation_region_list,
            item_variation_data_offsets,
        })
    }
}

impl<'a> ItemVariationStore<'a> {
    fn item_variation_data(&self, outer: u16) -> Result<ItemVariationData<'a>, ReadError> {
        let offset = self
            .item_variation_data_offsets
            .get(outer as usize)
            .ok_or(ReadError::OutOfBounds)?
            .get();
        offset.resolve(self.data)
    }

    /// Compute the scalar-weighted, rounded delta at `index` for the given
    /// normalized instance coordinates (one `F2Dot14` per font axis).
    pub fn compute_delta(&self, index: DeltaSetIndex, coords: &[F2Dot14]) -> Result<i32, ReadError> {
        let item_data = self.item_variation_data(index.outer)?;
        let deltas = item_data.delta_set(index.inner)?;
        let mut accumulator: i64 = 0;
        for (region_index, delta) in item_data.region_indices.iter().zip(deltas) {
            let scalar = self
                .variation_region_list
                .compute_scalar(region_index.get(), coords);
            if scalar == Fixed::ZERO {
                continue;
            }
            accumulator += (scalar.to_bits() as i64) * (delta as i64);
        }
        // Fixed-point (16.16) multiply, rounded half away from zero.
        let sign = accumulator.signum();
        Ok((sign * ((accumulator.abs() + 0x8000) >> 16)) as i32)
    }
}

#[derive(Clone, Copy)]
struct VariationRegionList<'a> {
    axis_count: u16,
    region_count: u16,
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for VariationRegionList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let axis_count = data.read_at::<u16>(0)?;
        let region_count = data.read_at::<u16>(2)?;
        Ok(VariationRegionList {
            axis_count,
            region_count,
            data,
        })
    }
}

impl<'a> VariationRegionList<'a> {
    /// Evaluate region `region_index`'s piecewise-linear tent function at
    /// `coords`, multiplying per-axis factors together (§4.8).
    fn compute_scalar(&self, region_index: u16, coords: &[F2Dot14]) -> Fixed {
        if region_index >= self.region_count {
            return Fixed::ZERO;
        }
        let region_offset = 4 + region_index as usize * self.axis_count as usize * 6;
        let mut scalar = Fixed::ONE;
        for axis in 0..self.axis_count as usize {
            let axis_offset = region_offset + axis * 6;
            let start = match self.data.read_at::<F2Dot14>(axis_offset) {
                Ok(v) => v,
                Err(_) => return Fixed::ZERO,
            };
            let peak = match self.data.read_at::<F2Dot14>(axis_offset + 2) {
                Ok(v) => v,
                Err(_) => return Fixed::ZERO,
            };
            let end = match self.data.read_at::<F2Dot14>(axis_offset + 4) {
                Ok(v) => v,
                Err(_) => return Fixed::ZERO,
            };
            let coord = coords.get(axis).copied().unwrap_or(F2Dot14::ZERO);
            let factor = region_axis_scalar(start, peak, end, coord);
            if factor == Fixed::ZERO {
                return Fixed::ZERO;
            }
            scalar = scalar.mul_div(factor, Fixed::ONE);
        }
        scalar
    }
}

/// The per-axis tent function from the OpenType variations spec: zero
/// outside `[start, end]`, one at `peak`, linear in between. Malformed or
/// cross-default regions (`start < 0 < end` with a non-zero peak) are
/// treated as neutral (factor 1), matching the spec's stated fallback.
fn region_axis_scalar(start: F2Dot14, peak: F2Dot14, end: F2Dot14, coord: F2Dot14) -> Fixed {
    let (start, peak, end, coord) = (
        start.to_fixed(),
        peak.to_fixed(),
        end.to_fixed(),
        coord.to_fixed(),
    );
    if peak == Fixed::ZERO || coord == peak {
        return Fixed::ONE;
    }
    if coord == Fixed::ZERO {
        return Fixed::ZERO;
    }
    if start > peak || peak > end {
        return Fixed::ONE;
    }
    if start < Fixed::ZERO && end > Fixed::ZERO {
        return Fixed::ONE;
    }
    if coord <= start || coord >= end {
        return Fixed::ZERO;
    }
    if coord < peak {
        (coord - start).mul_div(Fixed::ONE, peak - start)
    } else {
        (end - coord).mul_div(Fixed::ONE, end - peak)
    }
}

#[derive(Clone, Copy)]
struct ItemVariationData<'a> {
    item_count: u16,
    word_delta_count: u16,
    region_indices: &'a [BigEndian<u16>],
    delta_bytes: FontData<'a>,
}

impl<'a> FontRead<'a> for ItemVariationData<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let item_count = data.read_at::<u16>(0)?;
        let word_delta_count = data.read_at::<u16>(2)?;
        let region_index_count = data.read_at::<u16>(4)? as usize;
        let region_indices = data.read_array::<u16>(6..6 + region_index_count * 2)?;
        let delta_bytes = data.split_off(6 + region_index_count * 2).unwrap_or(FontData::EMPTY);
        Ok(ItemVariationData {
            item_count,
            word_delta_count,
            region_indices,
            delta_bytes,
        })
    }
}

impl<'a> ItemVariationData<'a> {
    fn delta_set(&self, inner: u16) -> Result<Vec<i32>, ReadError> {
        if inner >= self.item_count {
            return Err(ReadError::OutOfBounds);
        }
        let long_words = self.word_delta_count & 0x8000 != 0;
        let word_count = (self.word_delta_count & 0x7FFF) as usize;
        let region_count = self.region_indices.len();
        let (word_size, short_size) = if long_words { (4, 2) } else { (2, 1) };
        let row_len = word_count * word_size + region_count.saturating_sub(word_count) * short_size;
        let row_start = inner as usize * row_len;
        let mut out = Vec::with_capacity(region_count);
        let mut pos = row_start;
        for i in 0..region_count {
            let is_word = i < word_count;
            let value = if is_word && long_words {
                self.delta_bytes.read_at::<i32>(pos)?
            } else if is_word {
                self.delta_bytes.read_at::<i16>(pos)? as i32
            } else if long_words {
                self.delta_bytes.read_at::<i16>(pos)? as i32
            } else {
                self.delta_bytes.read_at::<i8>(pos)? as i32
            };
            pos += if is_word { word_size } else { short_size };
            out.push(value);
        }
        Ok(out)
    }
}

/// `DeltaSetIndexMap`: maps a glyph ID (for `HVAR`/`VVAR`) or value-table
/// index (for device/variation-index tables, not resolved here) to a
/// `DeltaSetIndex`.
#[derive(Clone, Copy)]
pub struct DeltaSetIndexMap<'a> {
    data: FontData<'a>,
    entry_format: u8,
    map_count: u32,
    entries_offset: usize,
}

impl<'a> FontRead<'a> for DeltaSetIndexMap<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format = data.read_at::<u8>(0)?;
        let entry_format = data.read_at::<u8>(1)?;
        let (map_count, entries_offset) = match format {
            0 => (data.read_at::<u16>(2)? as u32, 4),
            1 => (data.read_at::<u32>(2)?, 6),
            other => return Err(ReadError::InvalidFormat(other as u16)),
        };
        Ok(DeltaSetIndexMap {
            data,
            entry_format,
            map_count,
            entries_offset,
        })
    }
}

impl<'a> DeltaSetIndexMap<'a> {
    pub fn len(&self) -> u32 {
        self.map_count
    }

    pub fn is_empty(&self) -> bool {
        self.map_count == 0
    }

    pub fn get(&self, index: u32) -> Result<DeltaSetIndex, ReadError> {
        // Per spec, an index past the end of the map clamps to the last entry.
        let clamped = index.min(self.map_count.saturating_sub(1));
        let entry_size = ((self.entry_format & 0x30) >> 4) as usize + 1;
        let bit_count = (self.entry_format & 0x0F) as u32 + 1;
        let offset = self.entries_offset + clamped as usize * entry_size;
        let mut raw: u32 = 0;
        for i in 0..entry_size {
            let byte = self.data.read_at::<u8>(offset + i)?;
            raw = (raw << 8) | byte as u32;
        }
        let outer = raw >> bit_count;
        let inner = raw & ((1u32 << bit_count) - 1);
        Ok(DeltaSetIndex {
            outer: outer as u16,
            inner: inner as u16,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuilder;

    #[test]
    fn single_axis_region_scalar_is_tent_shaped() {
        let start = F2Dot14::from_f64(0.0);
        let peak = F2Dot14::from_f64(1.0);
        let end = F2Dot14::from_f64(1.0);
        let half = F2Dot14::from_f64(0.5);
        let scalar = region_axis_scalar(start, peak, end, half);
        assert!((scalar.to_f64() - 0.5).abs() < 0.001);
        let at_peak = region_axis_scalar(start, peak, end, peak);
        assert_eq!(at_peak, Fixed::ONE);
        let outside = region_axis_scalar(start, peak, end, F2Dot14::from_f64(-0.5));
        assert_eq!(outside, Fixed::ZERO);
    }

    #[test]
    fn delta_set_index_map_format0_decodes_outer_inner() {
        let mut b = BeBuilder::new();
        b.u8(0).u8(0x01); // entry_size=2, bit_count=2
        b.u16(2); // map_count
        b.u16(0b0000_0001_0000_0010); // outer=... depends on bit_count
        b.u16(0);
        let bytes = b.build();
        let map = DeltaSetIndexMap::read(FontData::new(&bytes)).unwrap();
        assert_eq!(map.len(), 2);
        let entry = map.get(0).unwrap();
        let bit_count = 2u32;
        let raw = 0b0000_0001_0000_0010u32;
        assert_eq!(entry.outer, (raw >> bit_count) as u16);
        assert_eq!(entry.inner, (raw & 0b11) as u16);
    }
}
