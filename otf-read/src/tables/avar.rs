//! The `avar` table: a piecewise-linear remap applied to already-normalized
//! `fvar` coordinates, one segment map per axis (§4.7).

use otf_types::F2Dot14;

use crate::font_data::FontData;
use crate::read::{FontRead, ReadError};

#[derive(Clone, Copy)]
pub struct Avar<'a> {
    data: FontData<'a>,
    axis_count: u16,
}

impl<'a> FontRead<'a> for Avar<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let axis_count = data.read_at::<u16>(6)?;
        Ok(Avar { data, axis_count })
    }
}

impl<'a> Avar<'a> {
    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    fn segment_map(&self, axis_index: u16) -> Result<SegmentMap<'a>, ReadError> {
        let mut offset = 8usize;
        for _ in 0..axis_index {
            let count = self.data.read_at::<u16>(offset)? as usize;
            offset += 2 + count * 4;
        }
        let pair_count = self.data.read_at::<u16>(offset)? as usize;
        let pairs = self.data.read_array::<F2Dot14>(offset + 2..offset + 2 + pair_count * 4)?;
        Ok(SegmentMap { pairs })
    }

    /// Apply this table's segment maps to a fully `fvar`-normalized
    /// coordinate vector, in place.
    pub fn apply(&self, coords: &mut [F2Dot14]) {
        for (axis, coord) in coords.iter_mut().enumerate() {
            if axis >= self.axis_count as usize {
                break;
            }
            if let Ok(map) = self.segment_map(axis as u16) {
                *coord = map.apply(*coord);
            }
        }
    }
}

struct SegmentMap<'a> {
    pairs: &'a [otf_types::BigEndian<F2Dot14>],
}

impl<'a> SegmentMap<'a> {
    /// Piecewise-linear interpolation between consecutive `(from, to)` pairs.
    fn apply(&self, value: F2Dot14) -> F2Dot14 {
        if self.pairs.is_empty() {
            return value;
        }
        let from_to = |i: usize| {
            (
                self.pairs[i * 2].get(),
                self.pairs[i * 2 + 1].get(),
            )
        };
        let n = self.pairs.len() / 2;
        for i in 0..n.saturating_sub(1) {
            let (from0, to0) = from_to(i);
            let (from1, to1) = from_to(i + 1);
            if value >= from0 && value <= from1 {
                if from1 == from0 {
                    return to0;
                }
                let t = (value.to_fixed() - from0.to_fixed())
                    .mul_div(otf_types::Fixed::ONE, (from1.to_fixed() - from0.to_fixed()));
                let result = to0.to_fixed() + t.mul_div(to1.to_fixed() - to0.to_fixed(), otf_types::Fixed::ONE);
                return result.to_f2dot14();
            }
        }
        if n > 0 {
            let (first_from, first_to) = from_to(0);
            let (last_from, last_to) = from_to(n - 1);
            if value <= first_from {
                return first_to;
            }
            if value >= last_from {
                return last_to;
            }
        }
        value
    }
}
