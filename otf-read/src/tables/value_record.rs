//! GPOS `ValueRecord`: a variable-length record whose present fields depend
//! on a sibling `ValueFormat` bitmask, so it's parsed with an explicit
//! cursor rather than read as a fixed-size type.
//!
//! Per this engine's scope, device/variation-index offsets are read and
//! skipped but never resolved against an item variation store (see
//! `tables::layout`).

use crate::font_data::FontData;
use crate::read::ReadError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValueFormat(u16);

impl ValueFormat {
    pub const X_PLACEMENT: ValueFormat = ValueFormat(0x0001);
    pub const Y_PLACEMENT: ValueFormat = ValueFormat(0x0002);
    pub const X_ADVANCE: ValueFormat = ValueFormat(0x0004);
    pub const Y_ADVANCE: ValueFormat = ValueFormat(0x0008);
    pub const X_PLACEMENT_DEVICE: ValueFormat = ValueFormat(0x0010);
    pub const Y_PLACEMENT_DEVICE: ValueFormat = ValueFormat(0x0020);
    pub const X_ADVANCE_DEVICE: ValueFormat = ValueFormat(0x0040);
    pub const Y_ADVANCE_DEVICE: ValueFormat = ValueFormat(0x0080);

    pub fn from_bits(bits: u16) -> Self {
        ValueFormat(bits)
    }

    fn contains(self, flag: ValueFormat) -> bool {
        self.0 & flag.0 != 0
    }

    /// Total byte length of a `ValueRecord` with this format.
    pub fn record_byte_len(self) -> usize {
        2 * self.0.count_ones() as usize
    }
}

/// A fully resolved positioning adjustment: x/y placement and x/y advance,
/// in font design units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Value {
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
}

impl Value {
    /// Parse a `ValueRecord` at `offset` within `data`, per `format`, and
    /// return the value plus the offset just past it.
    pub fn read(data: FontData, offset: usize, format: ValueFormat) -> Result<(Self, usize), ReadError> {
        let mut pos = offset;
        let mut value = Value::default();
        let mut next_i16 = |data: FontData, pos: &mut usize| -> Result<i16, ReadError> {
            let v = data.read_at::<i16>(*pos)?;
            *pos += 2;
            Ok(v)
        };
        let mut skip_u16 = |pos: &mut usize| {
            *pos += 2;
        };
        if format.contains(ValueFormat::X_PLACEMENT) {
            value.x_placement = next_i16(data, &mut pos)?;
        }
        if format.contains(ValueFormat::Y_PLACEMENT) {
            value.y_placement = next_i16(data, &mut pos)?;
        }
        if format.contains(ValueFormat::X_ADVANCE) {
            value.x_advance = next_i16(data, &mut pos)?;
        }
        if format.contains(ValueFormat::Y_ADVANCE) {
            value.y_advance = next_i16(data, &mut pos)?;
        }
        if format.contains(ValueFormat::X_PLACEMENT_DEVICE) {
            skip_u16(&mut pos);
        }
        if format.contains(ValueFormat::Y_PLACEMENT_DEVICE) {
            skip_u16(&mut pos);
        }
        if format.contains(ValueFormat::X_ADVANCE_DEVICE) {
            skip_u16(&mut pos);
        }
        if format.contains(ValueFormat::Y_ADVANCE_DEVICE) {
            skip_u16(&mut pos);
        }
        Ok((value, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuilder;

    #[test]
    fn sparse_format_reads_only_present_fields() {
        let format = ValueFormat::from_bits(0x0001 | 0x0004);
        let mut b = BeBuilder::new();
        b.i16(-10).i16(120);
        let bytes = b.build();
        let (value, end) = Value::read(FontData::new(&bytes), 0, format).unwrap();
        assert_eq!(value.x_placement, -10);
        assert_eq!(value.x_advance, 120);
        assert_eq!(value.y_placement, 0);
        assert_eq!(end, 4);
    }
}
