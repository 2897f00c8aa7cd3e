//! The `hhea` table: horizontal font-wide metrics and the `hmtx` row count.

use crate::font_data::FontData;
use crate::read::{FontRead, ReadError};

#[derive(Clone, Copy)]
pub struct Hhea {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub number_of_h_metrics: u16,
}

impl<'a> FontRead<'a> for Hhea {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        Ok(Hhea {
            ascender: data.read_at::<i16>(4)?,
            descender: data.read_at::<i16>(6)?,
            line_gap: data.read_at::<i16>(8)?,
            number_of_h_metrics: data.read_at::<u16>(34)?,
        })
    }
}
