//! The `maxp` table: just `numGlyphs`, read from either the 0.5 or 1.0 header.

use crate::font_data::FontData;
use crate::read::{FontRead, ReadError};

#[derive(Clone, Copy)]
pub struct Maxp {
    pub num_glyphs: u16,
}

impl<'a> FontRead<'a> for Maxp {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        Ok(Maxp {
            num_glyphs: data.read_at::<u16>(4)?,
        })
    }
}
