//! The `head` table: just the one field this engine needs, `unitsPerEm`.

use crate::font_data::FontData;
use crate::read::{FontRead, ReadError};

#[derive(Clone, Copy)]
pub struct Head {
    pub units_per_em: u16,
}

impl<'a> FontRead<'a> for Head {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        Ok(Head {
            units_per_em: data.read_at::<u16>(18)?,
        })
    }
}
