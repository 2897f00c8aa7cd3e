//! The `fvar` table: variation axes, named instances, and design-space
//! normalization to `[-1, 1]` per axis (§4.7).

use otf_types::{Fixed, Offset16, Tag};

use crate::font_data::FontData;
use crate::offset::{Offset, ResolveOffset};
use crate::read::{FontRead, ReadError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisRecord {
    pub axis_tag: Tag,
    pub min_value: Fixed,
    pub default_value: Fixed,
    pub max_value: Fixed,
    pub flags: u16,
    pub axis_name_id: u16,
}

#[derive(Clone, Copy)]
pub struct Fvar<'a> {
    data: FontData<'a>,
    axes_array_offset: usize,
    axis_count: u16,
    axis_size: u16,
    instance_count: u16,
    instance_size: u16,
}

impl<'a> FontRead<'a> for Fvar<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let axes_array_offset = data.read_at::<Offset16>(4)?.to_u32() as usize;
        let axis_count = data.read_at::<u16>(8)?;
        let axis_size = data.read_at::<u16>(10)?;
        let instance_count = data.read_at::<u16>(12)?;
        let instance_size = data.read_at::<u16>(14)?;
        Ok(Fvar {
            data,
            axes_array_offset,
            axis_count,
            axis_size,
            instance_count,
            instance_size,
        })
    }
}

impl<'a> Fvar<'a> {
    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    pub fn axis(&self, index: u16) -> Result<AxisRecord, ReadError> {
        if index >= self.axis_count {
            return Err(ReadError::OutOfBounds);
        }
        let offset = self.axes_array_offset + index as usize * self.axis_size as usize;
        Ok(AxisRecord {
            axis_tag: self.data.read_at(offset)?,
            min_value: self.data.read_at(offset + 4)?,
            default_value: self.data.read_at(offset + 8)?,
            max_value: self.data.read_at(offset + 12)?,
            flags: self.data.read_at(offset + 16)?,
            axis_name_id: self.data.read_at(offset + 18)?,
        })
    }

    pub fn axes(&self) -> impl Iterator<Item = AxisRecord> + '_ {
        (0..self.axis_count).filter_map(move |i| self.axis(i).ok())
    }

    pub fn instance_count(&self) -> u16 {
        self.instance_count
    }

    /// Coordinates for named instance `index`, one `Fixed` per axis.
    pub fn instance_coordinates(&self, index: u16) -> Result<Vec<Fixed>, ReadError> {
        if index >= self.instance_count {
            return Err(ReadError::OutOfBounds);
        }
        let instances_offset = self.axes_array_offset + self.axis_count as usize * self.axis_size as usize;
        let offset = instances_offset + index as usize * self.instance_size as usize;
        let coords_offset = offset + 4;
        (0..self.axis_count)
            .map(|axis| self.data.read_at::<Fixed>(coords_offset + axis as usize * 4))
            .collect()
    }

    /// Normalize one design-space coordinate against its axis's min/default/max,
    /// per the piecewise-linear rule in the OpenType variations spec.
    pub fn normalize_axis_value(axis: &AxisRecord, user_value: Fixed) -> Fixed {
        let value = if user_value < axis.min_value {
            axis.min_value
        } else if user_value > axis.max_value {
            axis.max_value
        } else {
            user_value
        };
        if value == axis.default_value {
            Fixed::ZERO
        } else if value < axis.default_value {
            let denom = axis.default_value - axis.min_value;
            if denom == Fixed::ZERO {
                Fixed::ZERO
            } else {
                (value - axis.default_value).mul_div(Fixed::ONE, denom)
            }
        } else {
            let denom = axis.max_value - axis.default_value;
            if denom == Fixed::ZERO {
                Fixed::ZERO
            } else {
                (value - axis.default_value).mul_div(Fixed::ONE, denom)
            }
        }
    }
}
