//! GPOS subtables (§4.5): closed, tagged-enum dispatch per lookup type.
//!
//! Subtables here expose pure per-coverage/per-class queries; the stream
//! walk (scanning left past skipped glyphs for mark attachment, chaining
//! cursive anchors, picking the next unskipped glyph for pair positioning)
//! is the shaping pipeline's job, since it alone owns the glyph stream and
//! the cursive/mark attachment bookkeeping in `GlyphPosition`.

use otf_types::{GlyphId, Offset16, Offset32};

use super::layout::{Anchor, ChainedSequenceContext, CoverageTable, SequenceContext};
use super::value_record::{Value, ValueFormat};
use crate::font_data::FontData;
use crate::offset::{Offset, ResolveOffset};
use crate::read::{FontRead, ReadError};

pub enum PositionSubtables<'a> {
    Single(SinglePos<'a>),
    Pair(PairPos<'a>),
    Cursive(CursivePos<'a>),
    MarkToBase(MarkBasePos<'a>),
    MarkToLigature(MarkLigaturePos<'a>),
    MarkToMark(MarkMarkPos<'a>),
    Context(SequenceContext<'a>),
    ChainContext(ChainedSequenceContext<'a>),
}

impl<'a> PositionSubtables<'a> {
    pub fn read(lookup_type: u16, data: FontData<'a>, offset: Offset16) -> Result<Self, ReadError> {
        if lookup_type == 9 {
            let ext_data: FontData = offset.resolve(data)?;
            let actual_type = ext_data.read_at::<u16>(2)?;
            let ext_offset = ext_data.read_at::<Offset32>(4)?;
            let inner: FontData = ext_offset.resolve(ext_data)?;
            return Self::read_concrete(actual_type, inner);
        }
        let subtable: FontData = offset.resolve(data)?;
        Self::read_concrete(lookup_type, subtable)
    }

    fn read_concrete(lookup_type: u16, data: FontData<'a>) -> Result<Self, ReadError> {
        Ok(match lookup_type {
            1 => PositionSubtables::Single(SinglePos::read(data)?),
            2 => PositionSubtables::Pair(PairPos::read(data)?),
            3 => PositionSubtables::Cursive(CursivePos::read(data)?),
            4 => PositionSubtables::MarkToBase(MarkBasePos::read(data)?),
            5 => PositionSubtables::MarkToLigature(MarkLigaturePos::read(data)?),
            6 => PositionSubtables::MarkToMark(MarkMarkPos::read(data)?),
            7 => PositionSubtables::Context(SequenceContext::read(data)?),
            8 => PositionSubtables::ChainContext(ChainedSequenceContext::read(data)?),
            other => return Err(ReadError::InvalidFormat(other)),
        })
    }
}

#[derive(Clone, Copy)]
pub enum SinglePos<'a> {
    Format1 {
        coverage: CoverageTable<'a>,
        format: ValueFormat,
        data: FontData<'a>,
    },
    Format2 {
        coverage: CoverageTable<'a>,
        format: ValueFormat,
        data: FontData<'a>,
    },
}

impl<'a> FontRead<'a> for SinglePos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let fmt = data.read_at::<u16>(0)?;
        let coverage_offset: Offset16 = data.read_at(2)?;
        let coverage = coverage_offset.resolve(data)?;
        let format = ValueFormat::from_bits(data.read_at::<u16>(4)?);
        match fmt {
            1 => Ok(SinglePos::Format1 {
                coverage,
                format,
                data,
            }),
            2 => Ok(SinglePos::Format2 {
                coverage,
                format,
                data,
            }),
            other => Err(ReadError::InvalidFormat(other)),
        }
    }
}

impl<'a> SinglePos<'a> {
    pub fn value_for(&self, glyph: GlyphId) -> Option<Value> {
        match self {
            SinglePos::Format1 {
                coverage,
                format,
                data,
            } => {
                coverage.coverage_index(glyph)?;
                let (value, _) = Value::read(*data, 6, *format).ok()?;
                Some(value)
            }
            SinglePos::Format2 {
                coverage,
                format,
                data,
            } => {
                let index = coverage.coverage_index(glyph)?;
                let record_len = format.record_byte_len();
                let (value, _) = Value::read(*data, 6 + index as usize * record_len, *format).ok()?;
                Some(value)
            }
        }
    }
}

#[derive(Clone, Copy)]
pub enum PairPos<'a> {
    Format1 {
        coverage: CoverageTable<'a>,
        value_format1: ValueFormat,
        value_format2: ValueFormat,
        data: FontData<'a>,
    },
    Format2 {
        coverage: CoverageTable<'a>,
        class_def1: super::layout::ClassDef<'a>,
        class_def2: super::layout::ClassDef<'a>,
        value_format1: ValueFormat,
        value_format2: ValueFormat,
        class1_count: u16,
        class2_count: u16,
        data: FontData<'a>,
    },
}

impl<'a> FontRead<'a> for PairPos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let fmt = data.read_at::<u16>(0)?;
        let coverage_offset: Offset16 = data.read_at(2)?;
        let coverage = coverage_offset.resolve(data)?;
        let value_format1 = ValueFormat::from_bits(data.read_at::<u16>(4)?);
        let value_format2 = ValueFormat::from_bits(data.read_at::<u16>(6)?);
        match fmt {
            1 => Ok(PairPos::Format1 {
                coverage,
                value_format1,
                value_format2,
                data,
            }),
            2 => {
                let class_def1_offset: Offset16 = data.read_at(8)?;
                let class_def1 = class_def1_offset.resolve(data)?;
                let class_def2_offset: Offset16 = data.read_at(10)?;
                let class_def2 = class_def2_offset.resolve(data)?;
                let class1_count = data.read_at::<u16>(12)?;
                let class2_count = data.read_at::<u16>(14)?;
                Ok(PairPos::Format2 {
                    coverage,
                    class_def1,
                    class_def2,
                    value_format1,
                    value_format2,
                    class1_count,
                    class2_count,
                    data,
                })
            }
            other => Err(ReadError::InvalidFormat(other)),
        }
    }
}

impl<'a> PairPos<'a> {
    /// Values for a covered `first` glyph followed by `second`, or `None`
    /// if the pair has no record.
    pub fn values_for(&self, first: GlyphId, second: GlyphId) -> Option<(Value, Value)> {
        match self {
            PairPos::Format1 {
                coverage,
                value_format1,
                value_format2,
                data,
            } => {
                let index = coverage.coverage_index(first)?;
                let set_count = data.read_at::<u16>(8).ok()?;
                if index as u16 >= set_count {
                    return None;
                }
                let set_offset: Offset16 = data.read_at(10 + index as usize * 2).ok()?;
                let set: FontData = set_offset.resolve(*data).ok()?;
                let pair_count = set.read_at::<u16>(0).ok()?;
                let rec_len = 2 + value_format1.record_byte_len() + value_format2.record_byte_len();
                for p in 0..pair_count {
                    let rec_off = 2 + p as usize * rec_len;
                    let second_glyph: GlyphId = set.read_at(rec_off).ok()?;
                    if second_glyph != second {
                        continue;
                    }
                    let (v1, next) = Value::read(set, rec_off + 2, *value_format1).ok()?;
                    let (v2, _) = Value::read(set, next, *value_format2).ok()?;
                    return Some((v1, v2));
                }
                None
            }
            PairPos::Format2 {
                coverage,
                class_def1,
                class_def2,
                value_format1,
                value_format2,
                class2_count,
                data,
                ..
            } => {
                coverage.coverage_index(first)?;
                let c1 = class_def1.class(first);
                let c2 = class_def2.class(second);
                let rec_len = value_format1.record_byte_len() + value_format2.record_byte_len();
                let row_off = 16 + (c1 as usize * *class2_count as usize + c2 as usize) * rec_len;
                let (v1, next) = Value::read(*data, row_off, *value_format1).ok()?;
                let (v2, _) = Value::read(*data, next, *value_format2).ok()?;
                Some((v1, v2))
            }
        }
    }
}

#[derive(Clone, Copy)]
pub struct CursivePos<'a> {
    coverage: CoverageTable<'a>,
    data: FontData<'a>,
}

impl<'a> FontRead<'a> for CursivePos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let coverage_offset: Offset16 = data.read_at(2)?;
        let coverage = coverage_offset.resolve(data)?;
        Ok(CursivePos { coverage, data })
    }
}

impl<'a> CursivePos<'a> {
    /// `(entry_anchor, exit_anchor)` for `glyph`, if covered.
    pub fn anchors_for(&self, glyph: GlyphId) -> Option<(Option<Anchor>, Option<Anchor>)> {
        let index = self.coverage.coverage_index(glyph)?;
        let rec_off = 6 + index as usize * 4;
        let entry_offset: Offset16 = self.data.read_at(rec_off).ok()?;
        let exit_offset: Offset16 = self.data.read_at(rec_off + 2).ok()?;
        let entry = entry_offset.non_null().and_then(|_| entry_offset.resolve(self.data).ok());
        let exit = exit_offset.non_null().and_then(|_| exit_offset.resolve(self.data).ok());
        Some((entry, exit))
    }
}

/// `MarkArray`: per-mark-glyph class and anchor, shared by mark-to-base,
/// mark-to-ligature, and mark-to-mark.
#[derive(Clone, Copy)]
struct MarkArray<'a> {
    data: FontData<'a>,
}

impl<'a> MarkArray<'a> {
    fn get(&self, mark_index: u32) -> Option<(u16, Anchor)> {
        let count = self.data.read_at::<u16>(0).ok()?;
        if mark_index >= count as u32 {
            return None;
        }
        let rec_off = 2 + mark_index as usize * 4;
        let class = self.data.read_at::<u16>(rec_off).ok()?;
        let anchor_offset: Offset16 = self.data.read_at(rec_off + 2).ok()?;
        let anchor: Anchor = anchor_offset.resolve(self.data).ok()?;
        Some((class, anchor))
    }
}

#[derive(Clone, Copy)]
pub struct MarkBasePos<'a> {
    mark_coverage: CoverageTable<'a>,
    base_coverage: CoverageTable<'a>,
    class_count: u16,
    mark_array: MarkArray<'a>,
    base_array_data: FontData<'a>,
}

impl<'a> FontRead<'a> for MarkBasePos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mark_coverage_offset: Offset16 = data.read_at(2)?;
        let mark_coverage = mark_coverage_offset.resolve(data)?;
        let base_coverage_offset: Offset16 = data.read_at(4)?;
        let base_coverage = base_coverage_offset.resolve(data)?;
        let class_count = data.read_at::<u16>(6)?;
        let mark_array_offset: Offset16 = data.read_at(8)?;
        let mark_array_data: FontData = mark_array_offset.resolve(data)?;
        let base_array_offset: Offset16 = data.read_at(10)?;
        let base_array_data: FontData = base_array_offset.resolve(data)?;
        Ok(MarkBasePos {
            mark_coverage,
            base_coverage,
            class_count,
            mark_array: MarkArray { data: mark_array_data },
            base_array_data,
        })
    }
}

impl<'a> MarkBasePos<'a> {
    pub fn mark_coverage_index(&self, glyph: GlyphId) -> Option<u32> {
        self.mark_coverage.coverage_index(glyph)
    }

    pub fn base_coverage_index(&self, glyph: GlyphId) -> Option<u32> {
        self.base_coverage.coverage_index(glyph)
    }

    pub fn mark_anchor(&self, mark_index: u32) -> Option<(u16, Anchor)> {
        self.mark_array.get(mark_index)
    }

    pub fn base_anchor(&self, base_index: u32, mark_class: u16) -> Option<Anchor> {
        if mark_class >= self.class_count {
            return None;
        }
        let count = self.base_array_data.read_at::<u16>(0).ok()?;
        if base_index >= count as u32 {
            return None;
        }
        let row_off = 2 + (base_index as usize * self.class_count as usize + mark_class as usize) * 2;
        let anchor_offset: Offset16 = self.base_array_data.read_at(row_off).ok()?;
        anchor_offset.resolve(self.base_array_data).ok()
    }
}

#[derive(Clone, Copy)]
pub struct MarkLigaturePos<'a> {
    mark_coverage: CoverageTable<'a>,
    ligature_coverage: CoverageTable<'a>,
    class_count: u16,
    mark_array: MarkArray<'a>,
    ligature_array_data: FontData<'a>,
}

impl<'a> FontRead<'a> for MarkLigaturePos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mark_coverage_offset: Offset16 = data.read_at(2)?;
        let mark_coverage = mark_coverage_offset.resolve(data)?;
        let ligature_coverage_offset: Offset16 = data.read_at(4)?;
        let ligature_coverage = ligature_coverage_offset.resolve(data)?;
        let class_count = data.read_at::<u16>(6)?;
        let mark_array_offset: Offset16 = data.read_at(8)?;
        let mark_array_data: FontData = mark_array_offset.resolve(data)?;
        let ligature_array_offset: Offset16 = data.read_at(10)?;
        let ligature_array_data: FontData = ligature_array_offset.resolve(data)?;
        Ok(MarkLigaturePos {
            mark_coverage,
            ligature_coverage,
            class_count,
            mark_array: MarkArray { data: mark_array_data },
            ligature_array_data,
        })
    }
}

impl<'a> MarkLigaturePos<'a> {
    pub fn mark_coverage_index(&self, glyph: GlyphId) -> Option<u32> {
        self.mark_coverage.coverage_index(glyph)
    }

    pub fn ligature_coverage_index(&self, glyph: GlyphId) -> Option<u32> {
        self.ligature_coverage.coverage_index(glyph)
    }

    pub fn mark_anchor(&self, mark_index: u32) -> Option<(u16, Anchor)> {
        self.mark_array.get(mark_index)
    }

    /// Anchor for ligature `ligature_index`'s component `component_index`
    /// and the mark's class. Per this engine's scope, callers default
    /// `component_index` to the ligature's last component.
    pub fn ligature_anchor(&self, ligature_index: u32, component_index: u32, mark_class: u16) -> Option<Anchor> {
        if mark_class >= self.class_count {
            return None;
        }
        let lig_count = self.ligature_array_data.read_at::<u16>(0).ok()?;
        if ligature_index >= lig_count as u32 {
            return None;
        }
        let attach_offset: Offset16 = self
            .ligature_array_data
            .read_at(2 + ligature_index as usize * 2)
            .ok()?;
        let attach: FontData = attach_offset.resolve(self.ligature_array_data).ok()?;
        let component_count = attach.read_at::<u16>(0).ok()?;
        if component_index >= component_count as u32 {
            return None;
        }
        let row_off = 2 + (component_index as usize * self.class_count as usize + mark_class as usize) * 2;
        let anchor_offset: Offset16 = attach.read_at(row_off).ok()?;
        anchor_offset.resolve(attach).ok()
    }

    /// The last valid component index for `ligature_index` (§4.5's default
    /// component-index rule).
    pub fn last_component_index(&self, ligature_index: u32) -> Option<u32> {
        let lig_count = self.ligature_array_data.read_at::<u16>(0).ok()?;
        if ligature_index >= lig_count as u32 {
            return None;
        }
        let attach_offset: Offset16 = self
            .ligature_array_data
            .read_at(2 + ligature_index as usize * 2)
            .ok()?;
        let attach: FontData = attach_offset.resolve(self.ligature_array_data).ok()?;
        let component_count = attach.read_at::<u16>(0).ok()?;
        (component_count > 0).then(|| component_count as u32 - 1)
    }
}

#[derive(Clone, Copy)]
pub struct MarkMarkPos<'a> {
    mark1_coverage: CoverageTable<'a>,
    mark2_coverage: CoverageTable<'a>,
    class_count: u16,
    mark1_array: MarkArray<'a>,
    mark2_array_data: FontData<'a>,
}

impl<'a> FontRead<'a> for MarkMarkPos<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mark1_coverage_offset: Offset16 = data.read_at(2)?;
        let mark1_coverage = mark1_coverage_offset.resolve(data)?;
        let mark2_coverage_offset: Offset16 = data.read_at(4)?;
        let mark2_coverage = mark2_coverage_offset.resolve(data)?;
        let class_count = data.read_at::<u16>(6)?;
        let mark1_array_offset: Offset16 = data.read_at(8)?;
        let mark1_array_data: FontData = mark1_array_offset.resolve(data)?;
        let mark2_array_offset: Offset16 = data.read_at(10)?;
        let mark2_array_data: FontData = mark2_array_offset.resolve(data)?;
        Ok(MarkMarkPos {
            mark1_coverage,
            mark2_coverage,
            class_count,
            mark1_array: MarkArray {
                data: mark1_array_data,
            },
            mark2_array_data,
        })
    }
}

impl<'a> MarkMarkPos<'a> {
    pub fn mark1_coverage_index(&self, glyph: GlyphId) -> Option<u32> {
        self.mark1_coverage.coverage_index(glyph)
    }

    pub fn mark2_coverage_index(&self, glyph: GlyphId) -> Option<u32> {
        self.mark2_coverage.coverage_index(glyph)
    }

    pub fn mark1_anchor(&self, mark_index: u32) -> Option<(u16, Anchor)> {
        self.mark1_array.get(mark_index)
    }

    pub fn mark2_anchor(&self, mark2_index: u32, mark_class: u16) -> Option<Anchor> {
        if mark_class >= self.class_count {
            return None;
        }
        let count = self.mark2_array_data.read_at::<u16>(0).ok()?;
        if mark2_index >= count as u32 {
            return None;
        }
        let row_off = 2 + (mark2_index as usize * self.class_count as usize + mark_class as usize) * 2;
        let anchor_offset: Offset16 = self.mark2_array_data.read_at(row_off).ok()?;
        anchor_offset.resolve(self.mark2_array_data).ok()
    }
}
