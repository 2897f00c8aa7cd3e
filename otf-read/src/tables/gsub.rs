//! GSUB subtables (§4.4): closed, tagged-enum dispatch per lookup type, so
//! applying a lookup never goes through a vtable.

use otf_types::{BigEndian, GlyphId, Offset16, Offset32};

use super::layout::{ChainedSequenceContext, CoverageTable, SequenceContext};
use crate::font_data::FontData;
use crate::offset::{Offset, ResolveOffset};
use crate::read::{FontRead, ReadError};

/// The result of applying one GSUB subtable at a cursor position.
pub struct SubstApplied {
    /// How many positions to advance the outer cursor by.
    pub advance: usize,
}

pub enum SubstitutionSubtables<'a> {
    Single(SingleSubst<'a>),
    Multiple(MultipleSubst<'a>),
    Alternate(AlternateSubst<'a>),
    Ligature(LigatureSubst<'a>),
    Context(SequenceContext<'a>),
    ChainContext(ChainedSequenceContext<'a>),
    ReverseChainSingle(ReverseChainSingleSubst<'a>),
}

impl<'a> SubstitutionSubtables<'a> {
    /// Parse the subtable at lookup-relative `offset`, unwrapping an
    /// extension subtable (type 7) if that's what `lookup_type` names.
    pub fn read(lookup_type: u16, data: FontData<'a>, offset: Offset16) -> Result<Self, ReadError> {
        if lookup_type == 7 {
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
            1 => SubstitutionSubtables::Single(SingleSubst::read(data)?),
            2 => SubstitutionSubtables::Multiple(MultipleSubst::read(data)?),
            3 => SubstitutionSubtables::Alternate(AlternateSubst::read(data)?),
            4 => SubstitutionSubtables::Ligature(LigatureSubst::read(data)?),
            5 => SubstitutionSubtables::Context(SequenceContext::read(data)?),
            6 => SubstitutionSubtables::ChainContext(ChainedSequenceContext::read(data)?),
            8 => SubstitutionSubtables::ReverseChainSingle(ReverseChainSingleSubst::read(data)?),
            other => return Err(ReadError::InvalidFormat(other)),
        })
    }
}

#[derive(Clone, Copy)]
pub enum SingleSubst<'a> {
    Format1 {
        coverage: CoverageTable<'a>,
        delta: i16,
    },
    Format2 {
        coverage: CoverageTable<'a>,
        substitutes: &'a [BigEndian<GlyphId>],
    },
}

impl<'a> FontRead<'a> for SingleSubst<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format = data.read_at::<u16>(0)?;
        let coverage_offset: Offset16 = data.read_at(2)?;
        let coverage = coverage_offset.resolve(data)?;
        match format {
            1 => {
                let delta = data.read_at::<i16>(4)?;
                Ok(SingleSubst::Format1 { coverage, delta })
            }
            2 => {
                let count = data.read_at::<u16>(4)? as usize;
                let substitutes = data.read_array::<GlyphId>(6..6 + count * 2)?;
                Ok(SingleSubst::Format2 {
                    coverage,
                    substitutes,
                })
            }
            other => Err(ReadError::InvalidFormat(other)),
        }
    }
}

impl<'a> SingleSubst<'a> {
    /// Replace `glyphs[pos]` in place if covered; reports whether it fired.
    pub fn apply(&self, glyphs: &mut Vec<GlyphId>, pos: usize) -> Option<SubstApplied> {
        match self {
            SingleSubst::Format1 { coverage, delta } => {
                coverage.coverage_index(glyphs[pos])?;
                let raw = (glyphs[pos].to_u16() as i32 + *delta as i32) as u16;
                glyphs[pos] = GlyphId::new(raw);
                Some(SubstApplied { advance: 1 })
            }
            SingleSubst::Format2 {
                coverage,
                substitutes,
            } => {
                let index = coverage.coverage_index(glyphs[pos])?;
                let sub = substitutes.get(index as usize)?.get();
                glyphs[pos] = sub;
                Some(SubstApplied { advance: 1 })
            }
        }
    }
}

#[derive(Clone, Copy)]
pub struct MultipleSubst<'a> {
    data: FontData<'a>,
    coverage: CoverageTable<'a>,
}

impl<'a> FontRead<'a> for MultipleSubst<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let coverage_offset: Offset16 = data.read_at(2)?;
        let coverage = coverage_offset.resolve(data)?;
        Ok(MultipleSubst { data, coverage })
    }
}

impl<'a> MultipleSubst<'a> {
    pub fn apply(&self, glyphs: &mut Vec<GlyphId>, pos: usize) -> Option<SubstApplied> {
        let index = self.coverage.coverage_index(glyphs[pos])?;
        let seq_count = self.data.read_at::<u16>(4).ok()?;
        if index as u16 >= seq_count {
            return None;
        }
        let seq_offset: Offset16 = self.data.read_at(6 + index as usize * 2).ok()?;
        let seq: FontData = seq_offset.resolve(self.data).ok()?;
        let glyph_count = seq.read_at::<u16>(0).ok()? as usize;
        let replacement: Vec<GlyphId> = (0..glyph_count)
            .map(|i| seq.read_at::<GlyphId>(2 + i * 2))
            .collect::<Result<_, _>>()
            .ok()?;
        glyphs.splice(pos..pos + 1, replacement.iter().copied());
        Some(SubstApplied {
            advance: glyph_count,
        })
    }
}

#[derive(Clone, Copy)]
pub struct AlternateSubst<'a> {
    data: FontData<'a>,
    coverage: CoverageTable<'a>,
}

impl<'a> FontRead<'a> for AlternateSubst<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let coverage_offset: Offset16 = data.read_at(2)?;
        let coverage = coverage_offset.resolve(data)?;
        Ok(AlternateSubst { data, coverage })
    }
}

impl<'a> AlternateSubst<'a> {
    /// `feature_value` is the raw feature value from the caller: 1 selects
    /// alternate 0, higher values select `value - 1`, clamped to the last.
    pub fn apply(&self, glyphs: &mut [GlyphId], pos: usize, feature_value: u32) -> Option<SubstApplied> {
        let index = self.coverage.coverage_index(glyphs[pos])?;
        let set_count = self.data.read_at::<u16>(4).ok()?;
        if index as u16 >= set_count {
            return None;
        }
        let set_offset: Offset16 = self.data.read_at(6 + index as usize * 2).ok()?;
        let set: FontData = set_offset.resolve(self.data).ok()?;
        let alt_count = set.read_at::<u16>(0).ok()? as usize;
        if alt_count == 0 {
            return None;
        }
        let wanted = feature_value.saturating_sub(1) as usize;
        let alt_index = wanted.min(alt_count - 1);
        let alt = set.read_at::<GlyphId>(2 + alt_index * 2).ok()?;
        glyphs[pos] = alt;
        Some(SubstApplied { advance: 1 })
    }
}

#[derive(Clone, Copy)]
pub struct LigatureSubst<'a> {
    data: FontData<'a>,
    coverage: CoverageTable<'a>,
}

impl<'a> FontRead<'a> for LigatureSubst<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let coverage_offset: Offset16 = data.read_at(2)?;
        let coverage = coverage_offset.resolve(data)?;
        Ok(LigatureSubst { data, coverage })
    }
}

impl<'a> LigatureSubst<'a> {
    /// Attempt every ligature in the covered set, in declaration order,
    /// honoring the caller's skip predicate when matching the tail.
    pub fn apply(
        &self,
        glyphs: &mut Vec<GlyphId>,
        pos: usize,
        should_skip: &dyn Fn(usize) -> bool,
    ) -> Option<SubstApplied> {
        let index = self.coverage.coverage_index(glyphs[pos])?;
        let set_count = self.data.read_at::<u16>(4).ok()?;
        if index as u16 >= set_count {
            return None;
        }
        let set_offset: Offset16 = self.data.read_at(6 + index as usize * 2).ok()?;
        let set: FontData = set_offset.resolve(self.data).ok()?;
        let lig_count = set.read_at::<u16>(0).ok()?;
        for lig in 0..lig_count {
            let lig_offset: Offset16 = set.read_at(2 + lig as usize * 2).ok()?;
            let lig_data: FontData = lig_offset.resolve(set).ok()?;
            let lig_glyph: GlyphId = lig_data.read_at(0).ok()?;
            let component_count = lig_data.read_at::<u16>(2).ok()? as usize;
            let tail_len = component_count.saturating_sub(1);
            let Some(positions) = super_collect_unskipped(glyphs.len(), pos + 1, tail_len, should_skip) else {
                continue;
            };
            let mut matched = true;
            for (k, &idx) in positions.iter().enumerate() {
                let want: GlyphId = match lig_data.read_at(4 + k * 2) {
                    Ok(g) => g,
                    Err(_) => {
                        matched = false;
                        break;
                    }
                };
                if glyphs[idx] != want {
                    matched = false;
                    break;
                }
            }
            if !matched {
                continue;
            }
            let last = positions.last().copied().unwrap_or(pos);
            glyphs.splice(pos..=last, std::iter::once(lig_glyph));
            return Some(SubstApplied { advance: 1 });
        }
        None
    }
}

fn super_collect_unskipped(
    len: usize,
    start: usize,
    count: usize,
    should_skip: &dyn Fn(usize) -> bool,
) -> Option<Vec<usize>> {
    let mut out = Vec::with_capacity(count);
    let mut pos = start;
    while out.len() < count {
        if pos >= len {
            return None;
        }
        if !should_skip(pos) {
            out.push(pos);
        }
        pos += 1;
    }
    Some(out)
}

#[derive(Clone, Copy)]
pub struct ReverseChainSingleSubst<'a> {
    data: FontData<'a>,
    coverage: CoverageTable<'a>,
    backtrack_coverage_offsets: usize,
    backtrack_count: u16,
    lookahead_coverage_offsets: usize,
    lookahead_count: u16,
    substitutes: &'a [BigEndian<GlyphId>],
}

impl<'a> FontRead<'a> for ReverseChainSingleSubst<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let coverage_offset: Offset16 = data.read_at(2)?;
        let coverage = coverage_offset.resolve(data)?;
        let backtrack_count = data.read_at::<u16>(4)?;
        let backtrack_coverage_offsets = 6;
        let lookahead_offset = backtrack_coverage_offsets + backtrack_count as usize * 2;
        let lookahead_count = data.read_at::<u16>(lookahead_offset)?;
        let lookahead_coverage_offsets = lookahead_offset + 2;
        let glyph_count_offset = lookahead_coverage_offsets + lookahead_count as usize * 2;
        let glyph_count = data.read_at::<u16>(glyph_count_offset)? as usize;
        let substitutes = data.read_array::<GlyphId>(
            glyph_count_offset + 2..glyph_count_offset + 2 + glyph_count * 2,
        )?;
        Ok(ReverseChainSingleSubst {
            data,
            coverage,
            backtrack_coverage_offsets,
            backtrack_count,
            lookahead_coverage_offsets,
            lookahead_count,
            substitutes,
        })
    }
}

impl<'a> ReverseChainSingleSubst<'a> {
    /// Never recurses (§4.4); driven right-to-left by the caller.
    pub fn apply(&self, glyphs: &mut [GlyphId], pos: usize) -> Option<SubstApplied> {
        let index = self.coverage.coverage_index(glyphs[pos])?;
        for k in 0..self.backtrack_count as usize {
            let idx = pos.checked_sub(k + 1)?;
            let cov_offset: Offset16 = self.data.read_at(self.backtrack_coverage_offsets + k * 2).ok()?;
            let cov: CoverageTable = cov_offset.resolve(self.data).ok()?;
            cov.coverage_index(glyphs[idx])?;
        }
        for k in 0..self.lookahead_count as usize {
            let idx = pos + k + 1;
            if idx >= glyphs.len() {
                return None;
            }
            let cov_offset: Offset16 = self.data.read_at(self.lookahead_coverage_offsets + k * 2).ok()?;
            let cov: CoverageTable = cov_offset.resolve(self.data).ok()?;
            cov.coverage_index(glyphs[idx])?;
        }
        let sub = self.substitutes.get(index as usize)?.get();
        glyphs[pos] = sub;
        Some(SubstApplied { advance: 1 })
    }
}
