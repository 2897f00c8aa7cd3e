//! OpenType Layout common table formats: coverage, class definitions,
//! script/feature/lookup lists, value records and anchors.
//!
//! Device tables (and the `VariationIndex` sub-format they share an offset
//! slot with) are parsed only far enough to skip past them — per this
//! engine's scope, GPOS value records and anchors are never adjusted by the
//! item variation store; only `HVAR` advance-width deltas are (see
//! `tables::hvar`).

use otf_types::{BigEndian, FixedSize, GlyphId, Offset16, Scalar};

use crate::font_data::FontData;
use crate::offset::{Offset, ResolveOffset};
use crate::read::{FontRead, ReadError};

/// The [LookupFlag](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookupFlag) bit enumeration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookupFlag(u16);

impl LookupFlag {
    pub fn from_bits(bits: u16) -> Self {
        LookupFlag(bits)
    }

    pub fn to_bits(self) -> u16 {
        self.0
    }

    pub fn right_to_left(self) -> bool {
        self.0 & 0x0001 != 0
    }

    pub fn ignore_base_glyphs(self) -> bool {
        self.0 & 0x0002 != 0
    }

    pub fn ignore_ligatures(self) -> bool {
        self.0 & 0x0004 != 0
    }

    pub fn ignore_marks(self) -> bool {
        self.0 & 0x0008 != 0
    }

    pub fn use_mark_filtering_set(self) -> bool {
        self.0 & 0x0010 != 0
    }

    /// The high byte, if non-zero: restrict mark skipping to glyphs whose
    /// mark-attachment class matches this value.
    pub fn mark_attachment_type(self) -> Option<u16> {
        let value = (self.0 & 0xFF00) >> 8;
        (value != 0).then_some(value)
    }
}

impl Scalar for LookupFlag {
    type Raw = <u16 as Scalar>::Raw;
    fn from_raw(raw: Self::Raw) -> Self {
        LookupFlag(u16::from_raw(raw))
    }
    fn to_raw(self) -> Self::Raw {
        self.0.to_raw()
    }
}
impl FixedSize for LookupFlag {
    const RAW_BYTE_LEN: usize = 2;
}

/// `[start_glyph, end_glyph, start_coverage_index]`, used by coverage format
/// 2 and (minus the third field) class-def format 2.
#[derive(Clone, Copy, Debug)]
struct RangeRecord {
    start: GlyphId,
    end: GlyphId,
    value: u16,
}

impl RangeRecord {
    const LEN: usize = 6;

    fn read(data: FontData, offset: usize) -> Result<Self, ReadError> {
        Ok(RangeRecord {
            start: data.read_at(offset)?,
            end: data.read_at(offset + 2)?,
            value: data.read_at(offset + 4)?,
        })
    }
}

/// `coverage_index(glyph) -> Option<u32>`: an ordered injection from a
/// subset of glyph IDs to contiguous indices `[0, N)`.
#[derive(Clone, Copy)]
pub enum CoverageTable<'a> {
    Format1 { glyphs: &'a [BigEndian<GlyphId>] },
    Format2 { data: FontData<'a>, count: u16 },
}

impl<'a> FontRead<'a> for CoverageTable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format = data.read_at::<u16>(0)?;
        match format {
            1 => {
                let count = data.read_at::<u16>(2)? as usize;
                let glyphs = data.read_array::<GlyphId>(4..4 + count * 2)?;
                Ok(CoverageTable::Format1 { glyphs })
            }
            2 => {
                let count = data.read_at::<u16>(2)?;
                Ok(CoverageTable::Format2 { data, count })
            }
            other => Err(ReadError::InvalidFormat(other)),
        }
    }
}

impl<'a> CoverageTable<'a> {
    pub fn coverage_index(&self, glyph: GlyphId) -> Option<u32> {
        match self {
            CoverageTable::Format1 { glyphs } => glyphs
                .binary_search_by_key(&glyph, |g| g.get())
                .ok()
                .map(|ix| ix as u32),
            CoverageTable::Format2 { data, count } => {
                let mut lo = 0i32;
                let mut hi = *count as i32 - 1;
                while lo <= hi {
                    let mid = (lo + hi) / 2;
                    let rec = RangeRecord::read(*data, 4 + mid as usize * RangeRecord::LEN).ok()?;
                    if glyph < rec.start {
                        hi = mid - 1;
                    } else if glyph > rec.end {
                        lo = mid + 1;
                    } else {
                        let delta = glyph.to_u16() - rec.start.to_u16();
                        return Some(rec.value as u32 + delta as u32);
                    }
                }
                None
            }
        }
    }

    /// Iterate covered glyphs in coverage-index order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = GlyphId> + 'a> {
        match self {
            CoverageTable::Format1 { glyphs } => {
                Box::new(glyphs.iter().map(|g| g.get()))
            }
            CoverageTable::Format2 { data, count } => {
                let data = *data;
                let count = *count as usize;
                Box::new((0..count).flat_map(move |i| {
                    let rec = RangeRecord::read(data, 4 + i * RangeRecord::LEN).unwrap();
                    (rec.start.to_u16()..=rec.end.to_u16()).map(GlyphId::new)
                }))
            }
        }
    }
}

/// `class(glyph) -> u32`: a total function, 0 outside any stored range.
#[derive(Clone, Copy)]
pub enum ClassDef<'a> {
    Format1 {
        start_glyph: GlyphId,
        classes: &'a [BigEndian<u16>],
    },
    Format2 {
        data: FontData<'a>,
        count: u16,
    },
}

impl<'a> FontRead<'a> for ClassDef<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format = data.read_at::<u16>(0)?;
        match format {
            1 => {
                let start_glyph = data.read_at::<GlyphId>(2)?;
                let count = data.read_at::<u16>(4)? as usize;
                let classes = data.read_array::<u16>(6..6 + count * 2)?;
                Ok(ClassDef::Format1 {
                    start_glyph,
                    classes,
                })
            }
            2 => {
                let count = data.read_at::<u16>(2)?;
                Ok(ClassDef::Format2 { data, count })
            }
            other => Err(ReadError::InvalidFormat(other)),
        }
    }
}

impl<'a> ClassDef<'a> {
    pub fn class(&self, glyph: GlyphId) -> u32 {
        match self {
            ClassDef::Format1 {
                start_glyph,
                classes,
            } => {
                let ix = glyph.to_u16() as i32 - start_glyph.to_u16() as i32;
                if ix < 0 || ix as usize >= classes.len() {
                    0
                } else {
                    classes[ix as usize].get() as u32
                }
            }
            ClassDef::Format2 { data, count } => {
                let mut lo = 0i32;
                let mut hi = *count as i32 - 1;
                while lo <= hi {
                    let mid = (lo + hi) / 2;
                    let rec = match RangeRecord::read(*data, 4 + mid as usize * RangeRecord::LEN) {
                        Ok(r) => r,
                        Err(_) => return 0,
                    };
                    if glyph < rec.start {
                        hi = mid - 1;
                    } else if glyph > rec.end {
                        lo = mid + 1;
                    } else {
                        return rec.value as u32;
                    }
                }
                0
            }
        }
    }
}

/// One `(name_id?, offset)`-free generic scan over a tag-keyed record list:
/// `ScriptList`, `FeatureList`, and a feature's lookup-index array all share
/// this "count then records" shape at the top.
fn read_u16_array<'a>(data: FontData<'a>, offset: usize, count: usize) -> Result<&'a [BigEndian<u16>], ReadError> {
    data.read_array::<u16>(offset..offset + count * 2)
}

/// The `ScriptList` table: maps a script tag to a [`Script`].
#[derive(Clone, Copy)]
pub struct ScriptList<'a> {
    data: FontData<'a>,
    count: u16,
}

impl<'a> FontRead<'a> for ScriptList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count = data.read_at::<u16>(0)?;
        Ok(ScriptList { data, count })
    }
}

impl<'a> ScriptList<'a> {
    pub fn index_for_tag(&self, tag: otf_types::Tag) -> Option<u16> {
        (0..self.count).find(|&i| {
            let rec_off = 2 + i as usize * 6;
            self.data.read_at::<otf_types::Tag>(rec_off).ok() == Some(tag)
        })
    }

    pub fn get(&self, index: u16) -> Result<Script<'a>, ReadError> {
        if index >= self.count {
            return Err(ReadError::OutOfBounds);
        }
        let rec_off = 2 + index as usize * 6;
        let offset: Offset16 = self.data.read_at(rec_off + 4)?;
        offset.resolve(self.data)
    }
}

#[derive(Clone, Copy)]
pub struct Script<'a> {
    data: FontData<'a>,
    lang_sys_count: u16,
}

impl<'a> FontRead<'a> for Script<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let lang_sys_count = data.read_at::<u16>(2)?;
        Ok(Script {
            data,
            lang_sys_count,
        })
    }
}

impl<'a> Script<'a> {
    pub fn default_lang_sys(&self) -> Option<Result<LangSys<'a>, ReadError>> {
        let offset: Offset16 = self.data.read_at(0).ok()?;
        offset.non_null()?;
        Some(offset.resolve(self.data))
    }

    pub fn lang_sys_for_tag(&self, tag: otf_types::Tag) -> Option<Result<LangSys<'a>, ReadError>> {
        for i in 0..self.lang_sys_count {
            let rec_off = 4 + i as usize * 6;
            if self.data.read_at::<otf_types::Tag>(rec_off).ok() == Some(tag) {
                let offset: Offset16 = match self.data.read_at(rec_off + 4) {
                    Ok(o) => o,
                    Err(e) => return Some(Err(e)),
                };
                return Some(offset.resolve(self.data));
            }
        }
        None
    }
}

#[derive(Clone, Copy)]
pub struct LangSys<'a> {
    required_feature_index: u16,
    feature_indices: &'a [BigEndian<u16>],
}

impl<'a> FontRead<'a> for LangSys<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let required_feature_index = data.read_at::<u16>(2)?;
        let count = data.read_at::<u16>(4)? as usize;
        let feature_indices = read_u16_array(data, 6, count)?;
        Ok(LangSys {
            required_feature_index,
            feature_indices,
        })
    }
}

impl<'a> LangSys<'a> {
    pub fn required_feature_index(&self) -> Option<u16> {
        (self.required_feature_index != 0xFFFF).then_some(self.required_feature_index)
    }

    pub fn feature_indices(&self) -> impl Iterator<Item = u16> + 'a {
        self.feature_indices.iter().map(|v| v.get())
    }
}

/// The `FeatureList` table: maps a feature index to a tag and a [`Feature`].
#[derive(Clone, Copy)]
pub struct FeatureList<'a> {
    data: FontData<'a>,
    count: u16,
}

impl<'a> FontRead<'a> for FeatureList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count = data.read_at::<u16>(0)?;
        Ok(FeatureList { data, count })
    }
}

impl<'a> FeatureList<'a> {
    pub fn len(&self) -> u16 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn tag(&self, index: u16) -> Result<otf_types::Tag, ReadError> {
        if index >= self.count {
            return Err(ReadError::OutOfBounds);
        }
        self.data.read_at(2 + index as usize * 6)
    }

    pub fn feature(&self, index: u16) -> Result<Feature<'a>, ReadError> {
        if index >= self.count {
            return Err(ReadError::OutOfBounds);
        }
        let rec_off = 2 + index as usize * 6;
        let offset: Offset16 = self.data.read_at(rec_off + 4)?;
        offset.resolve(self.data)
    }
}

#[derive(Clone, Copy)]
pub struct Feature<'a> {
    lookup_indices: &'a [BigEndian<u16>],
}

impl<'a> FontRead<'a> for Feature<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count = data.read_at::<u16>(2)? as usize;
        let lookup_indices = read_u16_array(data, 4, count)?;
        Ok(Feature { lookup_indices })
    }
}

impl<'a> Feature<'a> {
    pub fn lookup_indices(&self) -> impl Iterator<Item = u16> + 'a {
        self.lookup_indices.iter().map(|v| v.get())
    }
}

/// The top-level `LookupList` table: a list of offsets to raw lookups. The
/// lookup-type interpretation (GSUB vs GPOS) happens in the caller.
#[derive(Clone, Copy)]
pub struct LookupList<'a> {
    data: FontData<'a>,
    count: u16,
}

impl<'a> FontRead<'a> for LookupList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let count = data.read_at::<u16>(0)?;
        Ok(LookupList { data, count })
    }
}

impl<'a> LookupList<'a> {
    pub fn len(&self) -> u16 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: u16) -> Result<RawLookup<'a>, ReadError> {
        if index >= self.count {
            return Err(ReadError::OutOfBounds);
        }
        let offset: Offset16 = self.data.read_at(2 + index as usize * 2)?;
        offset.resolve(self.data)
    }
}

/// A lookup, with its type-agnostic header decoded: type, flag, subtable
/// offsets (relative to this lookup's own start), and optional mark-filtering
/// set. Interpreting `lookup_type`/each subtable is GSUB- or GPOS-specific.
#[derive(Clone, Copy)]
pub struct RawLookup<'a> {
    data: FontData<'a>,
    lookup_type: u16,
    lookup_flag: LookupFlag,
    subtable_count: u16,
}

impl<'a> FontRead<'a> for RawLookup<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let lookup_type = data.read_at::<u16>(0)?;
        let lookup_flag = data.read_at::<LookupFlag>(2)?;
        let subtable_count = data.read_at::<u16>(4)?;
        Ok(RawLookup {
            data,
            lookup_type,
            lookup_flag,
            subtable_count,
        })
    }
}

impl<'a> RawLookup<'a> {
    /// This lookup's own data, the base that `subtable_offset` results are
    /// relative to. Needed by extension-subtable dispatch (GSUB type 7,
    /// GPOS type 9), which must re-read the raw offset before resolving it.
    pub fn data(&self) -> FontData<'a> {
        self.data
    }

    pub fn lookup_type(&self) -> u16 {
        self.lookup_type
    }

    pub fn lookup_flag(&self) -> LookupFlag {
        self.lookup_flag
    }

    pub fn subtable_count(&self) -> u16 {
        self.subtable_count
    }

    /// Resolve the `index`-th subtable offset against this lookup's data.
    pub fn subtable_offset(&self, index: u16) -> Result<Offset16, ReadError> {
        if index >= self.subtable_count {
            return Err(ReadError::OutOfBounds);
        }
        self.data.read_at(6 + index as usize * 2)
    }

    pub fn resolve_subtable<T: FontRead<'a>>(&self, index: u16) -> Result<T, ReadError> {
        self.subtable_offset(index)?.resolve(self.data)
    }

    /// The mark-filtering-set field, present only when
    /// `lookup_flag.use_mark_filtering_set()`.
    pub fn mark_filtering_set(&self) -> Option<u16> {
        if !self.lookup_flag.use_mark_filtering_set() {
            return None;
        }
        let offset = 6 + self.subtable_count as usize * 2;
        self.data.read_at::<u16>(offset).ok()
    }
}

/// An anchor point: `(x, y)` plus, for format 2, a contour point index.
/// Format 3's device-table offsets are parsed only far enough to be skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub x: i16,
    pub y: i16,
    pub contour_point: Option<u16>,
}

impl<'a> FontRead<'a> for Anchor {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format = data.read_at::<u16>(0)?;
        let x = data.read_at::<i16>(2)?;
        let y = data.read_at::<i16>(4)?;
        let contour_point = match format {
            1 | 3 => None,
            2 => Some(data.read_at::<u16>(6)?),
            other => return Err(ReadError::InvalidFormat(other)),
        };
        Ok(Anchor {
            x,
            y,
            contour_point,
        })
    }
}

/// One `{sequence_index, lookup_index}` pair from a contextual rule: apply
/// `lookup_index` at `match_start + sequence_index` (§4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceLookupRecord {
    pub sequence_index: u16,
    pub lookup_index: u16,
}

fn read_lookup_records<'a>(data: FontData<'a>, offset: usize, count: usize) -> Result<Vec<SequenceLookupRecord>, ReadError> {
    (0..count)
        .map(|i| {
            let rec_off = offset + i * 4;
            Ok(SequenceLookupRecord {
                sequence_index: data.read_at(rec_off)?,
                lookup_index: data.read_at(rec_off + 2)?,
            })
        })
        .collect()
}

/// Walk forward (`dir = 1`) or backward (`dir = -1`) from `start`, skipping
/// glyphs `should_skip` marks as ignored, and collect `count` positions.
fn collect_unskipped(
    glyphs_len: usize,
    start: i64,
    dir: i64,
    count: usize,
    should_skip: &dyn Fn(usize) -> bool,
) -> Option<Vec<usize>> {
    let mut out = Vec::with_capacity(count);
    let mut pos = start;
    while out.len() < count {
        if pos < 0 || pos as usize >= glyphs_len {
            return None;
        }
        let idx = pos as usize;
        if !should_skip(idx) {
            out.push(idx);
        }
        pos += dir;
    }
    Some(out)
}

/// The result of a contextual match: the number of input glyphs consumed
/// (the distance from the matched position to just past the last matched
/// input glyph) and the nested lookups to apply.
pub struct ContextMatch {
    pub input_len: usize,
    pub lookup_records: Vec<SequenceLookupRecord>,
}

/// Common (non-chained) contextual substitution/positioning, formats 1-3.
#[derive(Clone, Copy)]
pub enum SequenceContext<'a> {
    Format1 {
        data: FontData<'a>,
        coverage: CoverageTable<'a>,
        rule_set_count: u16,
    },
    Format2 {
        data: FontData<'a>,
        coverage: CoverageTable<'a>,
        class_def: ClassDef<'a>,
        rule_set_count: u16,
    },
    Format3 {
        data: FontData<'a>,
        glyph_count: u16,
        lookup_record_count: u16,
    },
}

impl<'a> FontRead<'a> for SequenceContext<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format = data.read_at::<u16>(0)?;
        match format {
            1 => {
                let coverage_offset: Offset16 = data.read_at(2)?;
                let coverage = coverage_offset.resolve(data)?;
                let rule_set_count = data.read_at::<u16>(4)?;
                Ok(SequenceContext::Format1 {
                    data,
                    coverage,
                    rule_set_count,
                })
            }
            2 => {
                let coverage_offset: Offset16 = data.read_at(2)?;
                let coverage = coverage_offset.resolve(data)?;
                let class_def_offset: Offset16 = data.read_at(4)?;
                let class_def = class_def_offset.resolve(data)?;
                let rule_set_count = data.read_at::<u16>(6)?;
                Ok(SequenceContext::Format2 {
                    data,
                    coverage,
                    class_def,
                    rule_set_count,
                })
            }
            3 => {
                let glyph_count = data.read_at::<u16>(2)?;
                let lookup_record_count = data.read_at::<u16>(4)?;
                Ok(SequenceContext::Format3 {
                    data,
                    glyph_count,
                    lookup_record_count,
                })
            }
            other => Err(ReadError::InvalidFormat(other)),
        }
    }
}

impl<'a> SequenceContext<'a> {
    /// Try to match a rule starting at `pos`. `should_skip` tests a glyph
    /// index in `glyphs` for lookup-flag eligibility.
    pub fn match_at(
        &self,
        glyphs: &[GlyphId],
        pos: usize,
        should_skip: &dyn Fn(usize) -> bool,
    ) -> Option<ContextMatch> {
        match self {
            SequenceContext::Format1 {
                data,
                coverage,
                rule_set_count,
            } => {
                let coverage_index = coverage.coverage_index(glyphs[pos])?;
                if coverage_index >= *rule_set_count as u32 {
                    return None;
                }
                let rule_set_offset: Offset16 = data.read_at(6 + coverage_index as usize * 2).ok()?;
                let rule_set: FontData = rule_set_offset.resolve(*data).ok()?;
                match_glyph_rule_set(rule_set, glyphs, pos, should_skip)
            }
            SequenceContext::Format2 {
                data,
                coverage,
                class_def,
                rule_set_count,
            } => {
                coverage.coverage_index(glyphs[pos])?;
                let class = class_def.class(glyphs[pos]) as u16;
                if class >= *rule_set_count {
                    return None;
                }
                let rule_set_offset: Offset16 = data.read_at(8 + class as usize * 2).ok()?;
                rule_set_offset.non_null()?;
                let rule_set: FontData = rule_set_offset.resolve(*data).ok()?;
                match_class_rule_set(rule_set, glyphs, pos, class_def, should_skip)
            }
            SequenceContext::Format3 {
                data,
                glyph_count,
                lookup_record_count,
            } => {
                let coverages_offset = 6;
                for i in 0..*glyph_count {
                    let cov_offset: Offset16 = data.read_at(coverages_offset + i as usize * 2).ok()?;
                    let cov: CoverageTable = cov_offset.resolve(*data).ok()?;
                    let idx = pos as i64 + i as i64;
                    if idx < 0 || idx as usize >= glyphs.len() {
                        return None;
                    }
                    cov.coverage_index(glyphs[idx as usize])?;
                }
                let records_offset = coverages_offset + *glyph_count as usize * 2;
                let lookup_records =
                    read_lookup_records(*data, records_offset, *lookup_record_count as usize).ok()?;
                Some(ContextMatch {
                    input_len: *glyph_count as usize,
                    lookup_records,
                })
            }
        }
    }
}

fn match_glyph_rule_set(
    rule_set: FontData,
    glyphs: &[GlyphId],
    pos: usize,
    should_skip: &dyn Fn(usize) -> bool,
) -> Option<ContextMatch> {
    let rule_count = rule_set.read_at::<u16>(0).ok()?;
    for r in 0..rule_count {
        let rule_offset: Offset16 = rule_set.read_at(2 + r as usize * 2).ok()?;
        let rule: FontData = rule_offset.resolve(rule_set).ok()?;
        let glyph_count = rule.read_at::<u16>(0).ok()?;
        let lookup_count = rule.read_at::<u16>(2).ok()?;
        let input_tail = glyph_count.saturating_sub(1) as usize;
        let positions = collect_unskipped(glyphs.len(), pos as i64 + 1, 1, input_tail, should_skip);
        let Some(positions) = positions else { continue };
        let mut matched = true;
        for (k, &idx) in positions.iter().enumerate() {
            let want: GlyphId = match rule.read_at::<GlyphId>(4 + k * 2) {
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
        let records_offset = 4 + input_tail * 2;
        let Ok(lookup_records) = read_lookup_records(rule, records_offset, lookup_count as usize) else {
            continue;
        };
        let input_len = positions.last().map(|&i| i - pos + 1).unwrap_or(1);
        return Some(ContextMatch {
            input_len,
            lookup_records,
        });
    }
    None
}

fn match_class_rule_set(
    rule_set: FontData,
    glyphs: &[GlyphId],
    pos: usize,
    class_def: &ClassDef,
    should_skip: &dyn Fn(usize) -> bool,
) -> Option<ContextMatch> {
    let rule_count = rule_set.read_at::<u16>(0).ok()?;
    for r in 0..rule_count {
        let rule_offset: Offset16 = rule_set.read_at(2 + r as usize * 2).ok()?;
        let rule: FontData = rule_offset.resolve(rule_set).ok()?;
        let glyph_count = rule.read_at::<u16>(0).ok()?;
        let lookup_count = rule.read_at::<u16>(2).ok()?;
        let input_tail = glyph_count.saturating_sub(1) as usize;
        let positions = collect_unskipped(glyphs.len(), pos as i64 + 1, 1, input_tail, should_skip);
        let Some(positions) = positions else { continue };
        let mut matched = true;
        for (k, &idx) in positions.iter().enumerate() {
            let want_class: u16 = match rule.read_at::<u16>(4 + k * 2) {
                Ok(c) => c,
                Err(_) => {
                    matched = false;
                    break;
                }
            };
            if class_def.class(glyphs[idx]) as u16 != want_class {
                matched = false;
                break;
            }
        }
        if !matched {
            continue;
        }
        let records_offset = 4 + input_tail * 2;
        let Ok(lookup_records) = read_lookup_records(rule, records_offset, lookup_count as usize) else {
            continue;
        };
        let input_len = positions.last().map(|&i| i - pos + 1).unwrap_or(1);
        return Some(ContextMatch {
            input_len,
            lookup_records,
        });
    }
    None
}

/// Chained contextual substitution/positioning, formats 1-3: like
/// [`SequenceContext`] but with additional backtrack and lookahead
/// sequences.
#[derive(Clone, Copy)]
pub enum ChainedSequenceContext<'a> {
    Format1 {
        data: FontData<'a>,
        coverage: CoverageTable<'a>,
        rule_set_count: u16,
    },
    Format2 {
        data: FontData<'a>,
        coverage: CoverageTable<'a>,
        backtrack_class_def: ClassDef<'a>,
        input_class_def: ClassDef<'a>,
        lookahead_class_def: ClassDef<'a>,
        rule_set_count: u16,
    },
    Format3 {
        data: FontData<'a>,
    },
}

impl<'a> FontRead<'a> for ChainedSequenceContext<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let format = data.read_at::<u16>(0)?;
        match format {
            1 => {
                let coverage_offset: Offset16 = data.read_at(2)?;
                let coverage = coverage_offset.resolve(data)?;
                let rule_set_count = data.read_at::<u16>(4)?;
                Ok(ChainedSequenceContext::Format1 {
                    data,
                    coverage,
                    rule_set_count,
                })
            }
            2 => {
                let coverage_offset: Offset16 = data.read_at(2)?;
                let coverage = coverage_offset.resolve(data)?;
                let backtrack_class_def_offset: Offset16 = data.read_at(4)?;
                let backtrack_class_def = backtrack_class_def_offset.resolve(data)?;
                let input_class_def_offset: Offset16 = data.read_at(6)?;
                let input_class_def = input_class_def_offset.resolve(data)?;
                let lookahead_class_def_offset: Offset16 = data.read_at(8)?;
                let lookahead_class_def = lookahead_class_def_offset.resolve(data)?;
                let rule_set_count = data.read_at::<u16>(10)?;
                Ok(ChainedSequenceContext::Format2 {
                    data,
                    coverage,
                    backtrack_class_def,
                    input_class_def,
                    lookahead_class_def,
                    rule_set_count,
                })
            }
            3 => Ok(ChainedSequenceContext::Format3 { data }),
            other => Err(ReadError::InvalidFormat(other)),
        }
    }
}

impl<'a> ChainedSequenceContext<'a> {
    pub fn match_at(
        &self,
        glyphs: &[GlyphId],
        pos: usize,
        should_skip: &dyn Fn(usize) -> bool,
    ) -> Option<ContextMatch> {
        match self {
            ChainedSequenceContext::Format1 {
                data,
                coverage,
                rule_set_count,
            } => {
                let coverage_index = coverage.coverage_index(glyphs[pos])?;
                if coverage_index >= *rule_set_count as u32 {
                    return None;
                }
                let rule_set_offset: Offset16 = data.read_at(6 + coverage_index as usize * 2).ok()?;
                let rule_set: FontData = rule_set_offset.resolve(*data).ok()?;
                match_chain_glyph_rule_set(rule_set, glyphs, pos, should_skip)
            }
            ChainedSequenceContext::Format2 {
                data,
                coverage,
                backtrack_class_def,
                input_class_def,
                lookahead_class_def,
                rule_set_count,
            } => {
                coverage.coverage_index(glyphs[pos])?;
                let class = input_class_def.class(glyphs[pos]) as u16;
                if class >= *rule_set_count {
                    return None;
                }
                let rule_set_offset: Offset16 = data.read_at(12 + class as usize * 2).ok()?;
                rule_set_offset.non_null()?;
                let rule_set: FontData = rule_set_offset.resolve(*data).ok()?;
                match_chain_class_rule_set(
                    rule_set,
                    glyphs,
                    pos,
                    backtrack_class_def,
                    input_class_def,
                    lookahead_class_def,
                    should_skip,
                )
            }
            ChainedSequenceContext::Format3 { data } => {
                let mut offset = 2usize;
                let backtrack_count = data.read_at::<u16>(offset).ok()?;
                offset += 2;
                let backtrack_coverages_offset = offset;
                offset += backtrack_count as usize * 2;
                let input_count = data.read_at::<u16>(offset).ok()?;
                offset += 2;
                let input_coverages_offset = offset;
                offset += input_count as usize * 2;
                let lookahead_count = data.read_at::<u16>(offset).ok()?;
                offset += 2;
                let lookahead_coverages_offset = offset;
                offset += lookahead_count as usize * 2;
                let lookup_record_count = data.read_at::<u16>(offset).ok()?;
                offset += 2;
                let lookup_records_offset = offset;

                // Backtrack: rule stores right-to-left, index 0 = closest to pos.
                let backtrack_positions = collect_unskipped(
                    glyphs.len(),
                    pos as i64 - 1,
                    -1,
                    backtrack_count as usize,
                    should_skip,
                )?;
                for (k, &idx) in backtrack_positions.iter().enumerate() {
                    let cov_offset: Offset16 = data.read_at(backtrack_coverages_offset + k * 2).ok()?;
                    let cov: CoverageTable = cov_offset.resolve(*data).ok()?;
                    cov.coverage_index(glyphs[idx])?;
                }

                let input_positions = collect_unskipped(glyphs.len(), pos as i64, 1, input_count as usize, should_skip)?;
                for (k, &idx) in input_positions.iter().enumerate() {
                    let cov_offset: Offset16 = data.read_at(input_coverages_offset + k * 2).ok()?;
                    let cov: CoverageTable = cov_offset.resolve(*data).ok()?;
                    cov.coverage_index(glyphs[idx])?;
                }

                let last_input = *input_positions.last()?;
                let lookahead_positions = collect_unskipped(
                    glyphs.len(),
                    last_input as i64 + 1,
                    1,
                    lookahead_count as usize,
                    should_skip,
                )?;
                for (k, &idx) in lookahead_positions.iter().enumerate() {
                    let cov_offset: Offset16 = data.read_at(lookahead_coverages_offset + k * 2).ok()?;
                    let cov: CoverageTable = cov_offset.resolve(*data).ok()?;
                    cov.coverage_index(glyphs[idx])?;
                }

                let lookup_records =
                    read_lookup_records(*data, lookup_records_offset, lookup_record_count as usize).ok()?;
                Some(ContextMatch {
                    input_len: last_input - pos + 1,
                    lookup_records,
                })
            }
        }
    }
}

fn match_chain_glyph_rule_set(
    rule_set: FontData,
    glyphs: &[GlyphId],
    pos: usize,
    should_skip: &dyn Fn(usize) -> bool,
) -> Option<ContextMatch> {
    let rule_count = rule_set.read_at::<u16>(0).ok()?;
    'rules: for r in 0..rule_count {
        let rule_offset: Offset16 = rule_set.read_at(2 + r as usize * 2).ok()?;
        let rule: FontData = rule_offset.resolve(rule_set).ok()?;
        let mut offset = 0usize;
        let backtrack_count = rule.read_at::<u16>(offset).ok()?;
        offset += 2;
        let backtrack_glyphs_offset = offset;
        offset += backtrack_count as usize * 2;
        let input_glyph_count = rule.read_at::<u16>(offset).ok()?;
        offset += 2;
        let input_tail = input_glyph_count.saturating_sub(1) as usize;
        let input_glyphs_offset = offset;
        offset += input_tail * 2;
        let lookahead_count = rule.read_at::<u16>(offset).ok()?;
        offset += 2;
        let lookahead_glyphs_offset = offset;
        offset += lookahead_count as usize * 2;
        let lookup_count = rule.read_at::<u16>(offset).ok()?;
        offset += 2;
        let lookup_records_offset = offset;

        let Some(backtrack_positions) =
            collect_unskipped(glyphs.len(), pos as i64 - 1, -1, backtrack_count as usize, should_skip)
        else {
            continue 'rules;
        };
        for (k, &idx) in backtrack_positions.iter().enumerate() {
            let want: GlyphId = match rule.read_at(backtrack_glyphs_offset + k * 2) {
                Ok(g) => g,
                Err(_) => continue 'rules,
            };
            if glyphs[idx] != want {
                continue 'rules;
            }
        }

        let Some(input_positions) = collect_unskipped(glyphs.len(), pos as i64 + 1, 1, input_tail, should_skip) else {
            continue 'rules;
        };
        for (k, &idx) in input_positions.iter().enumerate() {
            let want: GlyphId = match rule.read_at(input_glyphs_offset + k * 2) {
                Ok(g) => g,
                Err(_) => continue 'rules,
            };
            if glyphs[idx] != want {
                continue 'rules;
            }
        }

        let last_input = input_positions.last().copied().unwrap_or(pos);
        let Some(lookahead_positions) =
            collect_unskipped(glyphs.len(), last_input as i64 + 1, 1, lookahead_count as usize, should_skip)
        else {
            continue 'rules;
        };
        for (k, &idx) in lookahead_positions.iter().enumerate() {
            let want: GlyphId = match rule.read_at(lookahead_glyphs_offset + k * 2) {
                Ok(g) => g,
                Err(_) => continue 'rules,
            };
            if glyphs[idx] != want {
                continue 'rules;
            }
        }

        let Ok(lookup_records) = read_lookup_records(rule, lookup_records_offset, lookup_count as usize) else {
            continue 'rules;
        };
        return Some(ContextMatch {
            input_len: last_input - pos + 1,
            lookup_records,
        });
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn match_chain_class_rule_set(
    rule_set: FontData,
    glyphs: &[GlyphId],
    pos: usize,
    backtrack_class_def: &ClassDef,
    input_class_def: &ClassDef,
    lookahead_class_def: &ClassDef,
    should_skip: &dyn Fn(usize) -> bool,
) -> Option<ContextMatch> {
    let rule_count = rule_set.read_at::<u16>(0).ok()?;
    'rules: for r in 0..rule_count {
        let rule_offset: Offset16 = rule_set.read_at(2 + r as usize * 2).ok()?;
        let rule: FontData = rule_offset.resolve(rule_set).ok()?;
        let mut offset = 0usize;
        let backtrack_count = rule.read_at::<u16>(offset).ok()?;
        offset += 2;
        let backtrack_classes_offset = offset;
        offset += backtrack_count as usize * 2;
        let input_glyph_count = rule.read_at::<u16>(offset).ok()?;
        offset += 2;
        let input_tail = input_glyph_count.saturating_sub(1) as usize;
        let input_classes_offset = offset;
        offset += input_tail * 2;
        let lookahead_count = rule.read_at::<u16>(offset).ok()?;
        offset += 2;
        let lookahead_classes_offset = offset;
        offset += lookahead_count as usize * 2;
        let lookup_count = rule.read_at::<u16>(offset).ok()?;
        offset += 2;
        let lookup_records_offset = offset;

        let Some(backtrack_positions) =
            collect_unskipped(glyphs.len(), pos as i64 - 1, -1, backtrack_count as usize, should_skip)
        else {
            continue 'rules;
        };
        for (k, &idx) in backtrack_positions.iter().enumerate() {
            let want: u16 = match rule.read_at(backtrack_classes_offset + k * 2) {
                Ok(c) => c,
                Err(_) => continue 'rules,
            };
            if backtrack_class_def.class(glyphs[idx]) as u16 != want {
                continue 'rules;
            }
        }

        let Some(input_positions) = collect_unskipped(glyphs.len(), pos as i64 + 1, 1, input_tail, should_skip) else {
            continue 'rules;
        };
        for (k, &idx) in input_positions.iter().enumerate() {
            let want: u16 = match rule.read_at(input_classes_offset + k * 2) {
                Ok(c) => c,
                Err(_) => continue 'rules,
            };
            if input_class_def.class(glyphs[idx]) as u16 != want {
                continue 'rules;
            }
        }

        let last_input = input_positions.last().copied().unwrap_or(pos);
        let Some(lookahead_positions) =
            collect_unskipped(glyphs.len(), last_input as i64 + 1, 1, lookahead_count as usize, should_skip)
        else {
            continue 'rules;
        };
        for (k, &idx) in lookahead_positions.iter().enumerate() {
            let want: u16 = match rule.read_at(lookahead_classes_offset + k * 2) {
                Ok(c) => c,
                Err(_) => continue 'rules,
            };
            if lookahead_class_def.class(glyphs[idx]) as u16 != want {
                continue 'rules;
            }
        }

        let Ok(lookup_records) = read_lookup_records(rule, lookup_records_offset, lookup_count as usize) else {
            continue 'rules;
        };
        return Some(ContextMatch {
            input_len: last_input - pos + 1,
            lookup_records,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuilder;

    fn coverage_format1(glyphs: &[u16]) -> Vec<u8> {
        let mut b = BeBuilder::new();
        b.u16(1).u16(glyphs.len() as u16);
        for &g in glyphs {
            b.u16(g);
        }
        b.build()
    }

    fn coverage_format2(ranges: &[(u16, u16, u16)]) -> Vec<u8> {
        let mut b = BeBuilder::new();
        b.u16(2).u16(ranges.len() as u16);
        for &(start, end, idx) in ranges {
            b.u16(start).u16(end).u16(idx);
        }
        b.build()
    }

    #[test]
    fn coverage_format1_round_trip() {
        let bytes = coverage_format1(&[5, 10, 20]);
        let cov = CoverageTable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cov.coverage_index(GlyphId::new(10)), Some(1));
        assert_eq!(cov.coverage_index(GlyphId::new(11)), None);
        let round: Vec<_> = cov.iter().collect();
        for (k, g) in round.iter().enumerate() {
            assert_eq!(cov.coverage_index(*g), Some(k as u32));
        }
    }

    #[test]
    fn coverage_format2_ranges() {
        let bytes = coverage_format2(&[(10, 12, 0), (20, 20, 3)]);
        let cov = CoverageTable::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cov.coverage_index(GlyphId::new(11)), Some(1));
        assert_eq!(cov.coverage_index(GlyphId::new(20)), Some(3));
        assert_eq!(cov.coverage_index(GlyphId::new(21)), None);
    }

    #[test]
    fn classdef_totality() {
        let mut b = BeBuilder::new();
        b.u16(1).u16(10).u16(2);
        b.u16(5).u16(7);
        let bytes = b.build();
        let cd = ClassDef::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cd.class(GlyphId::new(10)), 5);
        assert_eq!(cd.class(GlyphId::new(11)), 7);
        assert_eq!(cd.class(GlyphId::new(0)), 0);
        assert_eq!(cd.class(GlyphId::new(999)), 0);
    }

    #[test]
    fn classdef_format2() {
        let mut b = BeBuilder::new();
        b.u16(2).u16(1);
        b.u16(100).u16(110).u16(4);
        let bytes = b.build();
        let cd = ClassDef::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cd.class(GlyphId::new(105)), 4);
        assert_eq!(cd.class(GlyphId::new(200)), 0);
    }
}
