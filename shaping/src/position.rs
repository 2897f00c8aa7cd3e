//! The GPOS driver (§4.5/§4.6): same cursor-driven lookup application as
//! [`crate::substitute`], but the glyph stream never changes length, so
//! positioning only ever mutates `pos`. This is also where the stream
//! walks `otf_read::tables::gpos` deliberately omits live: pair's
//! next-unskipped-glyph search, mark's scan-left-for-nearest-covered-glyph,
//! and the cursive attach-chain state machine.

use otf_read::table_provider::LayoutTables;
use otf_read::tables::gdef::Gdef;
use otf_read::tables::gpos::{CursivePos, MarkBasePos, MarkLigaturePos, MarkMarkPos, PairPos, PositionSubtables, SinglePos};
use otf_read::tables::layout::{LookupFlag, LookupList, SequenceLookupRecord};
use otf_types::GlyphId;

use crate::buffer::{AttachType, Buffer, Direction, GlyphPosition};
use crate::feature::{ClusterRange, Feature};
use crate::skip::should_skip_fn;

const MAX_RECURSION: u32 = 16;

/// Apply every requested, enabled feature's GPOS lookups (§4.11 step 5),
/// in the order the features were requested.
pub fn apply_features(layout: &LayoutTables, gdef: Option<&Gdef>, buffer: &mut Buffer, requested: &[Feature]) {
    let glyph_ids: Vec<GlyphId> = buffer.info.iter().map(|g| g.glyph_id).collect();
    let clusters: Vec<u32> = buffer.info.iter().map(|g| g.cluster).collect();
    let direction = buffer.direction;

    for feature in requested {
        if feature.value == 0 {
            continue;
        }
        let Some(feature_index) = find_feature_index(layout, feature.tag) else {
            continue;
        };
        let Ok(table_feature) = layout.feature_list.feature(feature_index) else {
            continue;
        };
        let mut lookups: Vec<u16> = table_feature.lookup_indices().collect();
        lookups.sort_unstable();
        lookups.dedup();
        for lookup_index in lookups {
            apply_lookup_pass(
                &layout.lookup_list,
                lookup_index,
                gdef,
                &glyph_ids,
                &clusters,
                &mut buffer.pos,
                feature.range,
                direction,
            );
        }
    }
}

fn find_feature_index(layout: &LayoutTables, tag: otf_types::Tag) -> Option<u16> {
    (0..layout.feature_list.len()).find(|&i| layout.feature_list.tag(i).ok() == Some(tag))
}

#[allow(clippy::too_many_arguments)]
fn apply_lookup_pass(
    lookup_list: &LookupList,
    lookup_index: u16,
    gdef: Option<&Gdef>,
    glyph_ids: &[GlyphId],
    clusters: &[u32],
    pos_arr: &mut [GlyphPosition],
    range: ClusterRange,
    direction: Direction,
) {
    let mut cursor = 0usize;
    while cursor < glyph_ids.len() {
        if !range.contains(clusters[cursor]) {
            cursor += 1;
            continue;
        }
        match try_apply_lookup_at(lookup_list, lookup_index, gdef, glyph_ids, pos_arr, cursor, direction, 0) {
            Some(advance) => cursor += advance.max(1),
            None => cursor += 1,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn try_apply_lookup_at(
    lookup_list: &LookupList,
    lookup_index: u16,
    gdef: Option<&Gdef>,
    glyph_ids: &[GlyphId],
    pos_arr: &mut [GlyphPosition],
    pos: usize,
    direction: Direction,
    depth: u32,
) -> Option<usize> {
    if depth >= MAX_RECURSION || pos >= glyph_ids.len() {
        return None;
    }
    let raw = lookup_list.get(lookup_index).ok()?;
    let flag = raw.lookup_flag();
    let mark_filtering_set = raw.mark_filtering_set();
    let lookup_type = raw.lookup_type();

    let should_skip = should_skip_fn(gdef, flag, mark_filtering_set, glyph_ids);
    if should_skip(pos) {
        return None;
    }

    for i in 0..raw.subtable_count() {
        let Ok(offset) = raw.subtable_offset(i) else {
            continue;
        };
        let Ok(subtable) = PositionSubtables::read(lookup_type, raw.data(), offset) else {
            continue;
        };
        let result = match &subtable {
            PositionSubtables::Single(s) => apply_single(glyph_ids, pos_arr, s, pos),
            PositionSubtables::Pair(s) => apply_pair(glyph_ids, pos_arr, s, &should_skip, pos),
            PositionSubtables::Cursive(s) => apply_cursive(glyph_ids, pos_arr, s, flag, direction, &should_skip, pos),
            PositionSubtables::MarkToBase(s) => apply_mark_to_base(glyph_ids, pos_arr, s, &should_skip, pos),
            PositionSubtables::MarkToLigature(s) => apply_mark_to_ligature(glyph_ids, pos_arr, s, &should_skip, pos),
            PositionSubtables::MarkToMark(s) => apply_mark_to_mark(glyph_ids, pos_arr, s, &should_skip, pos),
            PositionSubtables::Context(sc) => sc.match_at(glyph_ids, pos, &should_skip).map(|m| {
                apply_nested(lookup_list, gdef, glyph_ids, pos_arr, pos, &m.lookup_records, direction, depth, m.input_len)
            }),
            PositionSubtables::ChainContext(cc) => cc.match_at(glyph_ids, pos, &should_skip).map(|m| {
                apply_nested(lookup_list, gdef, glyph_ids, pos_arr, pos, &m.lookup_records, direction, depth, m.input_len)
            }),
        };
        if result.is_some() {
            return result;
        }
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn apply_nested(
    lookup_list: &LookupList,
    gdef: Option<&Gdef>,
    glyph_ids: &[GlyphId],
    pos_arr: &mut [GlyphPosition],
    match_start: usize,
    records: &[SequenceLookupRecord],
    direction: Direction,
    depth: u32,
    input_len: usize,
) -> usize {
    for record in records {
        let target = match_start + record.sequence_index as usize;
        if target < glyph_ids.len() {
            try_apply_lookup_at(lookup_list, record.lookup_index, gdef, glyph_ids, pos_arr, target, direction, depth + 1);
        }
    }
    input_len
}

fn apply_single(glyph_ids: &[GlyphId], pos_arr: &mut [GlyphPosition], sub: &SinglePos, pos: usize) -> Option<usize> {
    let v = sub.value_for(glyph_ids[pos])?;
    pos_arr[pos].x_placement += v.x_placement as i32;
    pos_arr[pos].y_placement += v.y_placement as i32;
    pos_arr[pos].x_advance += v.x_advance as i32;
    pos_arr[pos].y_advance += v.y_advance as i32;
    Some(1)
}

fn pair_value_format2(sub: &PairPos) -> otf_read::tables::value_record::ValueFormat {
    match sub {
        PairPos::Format1 { value_format2, .. } => *value_format2,
        PairPos::Format2 { value_format2, .. } => *value_format2,
    }
}

fn apply_pair(
    glyph_ids: &[GlyphId],
    pos_arr: &mut [GlyphPosition],
    sub: &PairPos,
    should_skip: &dyn Fn(usize) -> bool,
    pos: usize,
) -> Option<usize> {
    let mut next = pos + 1;
    while next < glyph_ids.len() && should_skip(next) {
        next += 1;
    }
    if next >= glyph_ids.len() {
        return None;
    }
    let (v1, v2) = sub.values_for(glyph_ids[pos], glyph_ids[next])?;
    pos_arr[pos].x_placement += v1.x_placement as i32;
    pos_arr[pos].y_placement += v1.y_placement as i32;
    pos_arr[pos].x_advance += v1.x_advance as i32;
    pos_arr[pos].y_advance += v1.y_advance as i32;
    pos_arr[next].x_placement += v2.x_placement as i32;
    pos_arr[next].y_placement += v2.y_placement as i32;
    pos_arr[next].x_advance += v2.x_advance as i32;
    pos_arr[next].y_advance += v2.y_advance as i32;

    let advance = if pair_value_format2(sub).record_byte_len() > 0 {
        next + 1 - pos
    } else {
        next - pos
    };
    Some(advance.max(1))
}

/// Scan backward from `pos` (exclusive) for the nearest non-skipped glyph,
/// per §4.5's mark-attachment recipe. Per standard OpenType behavior, if
/// that glyph isn't covered the lookup simply doesn't apply here.
fn scan_left(pos: usize, should_skip: &dyn Fn(usize) -> bool) -> Option<usize> {
    let mut j = pos;
    while j > 0 {
        j -= 1;
        if !should_skip(j) {
            return Some(j);
        }
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn apply_cursive(
    glyph_ids: &[GlyphId],
    pos_arr: &mut [GlyphPosition],
    sub: &CursivePos,
    flag: LookupFlag,
    direction: Direction,
    should_skip: &dyn Fn(usize) -> bool,
    pos: usize,
) -> Option<usize> {
    let (entry, _) = sub.anchors_for(glyph_ids[pos])?;

    let mut j = pos;
    let connection = loop {
        if j == 0 {
            break None;
        }
        j -= 1;
        if should_skip(j) {
            continue;
        }
        match sub.anchors_for(glyph_ids[j]) {
            Some((_, Some(exit))) => break Some((j, exit)),
            _ => continue,
        }
    };

    let (Some(entry), Some((prev_idx, exit))) = (entry, connection) else {
        return Some(1);
    };

    let backward = direction.is_backward();
    let sign = if backward { -1 } else { 1 };
    if direction.is_horizontal() {
        pos_arr[prev_idx].x_advance = sign * exit.x as i32;
        pos_arr[pos].x_offset = -sign * entry.x as i32;
        pos_arr[pos].y_offset = exit.y as i32 - entry.y as i32;
    } else {
        pos_arr[prev_idx].y_advance = sign * exit.y as i32;
        pos_arr[pos].y_offset = -sign * entry.y as i32;
        pos_arr[pos].x_offset = exit.x as i32 - entry.x as i32;
    }

    let (parent_idx, child_idx) = if flag.right_to_left() { (pos, prev_idx) } else { (prev_idx, pos) };
    let new_chain = parent_idx as i16 - child_idx as i16;
    if pos_arr[parent_idx].attach_type == AttachType::Cursive && pos_arr[parent_idx].attach_chain == -new_chain {
        pos_arr[parent_idx].attach_chain = 0;
        pos_arr[parent_idx].attach_type = AttachType::None;
        if direction.is_horizontal() {
            pos_arr[parent_idx].y_offset = 0;
        } else {
            pos_arr[parent_idx].x_offset = 0;
        }
    }
    pos_arr[child_idx].attach_chain = new_chain;
    pos_arr[child_idx].attach_type = AttachType::Cursive;
    Some(1)
}

fn apply_mark_to_base(
    glyph_ids: &[GlyphId],
    pos_arr: &mut [GlyphPosition],
    sub: &MarkBasePos,
    should_skip: &dyn Fn(usize) -> bool,
    pos: usize,
) -> Option<usize> {
    let mark_index = sub.mark_coverage_index(glyph_ids[pos])?;
    let (mark_class, mark_anchor) = sub.mark_anchor(mark_index)?;
    let base_pos = scan_left(pos, should_skip)?;
    let base_index = sub.base_coverage_index(glyph_ids[base_pos])?;
    let base_anchor = sub.base_anchor(base_index, mark_class)?;

    pos_arr[pos].x_offset = base_anchor.x as i32 - mark_anchor.x as i32;
    pos_arr[pos].y_offset = base_anchor.y as i32 - mark_anchor.y as i32;
    pos_arr[pos].attach_type = AttachType::Mark;
    pos_arr[pos].attach_chain = base_pos as i16 - pos as i16;
    Some(1)
}

fn apply_mark_to_ligature(
    glyph_ids: &[GlyphId],
    pos_arr: &mut [GlyphPosition],
    sub: &MarkLigaturePos,
    should_skip: &dyn Fn(usize) -> bool,
    pos: usize,
) -> Option<usize> {
    let mark_index = sub.mark_coverage_index(glyph_ids[pos])?;
    let (mark_class, mark_anchor) = sub.mark_anchor(mark_index)?;
    let lig_pos = scan_left(pos, should_skip)?;
    let lig_index = sub.ligature_coverage_index(glyph_ids[lig_pos])?;
    let component_index = sub.last_component_index(lig_index)?;
    let lig_anchor = sub.ligature_anchor(lig_index, component_index, mark_class)?;

    pos_arr[pos].x_offset = lig_anchor.x as i32 - mark_anchor.x as i32;
    pos_arr[pos].y_offset = lig_anchor.y as i32 - mark_anchor.y as i32;
    pos_arr[pos].attach_type = AttachType::Mark;
    pos_arr[pos].attach_chain = lig_pos as i16 - pos as i16;
    Some(1)
}

fn apply_mark_to_mark(
    glyph_ids: &[GlyphId],
    pos_arr: &mut [GlyphPosition],
    sub: &MarkMarkPos,
    should_skip: &dyn Fn(usize) -> bool,
    pos: usize,
) -> Option<usize> {
    let mark_index = sub.mark1_coverage_index(glyph_ids[pos])?;
    let (mark_class, mark_anchor) = sub.mark1_anchor(mark_index)?;
    let mark2_pos = scan_left(pos, should_skip)?;
    let mark2_index = sub.mark2_coverage_index(glyph_ids[mark2_pos])?;
    let mark2_anchor = sub.mark2_anchor(mark2_index, mark_class)?;

    pos_arr[pos].x_offset = mark2_anchor.x as i32 - mark_anchor.x as i32;
    pos_arr[pos].y_offset = mark2_anchor.y as i32 - mark_anchor.y as i32;
    pos_arr[pos].attach_type = AttachType::Mark;
    pos_arr[pos].attach_chain = mark2_pos as i16 - pos as i16;
    Some(1)
}
