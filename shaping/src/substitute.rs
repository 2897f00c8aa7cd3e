//! The GSUB driver (§4.4/§4.6): cursor-based lookup application over the
//! glyph stream, with nested contextual lookups recursing through the same
//! single-position entry point.

use otf_read::table_provider::LayoutTables;
use otf_read::tables::gdef::Gdef;
use otf_read::tables::gsub::SubstitutionSubtables;
use otf_read::tables::layout::{LookupList, SequenceLookupRecord};
use otf_types::GlyphId;

use crate::buffer::{Buffer, GlyphInfo, GlyphPosition};
use crate::feature::{ClusterRange, Feature};
use crate::skip::should_skip_fn;

const MAX_RECURSION: u32 = 16;

struct SubstResult {
    /// Net change in glyph count caused by this one application.
    len_delta: i64,
    /// How far the driving cursor should step after this application.
    advance: usize,
}

/// Apply every requested, enabled feature's GSUB lookups, each a full pass
/// over the stream in ascending lookup-index order, in the order the
/// features were requested (§4.11 step 3).
pub fn apply_features(layout: &LayoutTables, gdef: Option<&Gdef>, buffer: &mut Buffer, requested: &[Feature]) {
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
            apply_lookup_pass(&layout.lookup_list, lookup_index, gdef, buffer, feature.range, feature.value);
        }
    }
}

fn find_feature_index(layout: &LayoutTables, tag: otf_types::Tag) -> Option<u16> {
    (0..layout.feature_list.len()).find(|&i| layout.feature_list.tag(i).ok() == Some(tag))
}

fn apply_lookup_pass(
    lookup_list: &LookupList,
    lookup_index: u16,
    gdef: Option<&Gdef>,
    buffer: &mut Buffer,
    range: ClusterRange,
    feature_value: u32,
) {
    let mut glyphs: Vec<GlyphId> = buffer.info.iter().map(|g| g.glyph_id).collect();
    let mut clusters: Vec<u32> = buffer.info.iter().map(|g| g.cluster).collect();
    let mut codepoints: Vec<u32> = buffer.info.iter().map(|g| g.codepoint).collect();

    if is_reverse_chain_single(lookup_list, lookup_index) {
        let mut cursor = glyphs.len();
        while cursor > 0 {
            cursor -= 1;
            if !range.contains(clusters[cursor]) {
                continue;
            }
            try_apply_lookup_at(
                lookup_list,
                lookup_index,
                gdef,
                &mut glyphs,
                &mut clusters,
                &mut codepoints,
                cursor,
                feature_value,
                0,
            );
        }
    } else {
        let mut cursor = 0usize;
        while cursor < glyphs.len() {
            if !range.contains(clusters[cursor]) {
                cursor += 1;
                continue;
            }
            match try_apply_lookup_at(
                lookup_list,
                lookup_index,
                gdef,
                &mut glyphs,
                &mut clusters,
                &mut codepoints,
                cursor,
                feature_value,
                0,
            ) {
                Some(result) => cursor += result.advance.max(1),
                None => cursor += 1,
            }
        }
    }

    sync_buffer(buffer, glyphs, clusters, codepoints);
}

fn is_reverse_chain_single(lookup_list: &LookupList, lookup_index: u16) -> bool {
    let Ok(raw) = lookup_list.get(lookup_index) else {
        return false;
    };
    if raw.subtable_count() == 0 {
        return false;
    }
    let Ok(offset) = raw.subtable_offset(0) else {
        return false;
    };
    matches!(
        SubstitutionSubtables::read(raw.lookup_type(), raw.data(), offset),
        Ok(SubstitutionSubtables::ReverseChainSingle(_))
    )
}

/// Try every subtable of `lookup_index` at exactly one position, in
/// declaration order, stopping at the first that applies (§4.6 step 2).
/// Shared by the outer cursor loop and by nested contextual lookups.
fn try_apply_lookup_at(
    lookup_list: &LookupList,
    lookup_index: u16,
    gdef: Option<&Gdef>,
    glyphs: &mut Vec<GlyphId>,
    clusters: &mut Vec<u32>,
    codepoints: &mut Vec<u32>,
    pos: usize,
    feature_value: u32,
    depth: u32,
) -> Option<SubstResult> {
    if depth >= MAX_RECURSION || pos >= glyphs.len() {
        return None;
    }
    let raw = lookup_list.get(lookup_index).ok()?;
    let flag = raw.lookup_flag();
    let mark_filtering_set = raw.mark_filtering_set();
    let lookup_type = raw.lookup_type();

    let snapshot = glyphs.clone();
    let should_skip = should_skip_fn(gdef, flag, mark_filtering_set, &snapshot);
    if should_skip(pos) {
        return None;
    }

    for i in 0..raw.subtable_count() {
        let Ok(offset) = raw.subtable_offset(i) else {
            continue;
        };
        let Ok(subtable) = SubstitutionSubtables::read(lookup_type, raw.data(), offset) else {
            continue;
        };
        let result = match &subtable {
            SubstitutionSubtables::Context(sc) => sc.match_at(&snapshot, pos, &should_skip).map(|m| {
                apply_nested(
                    lookup_list,
                    gdef,
                    glyphs,
                    clusters,
                    codepoints,
                    pos,
                    &m.lookup_records,
                    depth,
                    m.input_len,
                )
            }),
            SubstitutionSubtables::ChainContext(cc) => cc.match_at(&snapshot, pos, &should_skip).map(|m| {
                apply_nested(
                    lookup_list,
                    gdef,
                    glyphs,
                    clusters,
                    codepoints,
                    pos,
                    &m.lookup_records,
                    depth,
                    m.input_len,
                )
            }),
            _ => apply_leaf(&subtable, glyphs, clusters, codepoints, pos, feature_value, &should_skip),
        };
        if result.is_some() {
            return result;
        }
    }
    None
}

/// Apply a contextual rule's nested lookup records in listed order, each at
/// `match_start + sequence_index` shifted by however much earlier records in
/// this same batch have grown or shrunk the stream (§4.6).
#[allow(clippy::too_many_arguments)]
fn apply_nested(
    lookup_list: &LookupList,
    gdef: Option<&Gdef>,
    glyphs: &mut Vec<GlyphId>,
    clusters: &mut Vec<u32>,
    codepoints: &mut Vec<u32>,
    match_start: usize,
    records: &[SequenceLookupRecord],
    depth: u32,
    input_len: usize,
) -> SubstResult {
    let mut shift: i64 = 0;
    for record in records {
        let target = match_start as i64 + record.sequence_index as i64 + shift;
        if target < 0 {
            continue;
        }
        let target = target as usize;
        if let Some(r) = try_apply_lookup_at(
            lookup_list,
            record.lookup_index,
            gdef,
            glyphs,
            clusters,
            codepoints,
            target,
            1,
            depth + 1,
        ) {
            shift += r.len_delta;
        }
    }
    SubstResult {
        len_delta: shift,
        advance: input_len,
    }
}

/// Apply one non-contextual subtable at `pos` and keep `clusters`/
/// `codepoints` spliced in lockstep with whatever range of `glyphs` it
/// replaced.
fn apply_leaf(
    subtable: &SubstitutionSubtables,
    glyphs: &mut Vec<GlyphId>,
    clusters: &mut Vec<u32>,
    codepoints: &mut Vec<u32>,
    pos: usize,
    feature_value: u32,
    should_skip: &dyn Fn(usize) -> bool,
) -> Option<SubstResult> {
    let len_before = glyphs.len();
    let applied = match subtable {
        SubstitutionSubtables::Single(s) => s.apply(glyphs, pos),
        SubstitutionSubtables::Multiple(s) => s.apply(glyphs, pos),
        SubstitutionSubtables::Alternate(s) => s.apply(glyphs, pos, feature_value),
        SubstitutionSubtables::Ligature(s) => s.apply(glyphs, pos, should_skip),
        SubstitutionSubtables::ReverseChainSingle(s) => s.apply(glyphs, pos),
        SubstitutionSubtables::Context(_) | SubstitutionSubtables::ChainContext(_) => None,
    }?;
    let len_after = glyphs.len();
    let delta = len_after as i64 - len_before as i64;
    let max_width = len_before as i64 - pos as i64;
    let width_removed = (applied.advance as i64 - delta).clamp(0, max_width) as usize;

    let cluster_value = clusters[pos];
    let codepoint_value = codepoints[pos];
    clusters.splice(pos..pos + width_removed, std::iter::repeat(cluster_value).take(applied.advance));
    codepoints.splice(pos..pos + width_removed, std::iter::repeat(codepoint_value).take(applied.advance));

    Some(SubstResult {
        len_delta: delta,
        advance: applied.advance,
    })
}

fn sync_buffer(buffer: &mut Buffer, glyphs: Vec<GlyphId>, clusters: Vec<u32>, codepoints: Vec<u32>) {
    buffer.info = glyphs
        .into_iter()
        .zip(clusters)
        .zip(codepoints)
        .map(|((glyph_id, cluster), codepoint)| GlyphInfo {
            codepoint,
            glyph_id,
            cluster,
            gdef_class: None,
        })
        .collect();
    buffer.pos = vec![GlyphPosition::default(); buffer.info.len()];
}
