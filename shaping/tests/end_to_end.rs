//! End-to-end shaping scenarios driven through hand-built sfnt fixtures:
//! kerning, ligature formation, mark attachment, chained contextual
//! substitution, and a variable-font advance delta. Each fixture is the
//! smallest binary table set that exercises its scenario.

use otf_read::test_helpers::{BeBuilder, FontBuilder};
use otf_read::{FontData, FontRef};
use otf_types::{Fixed, GlyphId, Tag};

use shaping::{parse_feature, Buffer, Shaper};

fn build_lookup(lookup_type: u16, flag: u16, subtable: &[u8]) -> Vec<u8> {
    let mut b = BeBuilder::new();
    b.u16(lookup_type).u16(flag).u16(1).u16(8);
    b.bytes(subtable);
    b.build()
}

fn build_lookup_list(lookups: &[Vec<u8>]) -> Vec<u8> {
    let mut b = BeBuilder::new();
    b.u16(lookups.len() as u16);
    let mut offset = 2 + 2 * lookups.len();
    for l in lookups {
        b.u16(offset as u16);
        offset += l.len();
    }
    for l in lookups {
        b.bytes(l);
    }
    b.build()
}

fn build_feature(lookup_indices: &[u16]) -> Vec<u8> {
    let mut b = BeBuilder::new();
    b.u16(0).u16(lookup_indices.len() as u16);
    for &ix in lookup_indices {
        b.u16(ix);
    }
    b.build()
}

fn build_feature_list(features: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    let mut b = BeBuilder::new();
    b.u16(features.len() as u16);
    let mut offset = 2 + 6 * features.len();
    for (tag, data) in features {
        b.tag(*tag).u16(offset as u16);
        offset += data.len();
    }
    for (_, data) in features {
        b.bytes(data);
    }
    b.build()
}

fn build_layout_table(feature_list: &[u8], lookup_list: &[u8]) -> Vec<u8> {
    let script_list = { let mut b = BeBuilder::new(); b.u16(0); b.build() };
    let mut b = BeBuilder::new();
    b.u32(0x0001_0000);
    let script_off = 10u16;
    let feature_off = script_off + script_list.len() as u16;
    let lookup_off = feature_off + feature_list.len() as u16;
    b.u16(script_off).u16(feature_off).u16(lookup_off);
    b.bytes(&script_list);
    b.bytes(feature_list);
    b.bytes(lookup_list);
    b.build()
}

fn build_coverage_format1(glyphs: &[u16]) -> Vec<u8> {
    let mut b = BeBuilder::new();
    b.u16(1).u16(glyphs.len() as u16);
    for &g in glyphs {
        b.u16(g);
    }
    b.build()
}

fn build_cmap_format0(mapping: &[(u8, u16)]) -> Vec<u8> {
    let mut glyph_ids = [0u8; 256];
    for &(cp, gid) in mapping {
        glyph_ids[cp as usize] = gid as u8;
    }
    let mut sub = BeBuilder::new();
    sub.u16(0).u16(262).u16(0);
    sub.bytes(&glyph_ids);
    let sub_bytes = sub.build();

    let mut cmap = BeBuilder::new();
    cmap.u16(0).u16(1);
    cmap.u16(1).u16(0).u32(12);
    cmap.bytes(&sub_bytes);
    cmap.build()
}

fn build_hhea(number_of_h_metrics: u16) -> Vec<u8> {
    let mut b = BeBuilder::new();
    b.bytes(&[0u8; 36]);
    let mut bytes = b.build();
    bytes[34..36].copy_from_slice(&number_of_h_metrics.to_be_bytes());
    bytes
}

fn build_hmtx(advances: &[(u16, u16)], count: usize) -> Vec<u8> {
    let mut rows = vec![0u16; count];
    for &(gid, adv) in advances {
        rows[gid as usize] = adv;
    }
    let mut b = BeBuilder::new();
    for adv in rows {
        b.u16(adv).i16(0);
    }
    b.build()
}

fn fixed_bits(value: f64) -> i32 {
    Fixed::from_f64(value).to_bits()
}

// Scenario: a single kerning pair pulls the first glyph 80 units left.
#[test]
fn pair_kerning_adjusts_first_glyph_advance() {
    let coverage = build_coverage_format1(&[65]);
    let mut pair_set = BeBuilder::new();
    pair_set.u16(1).u16(86).i16(-80);
    let pair_set_bytes = pair_set.build();

    let mut pair_pos = BeBuilder::new();
    pair_pos.u16(1).u16(12).u16(0x0004).u16(0x0000).u16(1).u16(18);
    pair_pos.bytes(&coverage);
    pair_pos.bytes(&pair_set_bytes);
    let pair_pos_bytes = pair_pos.build();

    let lookup = build_lookup(2, 0, &pair_pos_bytes);
    let lookup_list = build_lookup_list(&[lookup]);
    let feature_list = build_feature_list(&[(Tag::new(b"kern"), build_feature(&[0]))]);
    let gpos = build_layout_table(&feature_list, &lookup_list);

    let cmap = build_cmap_format0(&[(65, 65), (86, 86)]);
    let hhea = build_hhea(87);
    let hmtx = build_hmtx(&[(65, 1336), (86, 1303)], 87);

    let mut fb = FontBuilder::new(0x0001_0000);
    fb.add_table(Tag::new(b"cmap"), cmap);
    fb.add_table(Tag::new(b"hhea"), hhea);
    fb.add_table(Tag::new(b"hmtx"), hmtx);
    fb.add_table(Tag::new(b"GPOS"), gpos);
    let font_bytes = fb.build();

    let font = FontRef::new(FontData::new(&font_bytes)).unwrap();
    let shaper = Shaper::new(font);
    let mut buffer = Buffer::from_codepoints([65u32, 86u32]);
    let features = [parse_feature("kern").unwrap()];
    shaper.shape(&mut buffer, &features).unwrap();

    assert_eq!(buffer.info[0].glyph_id, GlyphId::new(65));
    assert_eq!(buffer.info[1].glyph_id, GlyphId::new(86));
    assert_eq!(buffer.pos[0].x_advance, 1256);
    assert_eq!(buffer.pos[1].x_advance, 1303);
}

// Scenario: f+i ligate into a single glyph; the trailing n is untouched and
// keeps its own cluster.
#[test]
fn ligature_substitution_collapses_glyphs_and_keeps_cluster() {
    let coverage = build_coverage_format1(&[102]);
    let mut ligature = BeBuilder::new();
    ligature.u16(500).u16(2).u16(105);
    let ligature_bytes = ligature.build();

    let mut lig_set = BeBuilder::new();
    lig_set.u16(1).u16(4);
    lig_set.bytes(&ligature_bytes);
    let lig_set_bytes = lig_set.build();

    let mut lig_subst = BeBuilder::new();
    lig_subst.u16(1).u16(8).u16(1).u16(14);
    lig_subst.bytes(&coverage);
    lig_subst.bytes(&lig_set_bytes);
    let lig_subst_bytes = lig_subst.build();

    let lookup = build_lookup(4, 0, &lig_subst_bytes);
    let lookup_list = build_lookup_list(&[lookup]);
    let feature_list = build_feature_list(&[(Tag::new(b"liga"), build_feature(&[0]))]);
    let gsub = build_layout_table(&feature_list, &lookup_list);

    let cmap = build_cmap_format0(&[(102, 102), (105, 105), (110, 110)]);

    let mut fb = FontBuilder::new(0x0001_0000);
    fb.add_table(Tag::new(b"cmap"), cmap);
    fb.add_table(Tag::new(b"GSUB"), gsub);
    let font_bytes = fb.build();

    let font = FontRef::new(FontData::new(&font_bytes)).unwrap();
    let shaper = Shaper::new(font);
    let mut buffer = Buffer::from_codepoints([102u32, 105u32, 110u32]);
    let features = [parse_feature("liga").unwrap()];
    shaper.shape(&mut buffer, &features).unwrap();

    let glyph_ids: Vec<u16> = buffer.info.iter().map(|g| g.glyph_id.to_u16()).collect();
    let clusters: Vec<u32> = buffer.info.iter().map(|g| g.cluster).collect();
    assert_eq!(glyph_ids, vec![500, 110]);
    assert_eq!(clusters, vec![0, 2]);
}

// Scenario: a mark attaches to the preceding base glyph via anchor
// subtraction, recording the attach chain back to it.
#[test]
fn mark_to_base_positions_mark_relative_to_base_anchor() {
    let mut class_def = BeBuilder::new();
    class_def.u16(2).u16(2);
    class_def.u16(65).u16(65).u16(1); // base
    class_def.u16(200).u16(200).u16(3); // mark
    let class_def_bytes = class_def.build();

    let mut gdef = BeBuilder::new();
    gdef.u16(1).u16(0).u16(10).u16(0).u16(0);
    gdef.bytes(&class_def_bytes);
    let gdef_bytes = gdef.build();

    let mark_coverage = build_coverage_format1(&[200]);
    let base_coverage = build_coverage_format1(&[65]);

    let mut mark_array = BeBuilder::new();
    mark_array.u16(1).u16(0).u16(6);
    mark_array.u16(1).i16(100).i16(0);
    let mark_array_bytes = mark_array.build();

    let mut base_array = BeBuilder::new();
    base_array.u16(1).u16(4);
    base_array.u16(1).i16(300).i16(500);
    let base_array_bytes = base_array.build();

    let mut mark_base = BeBuilder::new();
    mark_base.u16(1).u16(12).u16(18).u16(1).u16(24).u16(36);
    mark_base.bytes(&mark_coverage);
    mark_base.bytes(&base_coverage);
    mark_base.bytes(&mark_array_bytes);
    mark_base.bytes(&base_array_bytes);
    let mark_base_bytes = mark_base.build();

    let lookup = build_lookup(4, 0, &mark_base_bytes);
    let lookup_list = build_lookup_list(&[lookup]);
    let feature_list = build_feature_list(&[(Tag::new(b"mark"), build_feature(&[0]))]);
    let gpos = build_layout_table(&feature_list, &lookup_list);

    let cmap = build_cmap_format0(&[(65, 65), (200, 200)]);

    let mut fb = FontBuilder::new(0x0001_0000);
    fb.add_table(Tag::new(b"cmap"), cmap);
    fb.add_table(Tag::new(b"GDEF"), gdef_bytes);
    fb.add_table(Tag::new(b"GPOS"), gpos);
    let font_bytes = fb.build();

    let font = FontRef::new(FontData::new(&font_bytes)).unwrap();
    let shaper = Shaper::new(font);
    let mut buffer = Buffer::from_codepoints([65u32, 200u32]);
    let features = [parse_feature("mark").unwrap()];
    shaper.shape(&mut buffer, &features).unwrap();

    assert_eq!(buffer.pos[1].x_offset, 200);
    assert_eq!(buffer.pos[1].y_offset, 500);
    assert_eq!(buffer.pos[1].attach_type, shaping::AttachType::Mark);
    assert_eq!(buffer.pos[1].attach_chain, -1);
}

// Scenario: a chained contextual rule only fires with the right backtrack
// and lookahead glyphs around the input.
#[test]
fn chained_context_substitute_requires_backtrack_and_lookahead() {
    let single_coverage = build_coverage_format1(&[65]);
    let mut single = BeBuilder::new();
    single.u16(1).u16(6).i16(32); // 65 + 32 = 97
    single.bytes(&single_coverage);
    let single_bytes = single.build();

    let chain_coverage = build_coverage_format1(&[65]);
    let mut rule = BeBuilder::new();
    rule.u16(1).u16(120); // backtrack: [120]
    rule.u16(1); // input glyph count (just the covered glyph)
    rule.u16(1).u16(66); // lookahead: [66]
    rule.u16(1).u16(0).u16(0); // one lookup record: seq_index=0, lookup_index=0
    let rule_bytes = rule.build();

    let mut rule_set = BeBuilder::new();
    rule_set.u16(1).u16(4);
    rule_set.bytes(&rule_bytes);
    let rule_set_bytes = rule_set.build();

    let mut chain_ctx = BeBuilder::new();
    chain_ctx.u16(1).u16(8).u16(1).u16(14);
    chain_ctx.bytes(&chain_coverage);
    chain_ctx.bytes(&rule_set_bytes);
    let chain_ctx_bytes = chain_ctx.build();

    let single_lookup = build_lookup(1, 0, &single_bytes);
    let chain_lookup = build_lookup(6, 0, &chain_ctx_bytes);
    let lookup_list = build_lookup_list(&[single_lookup, chain_lookup]);
    let feature_list = build_feature_list(&[(Tag::new(b"test"), build_feature(&[1]))]);
    let gsub = build_layout_table(&feature_list, &lookup_list);

    let cmap = build_cmap_format0(&[(120, 120), (121, 121), (65, 65), (66, 66)]);

    let mut fb = FontBuilder::new(0x0001_0000);
    fb.add_table(Tag::new(b"cmap"), cmap);
    fb.add_table(Tag::new(b"GSUB"), gsub);
    let font_bytes = fb.build();

    let font = FontRef::new(FontData::new(&font_bytes)).unwrap();
    let shaper = Shaper::new(font);
    let features = [parse_feature("test").unwrap()];

    let mut matches = Buffer::from_codepoints([120u32, 65u32, 66u32]);
    shaper.shape(&mut matches, &features).unwrap();
    let matched_ids: Vec<u16> = matches.info.iter().map(|g| g.glyph_id.to_u16()).collect();
    assert_eq!(matched_ids, vec![120, 97, 66]);

    let mut no_match = Buffer::from_codepoints([121u32, 65u32, 66u32]);
    shaper.shape(&mut no_match, &features).unwrap();
    let unmatched_ids: Vec<u16> = no_match.info.iter().map(|g| g.glyph_id.to_u16()).collect();
    assert_eq!(unmatched_ids, vec![121, 65, 66]);
}

// Scenario: HVAR contributes a nonzero advance delta only once the weight
// axis is pushed to its max; the default location stays at the base advance.
#[test]
fn hvar_delta_applies_only_away_from_default_location() {
    let mut fvar = BeBuilder::new();
    fvar.u16(1).u16(0).u16(16).u16(2).u16(1).u16(20).u16(0).u16(4);
    fvar.tag(Tag::new(b"wght"));
    fvar.i32(fixed_bits(400.0));
    fvar.i32(fixed_bits(400.0));
    fvar.i32(fixed_bits(900.0));
    fvar.u16(0).u16(0);
    let fvar_bytes = fvar.build();

    let mut region_list = BeBuilder::new();
    region_list.u16(1).u16(1);
    region_list.i16(0).i16(16384).i16(16384);
    let region_list_bytes = region_list.build();

    let mut item_var_data = BeBuilder::new();
    item_var_data.u16(1).u16(0).u16(1).u16(0);
    item_var_data.i8(40);
    let item_var_data_bytes = item_var_data.build();

    let mut store = BeBuilder::new();
    store.u16(1).u32(12).u16(1).u32(22);
    store.bytes(&region_list_bytes);
    store.bytes(&item_var_data_bytes);
    let store_bytes = store.build();

    let mut map = BeBuilder::new();
    map.u8(0).u8(0x1F).u16(1).u16(0);
    let map_bytes = map.build();

    let mut hvar = BeBuilder::new();
    hvar.u32(0x0001_0000).u32(12).u32(12 + store_bytes.len() as u32);
    hvar.bytes(&store_bytes);
    hvar.bytes(&map_bytes);
    let hvar_bytes = hvar.build();

    let cmap = build_cmap_format0(&[(65, 3)]);
    let hhea = build_hhea(4);
    let hmtx = build_hmtx(&[(3, 500)], 4);

    let mut fb = FontBuilder::new(0x0001_0000);
    fb.add_table(Tag::new(b"cmap"), cmap);
    fb.add_table(Tag::new(b"hhea"), hhea);
    fb.add_table(Tag::new(b"hmtx"), hmtx);
    fb.add_table(Tag::new(b"fvar"), fvar_bytes);
    fb.add_table(Tag::new(b"HVAR"), hvar_bytes);
    let font_bytes = fb.build();

    let font = FontRef::new(FontData::new(&font_bytes)).unwrap();
    let mut shaper = Shaper::new(font);
    let features: [shaping::Feature; 0] = [];

    let mut at_default = Buffer::from_codepoints([65u32]);
    shaper.shape(&mut at_default, &features).unwrap();
    assert_eq!(at_default.pos[0].x_advance, 500);

    shaper.set_variation_value(Tag::new(b"wght"), Fixed::from_f64(900.0));
    let mut at_max = Buffer::from_codepoints([65u32]);
    shaper.shape(&mut at_max, &features).unwrap();
    assert_eq!(at_max.pos[0].x_advance, 540);
}
