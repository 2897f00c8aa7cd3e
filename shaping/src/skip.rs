//! The lookup-flag skip predicate (§4.3 "Filter predicate"), built once per
//! lookup application and threaded through subtable matching.

use otf_read::tables::gdef::Gdef;
use otf_read::tables::layout::LookupFlag;
use otf_types::GlyphId;

/// With no GDEF, no glyph is skipped.
pub fn should_skip_fn<'a>(
    gdef: Option<&'a Gdef<'a>>,
    flag: LookupFlag,
    mark_filtering_set: Option<u16>,
    glyphs: &'a [GlyphId],
) -> impl Fn(usize) -> bool + 'a {
    move |idx: usize| match gdef {
        Some(gdef) => gdef.should_skip(glyphs[idx], flag, mark_filtering_set),
        None => false,
    }
}
