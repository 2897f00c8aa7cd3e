//! Typed, by-tag accessors over a parsed font: `cmap` is the only table the
//! shaper treats as required; everything else is soft (absent on parse
//! failure, per §7).

use otf_types::Tag;

use crate::font::FontRef;
use crate::font_data::FontData;
use crate::read::{FontRead, FontReadWithArgs, ReadError};
use crate::tables::avar::Avar;
use crate::tables::cmap::Cmap;
use crate::tables::fvar::Fvar;
use crate::tables::gdef::Gdef;
use crate::tables::hhea::Hhea;
use crate::tables::head::Head;
use crate::tables::hmtx::Hmtx;
use crate::tables::hvar::Hvar;
use crate::tables::layout::{FeatureList, LookupList, ScriptList};
use crate::tables::maxp::Maxp;

const TAG_CMAP: Tag = Tag::new(b"cmap");
const TAG_HEAD: Tag = Tag::new(b"head");
const TAG_HHEA: Tag = Tag::new(b"hhea");
const TAG_HMTX: Tag = Tag::new(b"hmtx");
const TAG_MAXP: Tag = Tag::new(b"maxp");
const TAG_GDEF: Tag = Tag::new(b"GDEF");
const TAG_GSUB: Tag = Tag::new(b"GSUB");
const TAG_GPOS: Tag = Tag::new(b"GPOS");
const TAG_FVAR: Tag = Tag::new(b"fvar");
const TAG_AVAR: Tag = Tag::new(b"avar");
const TAG_HVAR: Tag = Tag::new(b"HVAR");

/// A top-level layout table's script list, feature list, and lookup list.
pub struct LayoutTables<'a> {
    pub script_list: ScriptList<'a>,
    pub feature_list: FeatureList<'a>,
    pub lookup_list: LookupList<'a>,
}

/// By-tag access to the tables this engine reads, built from a [`FontRef`].
pub trait TableProvider<'a> {
    fn table_data(&self, tag: Tag) -> Option<FontData<'a>>;

    /// The only table the shaper requires; its absence is a hard error.
    fn cmap(&self) -> Result<Cmap<'a>, ReadError> {
        self.table_data(TAG_CMAP)
            .ok_or(ReadError::TableIsMissing(TAG_CMAP))
            .and_then(Cmap::read)
    }

    fn head(&self) -> Option<Head> {
        self.table_data(TAG_HEAD).and_then(|d| Head::read(d).ok())
    }

    fn hhea(&self) -> Option<Hhea> {
        self.table_data(TAG_HHEA).and_then(|d| Hhea::read(d).ok())
    }

    fn maxp(&self) -> Option<Maxp> {
        self.table_data(TAG_MAXP).and_then(|d| Maxp::read(d).ok())
    }

    fn hmtx(&self) -> Option<Hmtx<'a>> {
        let num_h_metrics = self.hhea()?.number_of_h_metrics;
        self.table_data(TAG_HMTX)
            .and_then(|d| Hmtx::read_with_args(d, &num_h_metrics).ok())
    }

    fn gdef(&self) -> Option<Gdef<'a>> {
        self.table_data(TAG_GDEF).and_then(|d| Gdef::read(d).ok())
    }

    fn gsub(&self) -> Option<LayoutTables<'a>> {
        self.table_data(TAG_GSUB).and_then(|d| read_layout_tables(d).ok())
    }

    fn gpos(&self) -> Option<LayoutTables<'a>> {
        self.table_data(TAG_GPOS).and_then(|d| read_layout_tables(d).ok())
    }

    fn fvar(&self) -> Option<Fvar<'a>> {
        self.table_data(TAG_FVAR).and_then(|d| Fvar::read(d).ok())
    }

    fn avar(&self) -> Option<Avar<'a>> {
        self.table_data(TAG_AVAR).and_then(|d| Avar::read(d).ok())
    }

    fn hvar(&self) -> Option<Hvar<'a>> {
        self.table_data(TAG_HVAR).and_then(|d| Hvar::read(d).ok())
    }
}

fn read_layout_tables(data: FontData) -> Result<LayoutTables, ReadError> {
    let script_list_offset: otf_types::Offset16 = data.read_at(4)?;
    let feature_list_offset: otf_types::Offset16 = data.read_at(6)?;
    let lookup_list_offset: otf_types::Offset16 = data.read_at(8)?;
    use crate::offset::ResolveOffset;
    Ok(LayoutTables {
        script_list: script_list_offset.resolve(data)?,
        feature_list: feature_list_offset.resolve(data)?,
        lookup_list: lookup_list_offset.resolve(data)?,
    })
}

impl<'a> TableProvider<'a> for FontRef<'a> {
    fn table_data(&self, tag: Tag) -> Option<FontData<'a>> {
        FontRef::table_data(self, tag)
    }
}
