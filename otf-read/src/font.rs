//! The sfnt / TTC container: table discovery and byte-range extraction.
//!
//! This is deliberately thin (see spec.md §1/§6): it does no validation
//! beyond what's needed to safely slice out each table's bytes.

use otf_types::{Tag, TRUE_SFNT_VERSION, TTC_HEADER_TAG, TT_SFNT_VERSION};

use crate::font_data::FontData;
use crate::read::ReadError;

const OTTO_SFNT_VERSION: u32 = 0x4F54_544F;
const TYP1_SFNT_VERSION: u32 = 0x7479_7031;

#[derive(Clone, Copy)]
struct TableRecord {
    tag: Tag,
    offset: u32,
    length: u32,
}

/// A parsed table directory: the sorted list of `(tag, offset, length)`
/// records following an sfnt offset table.
#[derive(Clone)]
pub struct TableDirectory<'a> {
    data: FontData<'a>,
    sfnt_version: u32,
    records: Vec<TableRecord>,
}

impl<'a> TableDirectory<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let sfnt_version = data.read_at::<u32>(0)?;
        let num_tables = data.read_at::<u16>(4)?;
        let mut records = Vec::with_capacity(num_tables as usize);
        for i in 0..num_tables as usize {
            let rec_off = 12 + i * 16;
            let tag = data.read_at::<Tag>(rec_off)?;
            let offset = data.read_at::<u32>(rec_off + 8)?;
            let length = data.read_at::<u32>(rec_off + 12)?;
            records.push(TableRecord {
                tag,
                offset,
                length,
            });
        }
        records.sort_by_key(|r| r.tag.to_be_bytes());
        Ok(TableDirectory {
            data,
            sfnt_version,
            records,
        })
    }

    fn table_data(&self, tag: Tag) -> Option<FontData<'a>> {
        let idx = self
            .records
            .binary_search_by_key(&tag.to_be_bytes(), |r| r.tag.to_be_bytes())
            .ok()?;
        let record = self.records[idx];
        let start = record.offset as usize;
        let end = start.checked_add(record.length as usize)?;
        self.data.slice(start..end)
    }
}

/// A reference to a single font's tables, borrowed from the caller's blob.
#[derive(Clone)]
pub struct FontRef<'a> {
    table_directory: TableDirectory<'a>,
}

impl<'a> FontRef<'a> {
    /// Parse a font directly from sfnt bytes (not a TTC).
    pub fn new(data: FontData<'a>) -> Result<Self, ReadError> {
        let table_directory = TableDirectory::read(data)?;
        Self::from_table_directory(table_directory)
    }

    fn from_table_directory(table_directory: TableDirectory<'a>) -> Result<Self, ReadError> {
        match table_directory.sfnt_version {
            TT_SFNT_VERSION | OTTO_SFNT_VERSION | TRUE_SFNT_VERSION | TYP1_SFNT_VERSION => {
                Ok(FontRef { table_directory })
            }
            other => Err(ReadError::InvalidSfnt(other)),
        }
    }

    pub fn table_data(&self, tag: Tag) -> Option<FontData<'a>> {
        self.table_directory.table_data(tag)
    }
}

/// A reference to a font collection (`ttcf`) file.
#[derive(Clone)]
pub struct CollectionRef<'a> {
    data: FontData<'a>,
    num_fonts: u32,
}

impl<'a> CollectionRef<'a> {
    pub fn new(data: FontData<'a>) -> Result<Self, ReadError> {
        let tag = data.read_at::<Tag>(0)?;
        if tag != TTC_HEADER_TAG {
            return Err(ReadError::InvalidTtc(tag));
        }
        let num_fonts = data.read_at::<u32>(8)?;
        Ok(CollectionRef { data, num_fonts })
    }

    pub fn len(&self) -> u32 {
        self.num_fonts
    }

    pub fn is_empty(&self) -> bool {
        self.num_fonts == 0
    }

    /// Parse the font at collection index `index`.
    pub fn get(&self, index: u32) -> Result<FontRef<'a>, ReadError> {
        if index >= self.num_fonts {
            return Err(ReadError::InvalidCollectionIndex(index));
        }
        let offset_field = 12 + index as usize * 4;
        let table_dir_offset = self.data.read_at::<u32>(offset_field)? as usize;
        let table_dir_data = self
            .data
            .slice(table_dir_offset..)
            .ok_or(ReadError::OutOfBounds)?;
        let table_directory = TableDirectory::read(table_dir_data)?;
        FontRef::from_table_directory(table_directory)
    }
}

/// Either a single font or a collection, matching whichever magic the bytes start with.
#[derive(Clone)]
pub enum FileRef<'a> {
    Font(FontRef<'a>),
    Collection(CollectionRef<'a>),
}

impl<'a> FileRef<'a> {
    pub fn new(data: FontData<'a>) -> Result<Self, ReadError> {
        if let Ok(collection) = CollectionRef::new(data) {
            Ok(FileRef::Collection(collection))
        } else {
            FontRef::new(data).map(FileRef::Font)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FontBuilder;

    #[test]
    fn finds_table_by_tag() {
        let mut builder = FontBuilder::new(TT_SFNT_VERSION);
        builder.add_table(Tag::new(b"ABCD"), vec![1, 2, 3, 4]);
        let bytes = builder.build();
        let font = FontRef::new(FontData::new(&bytes)).unwrap();
        let data = font.table_data(Tag::new(b"ABCD")).unwrap();
        assert_eq!(data.as_bytes(), &[1, 2, 3, 4]);
        assert!(font.table_data(Tag::new(b"ZZZZ")).is_none());
    }

    #[test]
    fn rejects_unknown_sfnt_version() {
        let bytes = [0u8; 12];
        assert!(FontRef::new(FontData::new(&bytes)).is_err());
    }
}
