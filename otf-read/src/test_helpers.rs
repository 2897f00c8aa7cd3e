//! Byte-builders used only by unit tests, across this crate and `shaping`.
//!
//! There's no font compiler in this workspace (the teacher's equivalent is
//! generated by running its own separately-built font-test-data corpus), so
//! tests assemble minimal binary tables directly with this tiny big-endian
//! writer instead.

use otf_types::Tag;

/// An append-only big-endian byte buffer.
#[derive(Default, Clone)]
pub struct BeBuilder {
    bytes: Vec<u8>,
}

impl BeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.bytes.push(v);
        self
    }

    pub fn i8(&mut self, v: i8) -> &mut Self {
        self.bytes.push(v as u8);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u24(&mut self, v: u32) -> &mut Self {
        let b = v.to_be_bytes();
        self.bytes.extend_from_slice(&b[1..]);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn tag(&mut self, tag: Tag) -> &mut Self {
        self.bytes.extend_from_slice(&tag.to_be_bytes());
        self
    }

    pub fn bytes(&mut self, raw: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(raw);
        self
    }

    /// The current write position -- useful for computing offsets to
    /// sub-tables that get appended later.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Assembles a minimal sfnt (single-font, not TTC) blob from a set of
/// `(tag, bytes)` table entries.
pub struct FontBuilder {
    sfnt_version: u32,
    tables: Vec<(Tag, Vec<u8>)>,
}

impl FontBuilder {
    pub fn new(sfnt_version: u32) -> Self {
        FontBuilder {
            sfnt_version,
            tables: Vec::new(),
        }
    }

    pub fn add_table(&mut self, tag: Tag, data: Vec<u8>) -> &mut Self {
        self.tables.push((tag, data));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let num_tables = self.tables.len() as u16;
        let mut out = BeBuilder::new();
        out.u32(self.sfnt_version);
        out.u16(num_tables);
        out.u16(0); // search_range
        out.u16(0); // entry_selector
        out.u16(0); // range_shift

        let header_len = 12 + 16 * self.tables.len();
        let mut offset = header_len;
        let mut sorted: Vec<_> = self.tables.iter().collect();
        sorted.sort_by_key(|(tag, _)| tag.to_be_bytes());
        let mut directory = BeBuilder::new();
        let mut body = BeBuilder::new();
        for (tag, data) in &sorted {
            directory.tag(*tag);
            directory.u32(0); // checksum, unused by the reader
            directory.u32(offset as u32);
            directory.u32(data.len() as u32);
            body.bytes(data);
            offset += data.len();
        }
        out.bytes(&directory.build());
        out.bytes(&body.build());
        out.build()
    }
}
