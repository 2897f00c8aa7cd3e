use crate::raw::{FixedSize, Scalar};
use std::fmt::{Debug, Display, Formatter};

/// A four-byte OpenType table/script/feature/axis tag.
///
/// Tags have no ordering semantics beyond byte equality; `PartialOrd`/`Ord`
/// are derived only so tags can be used as map keys or sorted for display.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag([u8; 4]);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidTag {
    InvalidLength(usize),
}

impl Tag {
    /// Construct a `Tag` from up to four bytes, padding with spaces.
    ///
    /// # Panics
    ///
    /// Panics if `src` is empty or longer than four bytes.
    pub const fn new(src: &[u8]) -> Tag {
        match Tag::new_checked(src) {
            Ok(tag) => tag,
            Err(_) => panic!("invalid tag"),
        }
    }

    pub const fn new_checked(src: &[u8]) -> Result<Self, InvalidTag> {
        if src.is_empty() || src.len() > 4 {
            return Err(InvalidTag::InvalidLength(src.len()));
        }
        let mut raw = [0x20u8; 4];
        let mut i = 0;
        while i < src.len() {
            raw[i] = src[i];
            i += 1;
        }
        Ok(Tag(raw))
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Tag(bytes)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl FixedSize for Tag {
    const RAW_BYTE_LEN: usize = 4;
}

impl Scalar for Tag {
    type Raw = [u8; 4];
    fn from_raw(raw: Self::Raw) -> Self {
        Tag(raw)
    }
    fn to_raw(self) -> Self::Raw {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_bytewise() {
        assert_eq!(Tag::new(b"GSUB"), Tag::new(b"GSUB"));
        assert_ne!(Tag::new(b"GSUB"), Tag::new(b"GPOS"));
    }

    #[test]
    fn short_tags_pad_with_spaces() {
        assert_eq!(Tag::new(b"f").to_be_bytes(), *b"f   ");
    }
}
