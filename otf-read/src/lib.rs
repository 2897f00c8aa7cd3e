//! Zero-copy parsing of OpenType font tables: the sfnt/TTC container, the
//! binary reader primitives, and per-table views over GSUB/GPOS/GDEF,
//! cmap, metrics, and the variable-font tables.

mod font;
mod font_data;
mod offset;
mod read;
pub mod table_provider;
pub mod tables;

#[cfg(any(test, feature = "test_data"))]
pub mod test_helpers;

pub use font::{CollectionRef, FileRef, FontRef};
pub use font_data::{Cursor, FontData};
pub use offset::{Offset, ResolveNullableOffset, ResolveOffset};
pub use read::{ComputeSize, FontRead, FontReadWithArgs, ReadArgs, ReadError};
pub use table_provider::TableProvider;
