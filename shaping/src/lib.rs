//! A from-scratch OpenType shaping core: GSUB/GPOS lookup application,
//! GDEF-aware filtering, and `fvar`/`avar`/`HVAR` variable-font support,
//! built directly on `otf-read`'s table readers.

mod buffer;
mod error;
mod feature;
mod position;
mod shaper;
mod skip;
mod substitute;
mod variation;

pub use buffer::{AttachType, Buffer, Direction, GlyphInfo, GlyphPosition};
pub use error::ShapingError;
pub use feature::{parse as parse_feature, ClusterRange, Feature};
pub use shaper::Shaper;
pub use variation::VariationInstance;
