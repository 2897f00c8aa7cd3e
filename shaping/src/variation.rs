//! Variation-axis state (§3 "Variation state"): design values, fvar-normalized
//! values, and the avar-remapped F2Dot14 values HVAR/GPOS read.

use otf_types::{F2Dot14, Fixed, Tag};
use otf_read::tables::avar::Avar;
use otf_read::tables::fvar::{AxisRecord, Fvar};

/// Owned, mutable variation-axis state for one shaper instance. Three
/// parallel arrays of length `axis_count`, kept in sync by [`set_design_value`].
pub struct VariationInstance {
    axes: Vec<AxisRecord>,
    design_values: Vec<Fixed>,
    normalized: Vec<Fixed>,
    coords: Vec<F2Dot14>,
}

impl VariationInstance {
    /// Build an instance at the font's default location (`fvar` required;
    /// `avar` optional, consistent with both being "soft" tables per §7).
    pub fn new(fvar: &Fvar) -> Self {
        let axes: Vec<AxisRecord> = fvar.axes().collect();
        let design_values: Vec<Fixed> = axes.iter().map(|a| a.default_value).collect();
        let count = axes.len();
        VariationInstance {
            axes,
            design_values,
            normalized: vec![Fixed::ZERO; count],
            coords: vec![F2Dot14::ZERO; count],
        }
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// The avar-remapped F2Dot14 coordinates HVAR and GPOS anchor/value
    /// resolution read.
    pub fn coords(&self) -> &[F2Dot14] {
        &self.coords
    }

    pub fn axis_index(&self, tag: Tag) -> Option<usize> {
        self.axes.iter().position(|a| a.axis_tag == tag)
    }

    /// Set one axis's design-space value, re-deriving the normalized and
    /// post-avar arrays.
    pub fn set_design_value(&mut self, tag: Tag, value: Fixed, avar: Option<&Avar>) {
        let Some(index) = self.axis_index(tag) else {
            return;
        };
        self.design_values[index] = value;
        let normalized = Fvar::normalize_axis_value(&self.axes[index], value);
        self.normalized[index] = normalized;
        // avar's segment maps are keyed by axis index across the whole
        // vector, so a single-axis change still needs a full recompute.
        let mut coords: Vec<F2Dot14> = self.normalized.iter().map(|f| f.to_f2dot14()).collect();
        if let Some(avar) = avar {
            avar.apply(&mut coords);
        }
        self.coords = coords;
    }

    pub fn design_value(&self, tag: Tag) -> Option<Fixed> {
        self.axis_index(tag).map(|i| self.design_values[i])
    }

    pub fn is_default(&self) -> bool {
        self.normalized.iter().all(|&n| n == Fixed::ZERO)
    }
}
