use crate::raw::{FixedSize, Scalar};

/// A 16.16 fixed-point value, as used by `fvar` axis min/default/max and
/// throughout variation math.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(1 << 16);

    pub const fn from_i32(raw: i32) -> Self {
        Fixed(raw)
    }

    pub const fn to_bits(self) -> i32 {
        self.0
    }

    pub fn from_f64(value: f64) -> Self {
        Fixed((value * 65536.0).round() as i32)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 65536.0
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }

    pub fn to_f2dot14(self) -> F2Dot14 {
        F2Dot14::from_f64(self.to_f64())
    }

    /// `self * num / den` computed with 64-bit intermediates, matching the
    /// precision the `avar`/item-variation-store math relies on.
    pub fn mul_div(self, num: Fixed, den: Fixed) -> Fixed {
        if den.0 == 0 {
            return Fixed::ZERO;
        }
        let v = (self.0 as i64) * (num.0 as i64) / (den.0 as i64);
        Fixed(v as i32)
    }
}

impl std::ops::Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl std::ops::Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl std::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fixed({})", self.to_f64())
    }
}

impl FixedSize for Fixed {
    const RAW_BYTE_LEN: usize = 4;
}

impl Scalar for Fixed {
    type Raw = [u8; 4];
    fn from_raw(raw: Self::Raw) -> Self {
        Fixed(i32::from_be_bytes(raw))
    }
    fn to_raw(self) -> Self::Raw {
        self.0.to_be_bytes()
    }
}

/// A 2.14 fixed-point fraction, `i16 / 16384`. Used for normalized variation
/// axis coordinates and `avar` segment maps.
#[derive(Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct F2Dot14(i16);

impl F2Dot14 {
    pub const ZERO: F2Dot14 = F2Dot14(0);
    pub const ONE: F2Dot14 = F2Dot14(1 << 14);
    pub const MINUS_ONE: F2Dot14 = F2Dot14(-(1 << 14));

    pub const fn from_bits(bits: i16) -> Self {
        F2Dot14(bits)
    }

    pub const fn to_bits(self) -> i16 {
        self.0
    }

    pub fn from_f64(value: f64) -> Self {
        F2Dot14((value * 16384.0).round() as i16)
    }

    pub fn from_f32(value: f32) -> Self {
        Self::from_f64(value as f64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 16384.0
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 16384.0
    }

    pub fn to_fixed(self) -> Fixed {
        Fixed::from_f64(self.to_f64())
    }
}

impl std::fmt::Debug for F2Dot14 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F2Dot14({})", self.to_f64())
    }
}

impl FixedSize for F2Dot14 {
    const RAW_BYTE_LEN: usize = 2;
}

impl Scalar for F2Dot14 {
    type Raw = [u8; 2];
    fn from_raw(raw: Self::Raw) -> Self {
        F2Dot14(i16::from_be_bytes(raw))
    }
    fn to_raw(self) -> Self::Raw {
        self.0.to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f2dot14_roundtrip() {
        assert_eq!(F2Dot14::from_f64(1.0), F2Dot14::ONE);
        assert_eq!(F2Dot14::from_f64(-1.0), F2Dot14::MINUS_ONE);
        assert_eq!(F2Dot14::from_f64(0.0), F2Dot14::ZERO);
    }

    #[test]
    fn fixed_mul_div() {
        let ten = Fixed::from_f64(10.0);
        let three = Fixed::from_f64(3.0);
        let six = Fixed::from_f64(6.0);
        // 10 * 3 / 6 == 5
        assert!((ten.mul_div(three, six).to_f64() - 5.0).abs() < 0.001);
    }
}
