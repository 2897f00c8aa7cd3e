//! Big-endian scalar reads over raw font bytes.

/// A type with a known, constant, in-file byte size.
pub trait FixedSize {
    /// The number of bytes this type occupies in big-endian font data.
    const RAW_BYTE_LEN: usize;
}

/// A type that can be read directly out of big-endian font bytes.
///
/// This is implemented for the primitive integer types used throughout
/// OpenType tables (`u8`, `i8`, `u16`, `i16`, `Uint24`, `u32`, `i32`) as well
/// as the newtype scalars built on top of them (`Tag`, `GlyphId`, `Fixed`,
/// `F2Dot14`, ...).
pub trait Scalar: FixedSize + Copy {
    /// The in-memory big-endian byte representation.
    type Raw: Copy + AsRef<[u8]> + AsMut<[u8]> + Default;

    fn from_raw(raw: Self::Raw) -> Self;
    fn to_raw(self) -> Self::Raw;

    /// Read a value from a byte slice of exactly `RAW_BYTE_LEN` bytes.
    fn read(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::RAW_BYTE_LEN {
            return None;
        }
        let mut raw = Self::Raw::default();
        raw.as_mut().copy_from_slice(bytes);
        Some(Self::from_raw(raw))
    }
}

/// A big-endian encoded value of type `T`, stored unaligned.
///
/// Reading the wrapped value with [`BigEndian::get`] performs the
/// byte-order swap; constructing one with [`BigEndian::new`] performs it in
/// the other direction. This mirrors how every fixed-width field in an
/// OpenType table is actually stored on disk.
#[derive(Clone, Copy)]
pub struct BigEndian<T: Scalar>(T::Raw);

impl<T: Scalar> BigEndian<T> {
    /// Wrap an already-native value, converting it to its raw big-endian form.
    pub fn new(value: T) -> Self {
        BigEndian(value.to_raw())
    }

    /// Decode the wrapped value.
    pub fn get(&self) -> T {
        T::from_raw(self.0)
    }

    /// Read a `BigEndian<T>` from a byte slice of exactly `T::RAW_BYTE_LEN` bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != T::RAW_BYTE_LEN {
            return None;
        }
        let mut raw = T::Raw::default();
        raw.as_mut().copy_from_slice(bytes);
        Some(BigEndian(raw))
    }
}

impl<T: Scalar> FixedSize for BigEndian<T> {
    const RAW_BYTE_LEN: usize = T::RAW_BYTE_LEN;
}

impl<T: Scalar + Default> Default for BigEndian<T> {
    fn default() -> Self {
        BigEndian::new(T::default())
    }
}

impl<T: Scalar + PartialEq> PartialEq for BigEndian<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<T: Scalar + Eq> Eq for BigEndian<T> {}

impl<T: Scalar + std::fmt::Debug> std::fmt::Debug for BigEndian<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.get().fmt(f)
    }
}

// SAFETY: these impls hand-roll exactly what `bytemuck::Pod`/`AnyBitPattern`
// would derive for a `[u8; N]`-shaped newtype: the wrapped `Raw` array is
// itself plain bytes, so any bit pattern is valid and there is no padding.
unsafe impl<T: Scalar> bytemuck::Zeroable for BigEndian<T> {}
unsafe impl<T: Scalar + 'static> bytemuck::AnyBitPattern for BigEndian<T> {}
unsafe impl<T: Scalar + 'static> bytemuck::NoUninit for BigEndian<T> {}

macro_rules! impl_scalar_for_int {
    ($ty:ty, $len:literal) => {
        impl FixedSize for $ty {
            const RAW_BYTE_LEN: usize = $len;
        }

        impl Scalar for $ty {
            type Raw = [u8; $len];

            fn from_raw(raw: Self::Raw) -> Self {
                <$ty>::from_be_bytes(raw)
            }

            fn to_raw(self) -> Self::Raw {
                self.to_be_bytes()
            }
        }
    };
}

impl_scalar_for_int!(u8, 1);
impl_scalar_for_int!(i8, 1);
impl_scalar_for_int!(u16, 2);
impl_scalar_for_int!(i16, 2);
impl_scalar_for_int!(u32, 4);
impl_scalar_for_int!(i32, 4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_u16() {
        let be = BigEndian::new(0x1234u16);
        assert_eq!(be.get(), 0x1234);
        let from_bytes = BigEndian::<u16>::from_slice(&[0x12, 0x34]).unwrap();
        assert_eq!(from_bytes.get(), 0x1234);
    }

    #[test]
    fn roundtrip_i16_negative() {
        let be = BigEndian::new(-5i16);
        assert_eq!(be.get(), -5);
    }
}
