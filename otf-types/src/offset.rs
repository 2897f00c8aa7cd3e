use crate::raw::{FixedSize, Scalar};
use crate::uint24::Uint24;

macro_rules! def_offset {
    ($name:ident, $raw:ty, $len:literal) => {
        /// An offset, in bytes, relative to the start of the table that
        /// declares it. A value of `0` means "absent" (null).
        #[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name($raw);

        impl $name {
            pub const fn new(raw: $raw) -> Self {
                $name(raw)
            }

            pub fn to_u32(self) -> u32 {
                self.0.into()
            }

            pub fn is_null(self) -> bool {
                self.to_u32() == 0
            }
        }

        impl FixedSize for $name {
            const RAW_BYTE_LEN: usize = $len;
        }

        impl Scalar for $name {
            type Raw = <$raw as Scalar>::Raw;
            fn from_raw(raw: Self::Raw) -> Self {
                $name(<$raw as Scalar>::from_raw(raw))
            }
            fn to_raw(self) -> Self::Raw {
                self.0.to_raw()
            }
        }
    };
}

def_offset!(Offset16, u16, 2);
def_offset!(Offset24, Uint24, 3);
def_offset!(Offset32, u32, 4);

/// Marker wrapper indicating an offset field is permitted to be null.
///
/// This carries no runtime behavior beyond its inner offset; it exists so
/// that offset-resolution code in `otf-read` can distinguish "this field is
/// optional" from "this field is required" at the type level, the way
/// `read-fonts::offset::Nullable` does.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nullable<O>(O);

impl<O: Copy> Nullable<O> {
    pub const fn new(offset: O) -> Self {
        Nullable(offset)
    }

    pub fn offset(self) -> O {
        self.0
    }
}

impl<O: Scalar> FixedSize for Nullable<O> {
    const RAW_BYTE_LEN: usize = O::RAW_BYTE_LEN;
}

impl<O: Scalar> Scalar for Nullable<O> {
    type Raw = O::Raw;
    fn from_raw(raw: Self::Raw) -> Self {
        Nullable(O::from_raw(raw))
    }
    fn to_raw(self) -> Self::Raw {
        self.0.to_raw()
    }
}
