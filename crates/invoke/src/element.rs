// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

/// Machine integer used to pass tensor elements in and out of an argument set.
///
/// Sealed: the staging buffers rely on every implementor being a plain unsigned integer with
/// alignment no greater than 8.
pub trait Element: Copy + Default + Send + Sync + 'static + sealed::Sealed {
    const BITS: u32;
    fn to_u64(self) -> u64;
    fn from_u64(value: u64) -> Self;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_element {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl Element for $t {
            const BITS: u32 = <$t>::BITS;

            #[inline(always)]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline(always)]
            fn from_u64(value: u64) -> Self {
                value as $t
            }
        }
    )*};
}

impl_element!(u8, u16, u32, u64);
