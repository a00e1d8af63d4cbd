use core::fmt::{Debug, LowerHex};

use num_traits::{PrimInt, Unsigned};
use paste::paste;

/// An atomic bus word: the indivisible unit a backend transfers.
///
/// Implemented for the unsigned primitive integers `u8` through `u128`. Bit `k` of word `i` is
/// bit `i * BITS + k` of the packed register image.
pub trait BusWord: PrimInt + Unsigned + Default + Debug + LowerHex + Send + Sync + 'static {
    /// The word width in bits.
    const BITS: usize;
    /// The word width in bytes.
    const BYTES: usize;

    /// Converts the low [`BITS`](Self::BITS) bits of a `u128`, discarding the rest.
    fn from_u128_truncating(value: u128) -> Self;

    /// Widens the word to a `u128`.
    fn to_u128(self) -> u128;

    /// Returns a word with the low `width` bits set.
    ///
    /// `width` must be at most [`BITS`](Self::BITS).
    fn low_mask(width: usize) -> Self {
        if width == 0 {
            Self::zero()
        } else {
            Self::max_value() >> (<Self as BusWord>::BITS - width)
        }
    }

    /// Stores the word in little-endian byte order. `out` must be exactly
    /// [`BYTES`](Self::BYTES) long.
    fn write_le_bytes(self, out: &mut [u8]);

    /// Loads a word from little-endian bytes. `bytes` must be exactly
    /// [`BYTES`](Self::BYTES) long.
    fn read_le_bytes(bytes: &[u8]) -> Self;
}

/// A host integer that a field value can be written from or read into.
///
/// Implemented for `bool`, the unsigned primitive integers, and `usize`.
pub trait FieldValue: Copy + Debug {
    /// The number of bits the type can hold.
    const BITS: usize;

    /// Widens the value to a `u128`.
    fn to_bits(self) -> u128;

    /// Narrows a `u128` holding at most [`BITS`](Self::BITS) significant bits.
    fn from_bits(bits: u128) -> Self;
}

macro_rules! impl_words {
    ($($bits:literal),* $(,)?) => {
        $(paste! {
            impl BusWord for [<u $bits>] {
                const BITS: usize = $bits;
                const BYTES: usize = $bits / 8;

                #[inline(always)]
                fn from_u128_truncating(value: u128) -> Self {
                    value as Self
                }

                #[inline(always)]
                fn to_u128(self) -> u128 {
                    self as u128
                }

                #[inline(always)]
                fn write_le_bytes(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                #[inline(always)]
                fn read_le_bytes(bytes: &[u8]) -> Self {
                    let mut buf = [0; $bits / 8];
                    buf.copy_from_slice(bytes);
                    Self::from_le_bytes(buf)
                }
            }

            impl FieldValue for [<u $bits>] {
                const BITS: usize = $bits;

                #[inline(always)]
                fn to_bits(self) -> u128 {
                    self as u128
                }

                #[inline(always)]
                fn from_bits(bits: u128) -> Self {
                    bits as Self
                }
            }
        })*
    };
}

impl_words!(8, 16, 32, 64, 128);

impl FieldValue for usize {
    const BITS: usize = usize::BITS as usize;

    #[inline(always)]
    fn to_bits(self) -> u128 {
        self as u128
    }

    #[inline(always)]
    fn from_bits(bits: u128) -> Self {
        bits as Self
    }
}

impl FieldValue for bool {
    const BITS: usize = 1;

    #[inline(always)]
    fn to_bits(self) -> u128 {
        self as u128
    }

    #[inline(always)]
    fn from_bits(bits: u128) -> Self {
        bits != 0
    }
}
