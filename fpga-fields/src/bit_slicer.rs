//! Packing field values into atomic words and back.
//!
//! A field occupies `bit_width` bits starting at `bit_offset` of the packed image. With `A`-bit
//! words it touches words `bit_offset / A` through `(bit_offset + bit_width - 1) / A`, taking a
//! contiguous slice of each. [`word_slices`] enumerates those slices; [`write_bits`] and
//! [`read_bits`] walk them in opposite directions.

use snafu::ensure;

use crate::error::{IndexOutOfRangeSnafu, Result, Side, TooNarrowSnafu, ZeroWidthSnafu};
use crate::word::BusWord;

/// A word store that accepts masked writes.
pub trait WordWrite {
    /// The atomic word type.
    type Word: BusWord;

    /// Returns the number of words in the store.
    fn word_count(&self) -> usize;

    /// Merges the bits of `data` selected by `mask` into word `index`.
    fn write_word(&mut self, index: usize, data: Self::Word, mask: Self::Word) -> Result<()>;
}

/// A word store that can be read one word at a time.
pub trait WordRead {
    /// The atomic word type.
    type Word: BusWord;

    /// Returns the number of words in the store.
    fn word_count(&self) -> usize;

    /// Returns word `index`.
    fn read_word(&mut self, index: usize) -> Result<Self::Word>;
}

/// The part of one atomic word covered by a bit range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordSlice {
    /// The word index.
    pub index: usize,
    /// The lowest covered bit within the word.
    pub lo: usize,
    /// The number of covered bits.
    pub width: usize,
    /// The number of bits of the range covered by earlier words.
    pub consumed: usize,
}

/// Iterator over the [`WordSlice`]s of a bit range, in increasing word order.
#[derive(Clone, Debug)]
pub struct WordSlices {
    next: usize,
    end: usize,
    atomic_bits: usize,
    bit_offset: usize,
}

/// Splits `bit_width` bits starting at `bit_offset` into slices of `atomic_bits`-wide words.
///
/// A zero-width range has no slices.
pub fn word_slices(bit_offset: usize, bit_width: usize, atomic_bits: usize) -> WordSlices {
    WordSlices {
        next: bit_offset,
        end: bit_offset + bit_width,
        atomic_bits,
        bit_offset,
    }
}

impl WordSlices {
    /// Returns the index of the last word the range touches, or `None` if it is empty.
    pub fn last_index(&self) -> Option<usize> {
        (self.next < self.end).then(|| (self.end - 1) / self.atomic_bits)
    }
}

impl Iterator for WordSlices {
    type Item = WordSlice;

    fn next(&mut self) -> Option<WordSlice> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next / self.atomic_bits;
        let lo = self.next % self.atomic_bits;
        let hi = (self.end - 1).min((index + 1) * self.atomic_bits - 1) % self.atomic_bits;
        let slice = WordSlice {
            index,
            lo,
            width: hi - lo + 1,
            consumed: self.next - self.bit_offset,
        };
        self.next += slice.width;
        Some(slice)
    }
}

/// Writes the low `bit_width` bits of `value` at `bit_offset`.
///
/// Each touched word receives a masked merge, so bits of other fields sharing the word are
/// preserved. Bits of `value` above `bit_width` are ignored; callers that care check them first.
/// Every touched index is validated before the first write, so an out-of-range call leaves `dest`
/// untouched.
pub fn write_bits<C>(dest: &mut C, bit_offset: usize, bit_width: usize, value: u128) -> Result<()>
where
    C: WordWrite + ?Sized,
{
    let slices = word_slices(bit_offset, bit_width, C::Word::BITS);
    if let Some(last) = slices.last_index() {
        let len = dest.word_count();
        ensure!(
            last < len,
            IndexOutOfRangeSnafu {
                side: Side::Write,
                index: last,
                len,
            }
        );
    }

    for slice in slices {
        let chunk = value.checked_shr(slice.consumed as u32).unwrap_or(0);
        let mask = C::Word::low_mask(slice.width) << slice.lo;
        let data = (C::Word::from_u128_truncating(chunk) << slice.lo) & mask;
        dest.write_word(slice.index, data, mask)?;
    }
    Ok(())
}

/// Reads `bit_width` bits at `bit_offset` into a destination of `dest_bits` bits.
///
/// Fails if the range is empty, wider than the destination, or extends past the end of `src`.
/// Nothing is read from `src` unless every check passes.
pub fn read_bits<C>(src: &mut C, bit_offset: usize, bit_width: usize, dest_bits: usize) -> Result<u128>
where
    C: WordRead + ?Sized,
{
    ensure!(bit_width != 0, ZeroWidthSnafu { bit_offset });
    ensure!(
        bit_width <= dest_bits && bit_width <= u128::BITS as usize,
        TooNarrowSnafu {
            bit_width,
            dest_bits,
        }
    );

    let slices = word_slices(bit_offset, bit_width, C::Word::BITS);
    if let Some(last) = slices.last_index() {
        let len = src.word_count();
        ensure!(
            last < len,
            IndexOutOfRangeSnafu {
                side: Side::Read,
                index: last,
                len,
            }
        );
    }

    let mut result = 0u128;
    for slice in slices {
        let word = src.read_word(slice.index)?;
        let bits = (word >> slice.lo) & C::Word::low_mask(slice.width);
        result |= bits.to_u128() << slice.consumed;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::Error;

    /// A plain word array standing in for one side of the shadow cache.
    struct Words<W> {
        words: Vec<W>,
        reads: Vec<usize>,
    }

    impl<W: BusWord> Words<W> {
        fn new(len: usize) -> Self {
            Self {
                words: vec![W::zero(); len],
                reads: Vec::new(),
            }
        }
    }

    impl<W: BusWord> WordWrite for Words<W> {
        type Word = W;

        fn word_count(&self) -> usize {
            self.words.len()
        }

        fn write_word(&mut self, index: usize, data: W, mask: W) -> Result<()> {
            let word = &mut self.words[index];
            *word = (*word & !mask) | (data & mask);
            Ok(())
        }
    }

    impl<W: BusWord> WordRead for Words<W> {
        type Word = W;

        fn word_count(&self) -> usize {
            self.words.len()
        }

        fn read_word(&mut self, index: usize) -> Result<W> {
            self.reads.push(index);
            Ok(self.words[index])
        }
    }

    fn slices(bit_offset: usize, bit_width: usize, atomic_bits: usize) -> Vec<WordSlice> {
        word_slices(bit_offset, bit_width, atomic_bits).collect()
    }

    #[test]
    fn test_word_slices() {
        assert!(slices(3, 0, 8).is_empty());
        assert_eq!(
            slices(3, 4, 8),
            [WordSlice { index: 0, lo: 3, width: 4, consumed: 0 }],
        );
        assert_eq!(
            slices(9, 16, 8),
            [
                WordSlice { index: 1, lo: 1, width: 7, consumed: 0 },
                WordSlice { index: 2, lo: 0, width: 8, consumed: 7 },
                WordSlice { index: 3, lo: 0, width: 1, consumed: 15 },
            ],
        );
        assert_eq!(
            slices(64, 64, 64),
            [WordSlice { index: 1, lo: 0, width: 64, consumed: 0 }],
        );
        assert_eq!(word_slices(9, 16, 8).last_index(), Some(3));
        assert_eq!(word_slices(9, 0, 8).last_index(), None);
    }

    #[test]
    fn test_write_straddling_three_words() {
        let mut words = Words::<u8>::new(4);
        write_bits(&mut words, 9, 16, 50000).unwrap();
        assert_eq!(words.words, [0, 0b1010_0000, 0b1000_0110, 0b0000_0001]);
    }

    #[test]
    fn test_write_preserves_neighbours() {
        let mut words = Words::<u16>::new(2);
        words.words = vec![0xffff, 0xffff];
        write_bits(&mut words, 12, 8, 0).unwrap();
        assert_eq!(words.words, [0x0fff, 0xfff0]);
    }

    #[test]
    fn test_write_full_width_words() {
        let mut words = Words::<u128>::new(2);
        write_bits(&mut words, 0, 128, u128::MAX).unwrap();
        write_bits(&mut words, 128, 1, 1).unwrap();
        assert_eq!(words.words, [u128::MAX, 1]);
        assert_eq!(read_bits(&mut words, 0, 128, 128).unwrap(), u128::MAX);
    }

    #[test]
    fn test_write_field_wider_than_value() {
        let mut words = Words::<u64>::new(3);
        words.words[2] = u64::MAX;
        write_bits(&mut words, 0, 140, u128::MAX).unwrap();
        assert_eq!(words.words, [u64::MAX, u64::MAX, !0xfff]);
    }

    #[test]
    fn test_write_zero_width_is_noop() {
        let mut words = Words::<u8>::new(1);
        write_bits(&mut words, 100, 0, 1).unwrap();
        assert_eq!(words.words, [0]);
    }

    #[test]
    fn test_write_out_of_range_touches_nothing() {
        let mut words = Words::<u8>::new(2);
        let err = write_bits(&mut words, 12, 8, 0xff).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfRange { side: Side::Write, index: 2, len: 2 },
        ));
        assert_eq!(words.words, [0, 0]);
    }

    #[test]
    fn test_read_errors() {
        let mut words = Words::<u8>::new(2);
        assert!(matches!(
            read_bits(&mut words, 4, 0, 8),
            Err(Error::ZeroWidth { bit_offset: 4 }),
        ));
        assert!(matches!(
            read_bits(&mut words, 0, 9, 8),
            Err(Error::TooNarrow { bit_width: 9, dest_bits: 8 }),
        ));
        assert!(matches!(
            read_bits(&mut words, 12, 8, 8),
            Err(Error::IndexOutOfRange { side: Side::Read, index: 2, len: 2 }),
        ));
        assert!(words.reads.is_empty());
    }

    #[test]
    fn test_read_touches_each_word_once() {
        let mut words = Words::<u8>::new(4);
        words.words = vec![0, 0b1010_0000, 0b1000_0110, 0b0000_0001];
        assert_eq!(read_bits(&mut words, 9, 16, 16).unwrap(), 50000);
        assert_eq!(words.reads, [1, 2, 3]);
    }

    fn all_set<W: BusWord>(words: &mut Words<W>, range: core::ops::Range<usize>) -> bool {
        (range.start..range.end).step_by(128).all(|start| {
            let width = (range.end - start).min(128);
            read_bits(words, start, width, 128).unwrap() == u128::MAX >> (128 - width)
        })
    }

    fn round_trip<W: BusWord>(bit_offset: usize, bit_width: usize, value: u128) -> bool {
        let value = if bit_width >= 128 {
            value
        } else {
            value & ((1 << bit_width) - 1)
        };
        // One spare word so there are always bits above the field.
        let len = (bit_offset + bit_width + W::BITS - 1) / W::BITS + 1;
        let mut words = Words::<W>::new(len);
        words.words.iter_mut().for_each(|word| *word = W::max_value());
        write_bits(&mut words, bit_offset, bit_width, value).unwrap();

        // Bits outside the field must still be set.
        let end = bit_offset + bit_width;
        all_set(&mut words, 0..bit_offset)
            && all_set(&mut words, end..len * W::BITS)
            && read_bits(&mut words, bit_offset, bit_width, 128).unwrap() == value
    }

    #[test]
    fn test_all_set_spots_cleared_bits() {
        let mut words = Words::<u8>::new(4);
        words.words = vec![0xff; 4];
        write_bits(&mut words, 5, 13, 0).unwrap();
        assert_eq!(words.words, [0x1f, 0x00, 0xfc, 0xff]);
        assert!(all_set(&mut words, 0..5));
        assert!(all_set(&mut words, 18..32));
        assert!(!all_set(&mut words, 17..32));
    }

    #[quickcheck]
    fn round_trips_through_u8_words(offset: u8, width: u8, value: u128) -> bool {
        round_trip::<u8>(offset as usize, width as usize % 128 + 1, value)
    }

    #[quickcheck]
    fn round_trips_through_u32_words(offset: u8, width: u8, value: u128) -> bool {
        round_trip::<u32>(offset as usize, width as usize % 128 + 1, value)
    }

    #[quickcheck]
    fn round_trips_through_u128_words(offset: u8, width: u8, value: u128) -> bool {
        round_trip::<u128>(offset as usize, width as usize % 128 + 1, value)
    }

    #[test]
    fn test_round_trip_extremes() {
        for width in [1, 7, 8, 9, 63, 64, 65, 127, 128] {
            for offset in [0, 1, 7, 8, 63, 64, 65] {
                let max = u128::MAX >> (128 - width);
                assert!(round_trip::<u8>(offset, width, 0));
                assert!(round_trip::<u8>(offset, width, max));
                assert!(round_trip::<u64>(offset, width, max));
                assert!(round_trip::<u128>(offset, width, max));
            }
        }
    }
}
