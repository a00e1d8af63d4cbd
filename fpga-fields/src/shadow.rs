//! The host-side mirror of the register words.
//!
//! The write side holds the image the host wants the hardware to see. A write word is dirty
//! while its content differs from what the backend last received, so a flush pushes exactly the
//! words that changed. The read side holds the last words fetched from the hardware; a read
//! word is dirty while it is stale, so it is fetched at most once between invalidations.

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, trace};
use num_traits::Zero;
use snafu::ensure;

use crate::bit_slicer::{WordRead, WordWrite};
use crate::error::{IndexOutOfRangeSnafu, Result, Side};
use crate::hw_access::HwAccess;
use crate::layout::words_for;
use crate::word::BusWord;

/// Write-coalescing, read-caching word arrays in front of a [`HwAccess`] backend.
#[derive(Debug)]
pub struct ShadowCache<H: HwAccess> {
    hw: H,
    wr_words: Vec<H::WrWord>,
    wr_flushed: Vec<H::WrWord>,
    wr_dirty: Vec<bool>,
    wr_forced: bool,
    rd_words: Vec<H::RdWord>,
    rd_dirty: Vec<bool>,
}

impl<H: HwAccess> ShadowCache<H> {
    /// Initializes `hw` and allocates shadows for `wr_bits` write bits and `rd_bits` read bits.
    ///
    /// The write shadow starts zeroed with nothing pending; every read word starts stale.
    pub fn new(mut hw: H, wr_bits: usize, rd_bits: usize) -> Result<Self> {
        hw.init(wr_bits, rd_bits)?;
        let wr_len = words_for(wr_bits, H::WrWord::BITS);
        let rd_len = words_for(rd_bits, H::RdWord::BITS);
        debug!(
            "shadow: {wr_bits} write bits in {wr_len}x{}-bit words, \
             {rd_bits} read bits in {rd_len}x{}-bit words",
            H::WrWord::BITS,
            H::RdWord::BITS,
        );
        Ok(Self {
            hw,
            wr_words: vec![H::WrWord::zero(); wr_len],
            wr_flushed: vec![H::WrWord::zero(); wr_len],
            wr_dirty: vec![false; wr_len],
            wr_forced: false,
            rd_words: vec![H::RdWord::zero(); rd_len],
            rd_dirty: vec![true; rd_len],
        })
    }

    /// Returns the number of write words.
    pub fn wr_len(&self) -> usize {
        self.wr_words.len()
    }

    /// Returns the number of read words.
    pub fn rd_len(&self) -> usize {
        self.rd_words.len()
    }

    /// Merges the bits of `data` selected by `mask` into write word `index`.
    pub fn write(&mut self, index: usize, data: H::WrWord, mask: H::WrWord) -> Result<()> {
        let len = self.wr_words.len();
        ensure!(
            index < len,
            IndexOutOfRangeSnafu {
                side: Side::Write,
                index,
                len,
            }
        );
        let word = &mut self.wr_words[index];
        *word = (*word & !mask) | (data & mask);
        self.wr_dirty[index] = self.wr_forced || *word != self.wr_flushed[index];
        Ok(())
    }

    /// Returns whether write word `index` has changes the backend has not received.
    pub fn is_wr_dirty(&self, index: usize) -> bool {
        self.wr_dirty.get(index).copied().unwrap_or(false)
    }

    /// Pushes every changed write word to the backend in increasing index order.
    ///
    /// Returns the number of words pushed. A word whose push fails stays dirty, as do the words
    /// after it.
    pub fn wr_flush(&mut self) -> Result<usize> {
        let mut pushed = 0;
        for index in 0..self.wr_words.len() {
            if self.wr_dirty[index] {
                let word = self.wr_words[index];
                self.hw.wr(index, word)?;
                self.wr_flushed[index] = word;
                self.wr_dirty[index] = false;
                pushed += 1;
            }
        }
        self.wr_forced = false;
        debug!("shadow: flushed {pushed} write words");
        Ok(pushed)
    }

    /// Marks every write word dirty so the next [`wr_flush`](Self::wr_flush) pushes the whole
    /// image.
    ///
    /// Use this when the hardware may no longer hold what was last pushed, for example after a
    /// reset.
    pub fn wr_force_all(&mut self) {
        self.wr_forced = true;
        self.wr_dirty.fill(true);
    }

    /// Returns read word `index`, fetching it from the backend if it is stale.
    pub fn read(&mut self, index: usize) -> Result<H::RdWord> {
        let len = self.rd_words.len();
        ensure!(
            index < len,
            IndexOutOfRangeSnafu {
                side: Side::Read,
                index,
                len,
            }
        );
        if self.rd_dirty[index] {
            let word = self.hw.rd(index)?;
            trace!("shadow: fetched read word {index} = {word:#x}");
            self.rd_words[index] = word;
            self.rd_dirty[index] = false;
        }
        Ok(self.rd_words[index])
    }

    /// Returns whether read word `index` will be fetched on its next read.
    pub fn is_rd_stale(&self, index: usize) -> bool {
        self.rd_dirty.get(index).copied().unwrap_or(true)
    }

    /// Marks every read word stale, so each is fetched again on its next read.
    pub fn rd_flush(&mut self) {
        self.rd_dirty.fill(true);
    }

    /// Stores a raw word directly to the backend, bypassing the shadow.
    pub fn wr_raw(&mut self, word_address: usize, data: H::WrWord) -> Result<()> {
        self.hw.wr_raw(word_address, data)
    }

    /// Loads a raw word directly from the backend, bypassing the shadow.
    pub fn rd_raw(&mut self, word_address: usize) -> Result<H::RdWord> {
        self.hw.rd_raw(word_address)
    }

    /// Returns the backend.
    pub fn hw(&self) -> &H {
        &self.hw
    }

    /// Returns the backend mutably.
    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Releases the shadows and returns the backend.
    pub fn into_hw(self) -> H {
        self.hw
    }
}

impl<H: HwAccess> WordWrite for ShadowCache<H> {
    type Word = H::WrWord;

    fn word_count(&self) -> usize {
        self.wr_len()
    }

    fn write_word(&mut self, index: usize, data: H::WrWord, mask: H::WrWord) -> Result<()> {
        self.write(index, data, mask)
    }
}

impl<H: HwAccess> WordRead for ShadowCache<H> {
    type Word = H::RdWord;

    fn word_count(&self) -> usize {
        self.rd_len()
    }

    fn read_word(&mut self, index: usize) -> Result<H::RdWord> {
        self.read(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw_access::{BusStats, Loopback, Transaction};
    use crate::Error;

    fn cache() -> ShadowCache<Loopback<u8, u8>> {
        ShadowCache::new(Loopback::new(8, 0).unwrap(), 25, 25).unwrap()
    }

    #[test]
    fn test_sizes() {
        let cache = cache();
        assert_eq!(cache.wr_len(), 4);
        assert_eq!(cache.rd_len(), 4);
        assert!((0..4).all(|i| !cache.is_wr_dirty(i) && cache.is_rd_stale(i)));
    }

    #[test]
    fn test_shadows_start_zeroed() {
        let mut cache =
            ShadowCache::new(Loopback::<u128, u16>::new(64, 0).unwrap(), 200, 40).unwrap();
        assert_eq!((cache.wr_len(), cache.rd_len()), (2, 3));
        cache.write(1, 0, u128::MAX).unwrap();
        assert!(!cache.is_wr_dirty(1));
        assert_eq!(cache.wr_flush().unwrap(), 0);
        assert_eq!(cache.read(2).unwrap(), 0);
    }

    #[test]
    fn test_init_failure_is_reported() {
        let result = ShadowCache::new(Loopback::<u8, u8>::new(2, 0).unwrap(), 25, 8);
        assert!(matches!(
            result,
            Err(Error::RegionTooSmall { side: Side::Write, .. }),
        ));
    }

    #[test]
    fn test_masked_merge() {
        let mut cache = cache();
        cache.write(1, 0xff, 0x0f).unwrap();
        cache.write(1, 0x00, 0x03).unwrap();
        assert_eq!(cache.wr_flush().unwrap(), 1);
        assert_eq!(cache.hw().peek_wr(1), 0x0c);
    }

    #[test]
    fn test_flush_pushes_only_changed_words_in_order() {
        let mut cache = cache();
        cache.write(3, 0x80, 0x80).unwrap();
        cache.write(0, 0x01, 0x01).unwrap();
        cache.write(2, 0x00, 0xff).unwrap();
        assert!(!cache.is_wr_dirty(2));
        assert_eq!(cache.wr_flush().unwrap(), 2);
        assert_eq!(
            cache.hw_mut().take_journal(),
            [
                Transaction::Write { word_offset: 0, data: 0x01 },
                Transaction::Write { word_offset: 3, data: 0x80 },
            ],
        );

        // Nothing changed since the last flush.
        cache.write(0, 0x01, 0x01).unwrap();
        assert_eq!(cache.wr_flush().unwrap(), 0);

        // A change that is undone before the flush is not pushed.
        cache.write(3, 0x00, 0x80).unwrap();
        assert!(cache.is_wr_dirty(3));
        cache.write(3, 0x80, 0x80).unwrap();
        assert!(!cache.is_wr_dirty(3));
        assert_eq!(cache.wr_flush().unwrap(), 0);
        assert!(cache.hw().journal().is_empty());
    }

    #[test]
    fn test_force_all() {
        let mut cache = cache();
        cache.write(1, 0x42, 0xff).unwrap();
        cache.wr_force_all();
        assert_eq!(cache.wr_flush().unwrap(), 4);
        assert_eq!(cache.hw().stats().writes, 4);
        assert_eq!(cache.wr_flush().unwrap(), 0);
    }

    #[test]
    fn test_force_all_survives_later_writes() {
        let mut cache = cache();
        cache.wr_force_all();
        cache.write(2, 0x00, 0xff).unwrap();
        assert!(cache.is_wr_dirty(2));
        assert_eq!(cache.wr_flush().unwrap(), 4);

        cache.write(2, 0x00, 0xff).unwrap();
        assert!(!cache.is_wr_dirty(2));
    }

    #[test]
    fn test_read_fetches_once_until_invalidated() {
        let mut cache = cache();
        cache.hw_mut().poke(2, &[0x5a]);
        assert_eq!(cache.read(2).unwrap(), 0x5a);
        cache.hw_mut().poke(2, &[0xa5]);
        assert_eq!(cache.read(2).unwrap(), 0x5a);
        assert_eq!(cache.hw().stats().reads, 1);

        cache.rd_flush();
        assert!(cache.is_rd_stale(2));
        assert_eq!(cache.read(2).unwrap(), 0xa5);
        assert_eq!(cache.hw().stats().reads, 2);
    }

    #[test]
    fn test_out_of_range() {
        let mut cache = cache();
        assert!(matches!(
            cache.write(4, 1, 1),
            Err(Error::IndexOutOfRange { side: Side::Write, index: 4, len: 4 }),
        ));
        assert!(matches!(
            cache.read(4),
            Err(Error::IndexOutOfRange { side: Side::Read, index: 4, len: 4 }),
        ));
        assert_eq!(cache.wr_flush().unwrap(), 0);
        assert_eq!(cache.hw().stats(), BusStats::default());
    }

    #[test]
    fn test_raw_bypasses_shadow() {
        let mut cache = cache();
        cache.wr_raw(7, 0x11).unwrap();
        assert_eq!(cache.rd_raw(7).unwrap(), 0x11);
        assert!((0..4).all(|i| !cache.is_wr_dirty(i)));
        assert_eq!(cache.hw().stats().writes, 0);
    }
}
