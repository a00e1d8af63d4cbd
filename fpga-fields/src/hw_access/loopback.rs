use alloc::vec;
use alloc::vec::Vec;
use core::marker::PhantomData;
use core::mem::take;

use snafu::ensure;

use crate::error::{
    AddressOutOfRangeSnafu, MisalignedBankSnafu, RegionTooSmallSnafu, Result, Side,
};
use crate::hw_access::HwAccess;
use crate::layout::words_for;
use crate::word::BusWord;

/// Transaction counts observed by a [`Loopback`] backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Bank-relative word stores.
    pub writes: usize,
    /// Bank-relative word loads.
    pub reads: usize,
    /// Raw word stores.
    pub raw_writes: usize,
    /// Raw word loads.
    pub raw_reads: usize,
}

/// A bank-relative transaction recorded by a [`Loopback`] backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transaction {
    /// A store to the write bank.
    Write {
        /// The bank-relative word offset.
        word_offset: usize,
        /// The stored word, widened.
        data: u128,
    },
    /// A load from the read bank.
    Read {
        /// The bank-relative word offset.
        word_offset: usize,
    },
}

/// An in-memory register region whose read bank echoes its write bank.
///
/// The region is a little-endian byte image. Both banks start at the same byte offset, so a
/// word read back covers exactly the bits written there, even when the write and read words
/// differ in width. Every bank transaction is counted and journaled, which makes the backend a
/// convenient stand-in for hardware in tests and dry runs.
#[derive(Clone, Debug)]
pub struct Loopback<W, R> {
    image: Vec<u8>,
    bank_offset: usize,
    stats: BusStats,
    journal: Vec<Transaction>,
    _words: PhantomData<fn() -> (W, R)>,
}

impl<W: BusWord, R: BusWord> Loopback<W, R> {
    /// Creates a zeroed region of `region_bytes` bytes with both banks at `bank_offset`.
    ///
    /// The bank offset must be a multiple of both word sizes.
    pub fn new(region_bytes: usize, bank_offset: usize) -> Result<Self> {
        for word_bytes in [W::BYTES, R::BYTES] {
            ensure!(
                bank_offset % word_bytes == 0,
                MisalignedBankSnafu {
                    offset: bank_offset,
                    word_bytes,
                }
            );
        }
        Ok(Self {
            image: vec![0; region_bytes],
            bank_offset,
            stats: BusStats::default(),
            journal: Vec::new(),
            _words: PhantomData,
        })
    }

    /// Returns the transaction counts so far.
    pub fn stats(&self) -> BusStats {
        self.stats
    }

    /// Returns the bank transactions so far, oldest first.
    pub fn journal(&self) -> &[Transaction] {
        &self.journal
    }

    /// Returns and clears the bank transactions so far.
    pub fn take_journal(&mut self) -> Vec<Transaction> {
        take(&mut self.journal)
    }

    /// Returns the whole region.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Overwrites region bytes as the hardware would, without recording a transaction.
    ///
    /// # Panics
    ///
    /// Panics if the bytes extend past the end of the region.
    pub fn poke(&mut self, byte_offset: usize, bytes: &[u8]) {
        self.image[byte_offset..byte_offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Returns write-bank word `word_offset` without recording a transaction.
    pub fn peek_wr(&self, word_offset: usize) -> W {
        let start = self.bank_offset + word_offset * W::BYTES;
        W::read_le_bytes(&self.image[start..start + W::BYTES])
    }

    fn store(&mut self, word_address: usize, data: W) -> Result<()> {
        let len = self.image.len() / W::BYTES;
        ensure!(
            word_address < len,
            AddressOutOfRangeSnafu {
                side: Side::Write,
                address: word_address,
                len,
            }
        );
        let start = word_address * W::BYTES;
        data.write_le_bytes(&mut self.image[start..start + W::BYTES]);
        Ok(())
    }

    fn load(&self, word_address: usize) -> Result<R> {
        let len = self.image.len() / R::BYTES;
        ensure!(
            word_address < len,
            AddressOutOfRangeSnafu {
                side: Side::Read,
                address: word_address,
                len,
            }
        );
        let start = word_address * R::BYTES;
        Ok(R::read_le_bytes(&self.image[start..start + R::BYTES]))
    }
}

impl<W: BusWord, R: BusWord> HwAccess for Loopback<W, R> {
    type WrWord = W;
    type RdWord = R;

    fn init(&mut self, wr_bits: usize, rd_bits: usize) -> Result<()> {
        let available = self.image.len();
        for (side, needed) in [
            (Side::Write, words_for(wr_bits, W::BITS) * W::BYTES),
            (Side::Read, words_for(rd_bits, R::BITS) * R::BYTES),
        ] {
            let needed = self.bank_offset + needed;
            ensure!(
                needed <= available,
                RegionTooSmallSnafu {
                    side,
                    needed,
                    available,
                }
            );
        }
        Ok(())
    }

    fn wr(&mut self, word_offset: usize, data: W) -> Result<()> {
        self.store(self.bank_offset / W::BYTES + word_offset, data)?;
        self.stats.writes += 1;
        self.journal.push(Transaction::Write {
            word_offset,
            data: data.to_u128(),
        });
        Ok(())
    }

    fn rd(&mut self, word_offset: usize) -> Result<R> {
        let data = self.load(self.bank_offset / R::BYTES + word_offset)?;
        self.stats.reads += 1;
        self.journal.push(Transaction::Read { word_offset });
        Ok(data)
    }

    fn wr_raw(&mut self, word_address: usize, data: W) -> Result<()> {
        self.store(word_address, data)?;
        self.stats.raw_writes += 1;
        Ok(())
    }

    fn rd_raw(&mut self, word_address: usize) -> Result<R> {
        let data = self.load(word_address)?;
        self.stats.raw_reads += 1;
        Ok(data)
    }
}
