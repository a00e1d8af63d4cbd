//! The hardware access contract and the in-tree backends.
//!
//! A backend moves single atomic words between the host and a register region. It owns no
//! cache: the [`ShadowCache`](crate::ShadowCache) above it decides which words to move. Word
//! offsets passed to [`wr`](HwAccess::wr) and [`rd`](HwAccess::rd) are relative to the
//! backend's write and read banks; raw addresses are relative to the start of the region.

use alloc::boxed::Box;

use crate::error::Result;
use crate::word::BusWord;

mod logging;
mod loopback;

pub use self::logging::Logging;
pub use self::loopback::{BusStats, Loopback, Transaction};

/// Word-level access to an accelerator's register region.
pub trait HwAccess {
    /// The atomic write word.
    type WrWord: BusWord;
    /// The atomic read word.
    type RdWord: BusWord;

    /// Prepares the backend for a packed image of `wr_bits` write bits and `rd_bits` read bits.
    ///
    /// Called once, before any other method, by [`ShadowCache::new`](crate::ShadowCache::new).
    fn init(&mut self, wr_bits: usize, rd_bits: usize) -> Result<()> {
        let _ = (wr_bits, rd_bits);
        Ok(())
    }

    /// Stores word `word_offset` of the write bank.
    fn wr(&mut self, word_offset: usize, data: Self::WrWord) -> Result<()>;

    /// Loads word `word_offset` of the read bank.
    fn rd(&mut self, word_offset: usize) -> Result<Self::RdWord>;

    /// Stores a write-sized word at `word_address` from the start of the region.
    fn wr_raw(&mut self, word_address: usize, data: Self::WrWord) -> Result<()>;

    /// Loads a read-sized word at `word_address` from the start of the region.
    fn rd_raw(&mut self, word_address: usize) -> Result<Self::RdWord>;
}

impl<H: HwAccess + ?Sized> HwAccess for &mut H {
    type WrWord = H::WrWord;
    type RdWord = H::RdWord;

    fn init(&mut self, wr_bits: usize, rd_bits: usize) -> Result<()> {
        (**self).init(wr_bits, rd_bits)
    }

    fn wr(&mut self, word_offset: usize, data: Self::WrWord) -> Result<()> {
        (**self).wr(word_offset, data)
    }

    fn rd(&mut self, word_offset: usize) -> Result<Self::RdWord> {
        (**self).rd(word_offset)
    }

    fn wr_raw(&mut self, word_address: usize, data: Self::WrWord) -> Result<()> {
        (**self).wr_raw(word_address, data)
    }

    fn rd_raw(&mut self, word_address: usize) -> Result<Self::RdWord> {
        (**self).rd_raw(word_address)
    }
}

impl<H: HwAccess + ?Sized> HwAccess for Box<H> {
    type WrWord = H::WrWord;
    type RdWord = H::RdWord;

    fn init(&mut self, wr_bits: usize, rd_bits: usize) -> Result<()> {
        (**self).init(wr_bits, rd_bits)
    }

    fn wr(&mut self, word_offset: usize, data: Self::WrWord) -> Result<()> {
        (**self).wr(word_offset, data)
    }

    fn rd(&mut self, word_offset: usize) -> Result<Self::RdWord> {
        (**self).rd(word_offset)
    }

    fn wr_raw(&mut self, word_address: usize, data: Self::WrWord) -> Result<()> {
        (**self).wr_raw(word_address, data)
    }

    fn rd_raw(&mut self, word_address: usize) -> Result<Self::RdWord> {
        (**self).rd_raw(word_address)
    }
}
