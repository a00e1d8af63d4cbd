use log::debug;

use crate::error::Result;
use crate::hw_access::HwAccess;

/// A backend decorator that logs every call at `debug` level before forwarding it.
#[derive(Clone, Debug)]
pub struct Logging<H> {
    inner: H,
    label: &'static str,
}

impl<H: HwAccess> Logging<H> {
    /// Wraps `inner`, prefixing log lines with `label`.
    pub fn new(inner: H, label: &'static str) -> Self {
        debug!("{label}: open");
        Self { inner, label }
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Returns the wrapped backend mutably.
    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }
}

impl<H: HwAccess> HwAccess for Logging<H> {
    type WrWord = H::WrWord;
    type RdWord = H::RdWord;

    fn init(&mut self, wr_bits: usize, rd_bits: usize) -> Result<()> {
        debug!("{}: init(wr_bits={wr_bits}, rd_bits={rd_bits})", self.label);
        self.inner.init(wr_bits, rd_bits)
    }

    fn wr(&mut self, word_offset: usize, data: H::WrWord) -> Result<()> {
        debug!("{}: wr({word_offset}, {data:#x})", self.label);
        self.inner.wr(word_offset, data)
    }

    fn rd(&mut self, word_offset: usize) -> Result<H::RdWord> {
        let data = self.inner.rd(word_offset)?;
        debug!("{}: rd({word_offset}) = {data:#x}", self.label);
        Ok(data)
    }

    fn wr_raw(&mut self, word_address: usize, data: H::WrWord) -> Result<()> {
        debug!("{}: wr_raw({word_address:#x}, {data:#x})", self.label);
        self.inner.wr_raw(word_address, data)
    }

    fn rd_raw(&mut self, word_address: usize) -> Result<H::RdWord> {
        let data = self.inner.rd_raw(word_address)?;
        debug!("{}: rd_raw({word_address:#x}) = {data:#x}", self.label);
        Ok(data)
    }
}

impl<H> Drop for Logging<H> {
    fn drop(&mut self) {
        debug!("{}: closed", self.label);
    }
}
