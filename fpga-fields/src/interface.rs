use core::marker::PhantomData;

use log::trace;
use snafu::ensure;

use crate::bit_slicer::{read_bits, write_bits};
use crate::error::{FieldTooNarrowSnafu, Result, ValueTooWideSnafu, ZeroWidthSnafu};
use crate::hw_access::HwAccess;
use crate::layout::FieldId;
use crate::shadow::ShadowCache;
use crate::word::FieldValue;

/// Per-field access to an accelerator's registers.
///
/// `W` names the fields written to the accelerator and `R` the fields read back. Writes are
/// merged into a [`ShadowCache`] and reach the hardware on [`wr_flush`](Self::wr_flush); reads
/// see the hardware as of the last [`rd_flush`](Self::rd_flush).
#[derive(Debug)]
pub struct FieldInterface<H: HwAccess, W, R> {
    shadow: ShadowCache<H>,
    _fields: PhantomData<fn() -> (W, R)>,
}

impl<H: HwAccess, W: FieldId, R: FieldId> FieldInterface<H, W, R> {
    /// Binds the field tables to `hw`, sizing the shadow cache from their total widths.
    pub fn new(hw: H) -> Result<Self> {
        Ok(Self {
            shadow: ShadowCache::new(hw, W::TOTAL_BITS, R::TOTAL_BITS)?,
            _fields: PhantomData,
        })
    }

    /// Stages `value` for `field`. Fails if `value` has bits set at or above the field's width.
    pub fn write<V: FieldValue>(&mut self, field: W, value: V) -> Result<()> {
        let desc = field.desc();
        let value = value.to_bits();
        ensure!(
            desc.bit_width >= u128::BITS as usize || value >> desc.bit_width == 0,
            ValueTooWideSnafu {
                field: field.name(),
                value,
                bit_width: desc.bit_width,
            }
        );
        trace!("write {} = {value:#x}", field.name());
        write_bits(&mut self.shadow, desc.bit_offset, desc.bit_width, value)
    }

    /// Reads `field` as a `V`. Fails if the field is wider than `V`.
    pub fn read<V: FieldValue>(&mut self, field: R) -> Result<V> {
        let desc = field.desc();
        ensure!(
            desc.bit_width != 0,
            ZeroWidthSnafu {
                bit_offset: desc.bit_offset,
            }
        );
        ensure!(
            desc.bit_width <= V::BITS,
            FieldTooNarrowSnafu {
                field: field.name(),
                bit_width: desc.bit_width,
                dest_bits: V::BITS,
            }
        );
        let bits = read_bits(&mut self.shadow, desc.bit_offset, desc.bit_width, V::BITS)?;
        trace!("read {} = {bits:#x}", field.name());
        Ok(V::from_bits(bits))
    }

    /// Reads `field` into `value`, which is left untouched on failure.
    pub fn read_into<V: FieldValue>(&mut self, field: R, value: &mut V) -> Result<()> {
        *value = self.read(field)?;
        Ok(())
    }

    /// Pushes every changed write word to the hardware. Returns the number of words pushed.
    pub fn wr_flush(&mut self) -> Result<usize> {
        self.shadow.wr_flush()
    }

    /// Makes the next [`wr_flush`](Self::wr_flush) push every write word.
    pub fn wr_force_all(&mut self) {
        self.shadow.wr_force_all()
    }

    /// Discards cached reads so the next read of each word fetches it from the hardware.
    pub fn rd_flush(&mut self) {
        self.shadow.rd_flush()
    }

    /// Stores a raw word at `word_address` from the start of the register region.
    ///
    /// This bypasses the shadow cache entirely; a raw store to a word that also holds fields is
    /// not reflected in the cache.
    pub fn wr_raw(&mut self, word_address: usize, data: H::WrWord) -> Result<()> {
        self.shadow.wr_raw(word_address, data)
    }

    /// Loads a raw word at `word_address` from the start of the register region, bypassing the
    /// shadow cache.
    pub fn rd_raw(&mut self, word_address: usize) -> Result<H::RdWord> {
        self.shadow.rd_raw(word_address)
    }

    /// Returns the shadow cache.
    pub fn shadow(&self) -> &ShadowCache<H> {
        &self.shadow
    }

    /// Returns the backend.
    pub fn hw(&self) -> &H {
        self.shadow.hw()
    }

    /// Returns the backend mutably.
    pub fn hw_mut(&mut self) -> &mut H {
        self.shadow.hw_mut()
    }

    /// Releases the shadow cache and returns the backend.
    pub fn into_hw(self) -> H {
        self.shadow.into_hw()
    }
}
