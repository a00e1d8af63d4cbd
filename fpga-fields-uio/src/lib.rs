//! A [`HwAccess`] backend for accelerators exposed through the Linux userspace I/O framework.
//!
//! The device's register map is mapped into the process once, at [`UioBackend::open`], and every
//! word transfer is a single load or store through that mapping. The mapping and the device file
//! are released when the backend is dropped.

#![cfg(unix)]
#![deny(missing_docs)]

mod error;
mod mmio;
pub mod sysfs;

use std::fs::{File, OpenOptions};
use std::io;
use std::marker::PhantomData;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use fpga_fields::layout::words_for;
use fpga_fields::{Error, HwAccess, Side};
use log::debug;
use memmap::{MmapMut, MmapOptions};
use snafu::{ensure, ResultExt};

pub use crate::error::UioError;
pub use crate::mmio::MmioWord;
use crate::error::{MapSnafu, MisalignedBankSnafu, OpenSnafu, PageSizeSnafu};

/// Where to find an accelerator's registers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UioConfig {
    /// The UIO device file.
    pub device: PathBuf,
    /// Which of the device's maps holds the registers.
    pub map_index: usize,
    /// Byte offset of the write bank within the map.
    pub wr_bank_offset: usize,
    /// Byte offset of the read bank within the map.
    pub rd_bank_offset: usize,
    /// The directory holding the UIO class attributes.
    pub sysfs_root: PathBuf,
}

impl Default for UioConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/uio4"),
            map_index: 0,
            wr_bank_offset: 0x80,
            rd_bank_offset: 0x80,
            sysfs_root: PathBuf::from("/sys/class/uio"),
        }
    }
}

/// A register region mapped from a UIO device, moving `W` words out and `R` words in.
#[derive(Debug)]
pub struct UioBackend<W, R> {
    // Declared before `_file` so the region is unmapped before the device is closed.
    map: MmapMut,
    _file: File,
    device: PathBuf,
    wr_bank_offset: usize,
    rd_bank_offset: usize,
    _words: PhantomData<fn() -> (W, R)>,
}

impl<W: MmioWord, R: MmioWord> UioBackend<W, R> {
    /// Opens `config.device` and maps its register region.
    pub fn open(config: &UioConfig) -> Result<Self, UioError> {
        for (side, offset, word_bytes) in [
            (Side::Write, config.wr_bank_offset, W::BYTES),
            (Side::Read, config.rd_bank_offset, R::BYTES),
        ] {
            ensure!(
                offset % word_bytes == 0,
                MisalignedBankSnafu {
                    side,
                    offset,
                    word_bytes,
                }
            );
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&config.device)
            .context(OpenSnafu {
                path: &config.device,
            })?;
        let size = sysfs::map_size(&config.sysfs_root, &config.device, config.map_index)?;
        let offset = (config.map_index * page_size()?) as u64;

        // SAFETY: The mapping is device memory that nothing else in this process aliases. It is
        // only accessed through the volatile word primitives.
        let map = unsafe { MmapOptions::new().offset(offset).len(size).map_mut(&file) }
            .context(MapSnafu {
                path: &config.device,
                size,
                offset,
            })?;
        debug!(
            "uio: mapped {size:#x} bytes of {} map {} (write bank {:#x}, read bank {:#x})",
            config.device.display(),
            config.map_index,
            config.wr_bank_offset,
            config.rd_bank_offset,
        );

        Ok(Self {
            map,
            _file: file,
            device: config.device.clone(),
            wr_bank_offset: config.wr_bank_offset,
            rd_bank_offset: config.rd_bank_offset,
            _words: PhantomData,
        })
    }

    /// Returns the device path.
    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Returns the length of the mapped region in bytes.
    pub fn map_len(&self) -> usize {
        self.map.len()
    }

    fn store(&mut self, word_address: usize, data: W) -> fpga_fields::Result<()> {
        let len = self.map.len() / W::BYTES;
        if word_address >= len {
            return Err(Error::AddressOutOfRange {
                side: Side::Write,
                address: word_address,
                len,
            });
        }
        // SAFETY: In bounds, and aligned because the mapping is page aligned.
        unsafe { W::store(self.map.as_mut_ptr().cast::<W>().add(word_address), data) };
        Ok(())
    }

    fn load(&self, word_address: usize) -> fpga_fields::Result<R> {
        let len = self.map.len() / R::BYTES;
        if word_address >= len {
            return Err(Error::AddressOutOfRange {
                side: Side::Read,
                address: word_address,
                len,
            });
        }
        // SAFETY: In bounds, and aligned because the mapping is page aligned.
        Ok(unsafe { R::load(self.map.as_ptr().cast::<R>().add(word_address)) })
    }
}

impl<W: MmioWord, R: MmioWord> HwAccess for UioBackend<W, R> {
    type WrWord = W;
    type RdWord = R;

    fn init(&mut self, wr_bits: usize, rd_bits: usize) -> fpga_fields::Result<()> {
        let available = self.map.len();
        for (side, offset, bytes) in [
            (Side::Write, self.wr_bank_offset, words_for(wr_bits, W::BITS) * W::BYTES),
            (Side::Read, self.rd_bank_offset, words_for(rd_bits, R::BITS) * R::BYTES),
        ] {
            let needed = offset + bytes;
            if needed > available {
                return Err(Error::RegionTooSmall {
                    side,
                    needed,
                    available,
                });
            }
        }
        Ok(())
    }

    fn wr(&mut self, word_offset: usize, data: W) -> fpga_fields::Result<()> {
        self.store(self.wr_bank_offset / W::BYTES + word_offset, data)
    }

    fn rd(&mut self, word_offset: usize) -> fpga_fields::Result<R> {
        self.load(self.rd_bank_offset / R::BYTES + word_offset)
    }

    fn wr_raw(&mut self, word_address: usize, data: W) -> fpga_fields::Result<()> {
        self.store(word_address, data)
    }

    fn rd_raw(&mut self, word_address: usize) -> fpga_fields::Result<R> {
        self.load(word_address)
    }
}

impl<W, R> Drop for UioBackend<W, R> {
    fn drop(&mut self) {
        debug!("uio: unmapping {}", self.device.display());
    }
}

fn page_size() -> Result<usize, UioError> {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        return Err(io::Error::last_os_error()).context(PageSizeSnafu);
    }
    Ok(size as usize)
}
