use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use fpga_fields::Side;
use snafu::Snafu;

/// The error type for opening a UIO device.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum UioError {
    /// The device path has no final component to look up in sysfs.
    #[snafu(display("device path {} has no file name", path.display()))]
    DeviceName {
        /// The device path.
        path: PathBuf,
    },

    /// The device file could not be opened.
    #[snafu(display("could not open {}", path.display()))]
    Open {
        /// The device path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The sysfs map size attribute could not be read.
    #[snafu(display("could not read map size from {}", path.display()))]
    MapSizeRead {
        /// The attribute path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The sysfs map size attribute is not a number.
    #[snafu(display("could not parse map size {text:?} from {}", path.display()))]
    MapSizeParse {
        /// The attribute path.
        path: PathBuf,
        /// The attribute's trimmed content.
        text: String,
        /// The underlying error.
        source: ParseIntError,
    },

    /// The page size could not be queried.
    #[snafu(display("could not query the page size"))]
    PageSize {
        /// The underlying error.
        source: io::Error,
    },

    /// The register region could not be mapped.
    #[snafu(display("could not map {size:#x} bytes of {} at offset {offset:#x}", path.display()))]
    Map {
        /// The device path.
        path: PathBuf,
        /// The requested mapping length.
        size: usize,
        /// The requested file offset.
        offset: u64,
        /// The underlying error.
        source: io::Error,
    },

    /// A register bank does not start on a word boundary.
    #[snafu(display("{side} bank offset {offset:#x} is not aligned to {word_bytes}-byte words"))]
    MisalignedBank {
        /// The misaligned bank.
        side: Side,
        /// The bank's byte offset.
        offset: usize,
        /// The bank's word size in bytes.
        word_bytes: usize,
    },
}
