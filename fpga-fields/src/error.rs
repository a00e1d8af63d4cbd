use core::fmt::{self, Display, Formatter};

use snafu::Snafu;

/// Which half of the register image an operation touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Words written to the accelerator.
    Write,
    /// Words read back from the accelerator.
    Read,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Write => write!(f, "write"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// The error type for field, cache, and backend operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// A value written to a field has bits set at or above the field's width.
    #[snafu(display("value {value:#x} does not fit in {bit_width}-bit field {field}"))]
    ValueTooWide {
        /// The field's name.
        field: &'static str,
        /// The rejected value.
        value: u128,
        /// The field's width in bits.
        bit_width: usize,
    },

    /// A field is wider than the integer it is being read into.
    #[snafu(display("{bit_width}-bit field {field} does not fit in a {dest_bits}-bit destination"))]
    FieldTooNarrow {
        /// The field's name.
        field: &'static str,
        /// The field's width in bits.
        bit_width: usize,
        /// The width of the destination type in bits.
        dest_bits: usize,
    },

    /// A bit range is wider than the integer it is being read into.
    #[snafu(display("cannot read {bit_width} bits into a {dest_bits}-bit destination"))]
    TooNarrow {
        /// The requested width in bits.
        bit_width: usize,
        /// The width of the destination type in bits.
        dest_bits: usize,
    },

    /// A read of zero bits was requested.
    #[snafu(display("zero-width read at bit offset {bit_offset}"))]
    ZeroWidth {
        /// The requested bit offset.
        bit_offset: usize,
    },

    /// A shadow cache word index is outside the allocated range.
    #[snafu(display("{side} word index {index} out of range for {len} cached words"))]
    IndexOutOfRange {
        /// The side that was accessed.
        side: Side,
        /// The rejected index.
        index: usize,
        /// The number of allocated words.
        len: usize,
    },

    /// A backend word address is outside the register region.
    #[snafu(display("{side} word address {address:#x} outside a region of {len} words"))]
    AddressOutOfRange {
        /// The side that was accessed.
        side: Side,
        /// The rejected word address.
        address: usize,
        /// The region size in words of that side.
        len: usize,
    },

    /// A backend cannot hold the requested register bank.
    #[snafu(display("{side} bank needs {needed} bytes but the region has {available}"))]
    RegionTooSmall {
        /// The side whose bank does not fit.
        side: Side,
        /// Bytes needed from the start of the region.
        needed: usize,
        /// Bytes available in the region.
        available: usize,
    },

    /// A register bank does not start on a word boundary.
    #[snafu(display("bank offset {offset:#x} is not aligned to {word_bytes}-byte words"))]
    MisalignedBank {
        /// The bank's byte offset.
        offset: usize,
        /// The word size in bytes.
        word_bytes: usize,
    },
}

/// A specialized [`Result`](core::result::Result) type for this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "std")]
    #[test]
    fn test_errors_are_std_errors() {
        fn boxed<E>(error: E) -> Box<dyn std::error::Error + Send + Sync>
        where
            E: std::error::Error + Send + Sync + 'static,
        {
            Box::new(error)
        }
        let error = boxed(Error::ZeroWidth { bit_offset: 3 });
        assert_eq!(error.to_string(), "zero-width read at bit offset 3");
    }

    #[test]
    fn test_display() {
        let error = Error::RegionTooSmall {
            side: Side::Read,
            needed: 0x110,
            available: 0x100,
        };
        assert_eq!(
            alloc::format!("{error}"),
            "read bank needs 272 bytes but the region has 256",
        );
    }
}
