//! Register layout of the LinkRunCCA connected-component accelerator.
//!
//! The accelerator consumes one labelled pixel per clock and emits a feature record whenever a
//! run-linked component closes. Accumulator widths are sized from the frame geometry the same
//! way the HDL sizes them.

use fpga_fields::bit_math::{bits_needed, cross_sum, range_sum, range_sum_of_squares};
use fpga_fields::field_table;

/// Pixels per line.
pub const X_SIZE: usize = 1024;
/// Bits of the line counter.
pub const Y_BITS: usize = 16;

pub const X_BITS: usize = bits_needed(X_SIZE as u128 - 1);
pub const Y_LOW_BITS: usize = Y_BITS - 1;
pub const Y_SIZE: usize = 1 << Y_BITS;
pub const Y_LOW_SIZE: usize = 1 << Y_LOW_BITS;
pub const Y_LOW_MAX: usize = Y_LOW_SIZE - 1;

pub const N_SEG_SUM_BITS: usize = bits_needed(X_SIZE as u128 * Y_LOW_SIZE as u128);
pub const X2_SUM_BITS: usize =
    bits_needed(range_sum_of_squares(0, X_SIZE as u128 - 1) * Y_SIZE as u128);
pub const YLOW2_SUM_BITS: usize =
    bits_needed(range_sum_of_squares(0, Y_LOW_MAX as u128) * X_SIZE as u128);
pub const XYLOW_SUM_BITS: usize =
    bits_needed(cross_sum(0, X_SIZE as u128 - 1, 0, Y_LOW_MAX as u128));
pub const X_SEG_SUM_BITS: usize =
    bits_needed(range_sum(0, X_SIZE as u128 - 1) * Y_LOW_SIZE as u128);
pub const YLOW_SEG_SUM_BITS: usize =
    bits_needed(range_sum(0, Y_LOW_MAX as u128) * X_SIZE as u128);

field_table! {
    /// Fields the host drives, one pixel per strobe.
    pub enum WrField {
        Rst,
        DataValid,
        InLabel,
        X,
        Y,
        HasRed,
        HasGreen,
        HasBlue,
    }

    widths {
        Rst: 1,
        DataValid: 1,
        InLabel: 1,
        X: X_BITS,
        Y: Y_BITS,
        HasRed: 1,
        HasGreen: 1,
        HasBlue: 1,
    }
}

field_table! {
    /// Fields of the most recent feature record.
    pub enum RdField {
        Valid,
        XLeft,
        XRight,
        YTopSeg0,
        YTopSeg1,
        YBottomSeg0,
        YBottomSeg1,
        X2Sum,
        Ylow2Sum,
        XylowSum,
        XSeg0Sum,
        XSeg1Sum,
        YlowSeg0Sum,
        YlowSeg1Sum,
        NSeg0Sum,
        NSeg1Sum,
    }

    widths {
        Valid: 1,
        XLeft: X_BITS,
        XRight: X_BITS,
        YTopSeg0: Y_LOW_BITS,
        YTopSeg1: Y_LOW_BITS,
        YBottomSeg0: Y_LOW_BITS,
        YBottomSeg1: Y_LOW_BITS,
        X2Sum: X2_SUM_BITS,
        Ylow2Sum: YLOW2_SUM_BITS,
        XylowSum: XYLOW_SUM_BITS,
        XSeg0Sum: X_SEG_SUM_BITS,
        XSeg1Sum: X_SEG_SUM_BITS,
        YlowSeg0Sum: YLOW_SEG_SUM_BITS,
        YlowSeg1Sum: YLOW_SEG_SUM_BITS,
        NSeg0Sum: N_SEG_SUM_BITS,
        NSeg1Sum: N_SEG_SUM_BITS,
    }
}

#[cfg(test)]
mod tests {
    use fpga_fields::{FieldDesc, FieldId};

    use super::*;

    #[test]
    fn test_derived_widths() {
        assert_eq!(X_BITS, 10);
        assert_eq!(Y_LOW_BITS, 15);
        assert_eq!(N_SEG_SUM_BITS, 26);
        assert_eq!(X2_SUM_BITS, 45);
        assert_eq!(YLOW2_SUM_BITS, 54);
        assert_eq!(XYLOW_SUM_BITS, 48);
        assert_eq!(X_SEG_SUM_BITS, 34);
        assert_eq!(YLOW_SEG_SUM_BITS, 39);
    }

    #[test]
    fn test_totals() {
        assert_eq!(WrField::TOTAL_BITS, 32);
        assert_eq!(RdField::TOTAL_BITS, 426);
        assert_eq!(WrField::COUNT, 8);
        assert_eq!(RdField::COUNT, 16);
    }

    #[test]
    fn test_offsets() {
        assert_eq!(WrField::X.desc(), FieldDesc { bit_offset: 3, bit_width: 10 });
        assert_eq!(WrField::Y.desc(), FieldDesc { bit_offset: 13, bit_width: 16 });
        assert_eq!(WrField::HasBlue.desc(), FieldDesc { bit_offset: 31, bit_width: 1 });
        assert_eq!(RdField::X2Sum.desc(), FieldDesc { bit_offset: 81, bit_width: 45 });
        assert_eq!(RdField::NSeg1Sum.desc().end(), 426);
    }
}
