//! Compile-time field layout.
//!
//! A field table is an ordered list of [`FieldSpec`]s. Planning it assigns each field a bit
//! offset equal to the sum of the widths declared before it, so the fields tile a contiguous
//! bit image with no gaps. Everything here is a `const fn` so layouts are computed and checked
//! while compiling; see [`field_table!`](crate::field_table) for the usual way to declare one.

use core::fmt::Debug;
use core::hash::Hash;

/// One entry of a field table: a field identifier and its width in bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSpec<F> {
    /// The field identifier.
    pub id: F,
    /// The field width in bits.
    pub width: usize,
}

/// The planned position of a field within the packed bit image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldDesc {
    /// The offset of the field's least significant bit.
    pub bit_offset: usize,
    /// The field width in bits.
    pub bit_width: usize,
}

impl FieldDesc {
    /// Returns the offset one past the field's most significant bit.
    pub const fn end(&self) -> usize {
        self.bit_offset + self.bit_width
    }
}

/// Assigns each field its bit offset.
///
/// The offset of field `i` is the sum of the widths of fields `0..i`; widths are copied
/// unchanged.
pub const fn plan<F: Copy, const N: usize>(specs: &[FieldSpec<F>; N]) -> [FieldDesc; N] {
    let mut descs = [FieldDesc {
        bit_offset: 0,
        bit_width: 0,
    }; N];
    let mut bit_offset = 0;
    let mut i = 0;
    while i < N {
        descs[i] = FieldDesc {
            bit_offset,
            bit_width: specs[i].width,
        };
        bit_offset += specs[i].width;
        i += 1;
    }
    descs
}

/// Returns the total width of a field table in bits.
pub const fn total_bits<F: Copy>(specs: &[FieldSpec<F>]) -> usize {
    let mut bits = 0;
    let mut i = 0;
    while i < specs.len() {
        bits += specs[i].width;
        i += 1;
    }
    bits
}

/// Checks that `ids[i] == i` for every entry, i.e. that a field table lists its fields in
/// declaration order.
pub const fn ids_in_order(ids: &[usize]) -> bool {
    let mut i = 0;
    while i < ids.len() {
        if ids[i] != i {
            return false;
        }
        i += 1;
    }
    true
}

/// Returns the number of `word_bits`-wide words needed to hold `bits` bits.
pub const fn words_for(bits: usize, word_bits: usize) -> usize {
    (bits + word_bits - 1) / word_bits
}

/// A field identifier with a planned layout.
///
/// Implementations are generated by [`field_table!`](crate::field_table), which also checks at
/// compile time that [`SPECS`](Self::SPECS) lists every field exactly once, in declaration
/// order.
pub trait FieldId: Copy + Debug + Eq + Hash + 'static {
    /// The number of fields.
    const COUNT: usize;
    /// Every field, in declaration order.
    const ALL: &'static [Self];
    /// The field table, in declaration order.
    const SPECS: &'static [FieldSpec<Self>];
    /// The planned layout, indexed by [`index`](Self::index).
    const DESCS: &'static [FieldDesc];
    /// The total width of the table in bits.
    const TOTAL_BITS: usize;

    /// Returns the field's position in declaration order.
    fn index(self) -> usize;

    /// Returns the field's declared name.
    fn name(self) -> &'static str;

    /// Returns the field's planned layout.
    fn desc(self) -> FieldDesc {
        Self::DESCS[self.index()]
    }
}
