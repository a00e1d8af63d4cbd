//! Closed-form bit-width arithmetic for sizing accumulator fields.
//!
//! Accelerator designs often size an accumulator register from the worst-case sum it can hold,
//! for example the sum of `x * x` over every column of a frame. These functions mirror that
//! arithmetic so a field table can derive the same widths from the same generics. Every
//! intermediate is a `u128`; when evaluated in a const context an overflow is a compile error
//! rather than a silently wrong width.

/// Returns the number of bits needed to represent `value`.
///
/// This is the smallest `b` such that `value < 2^b`, so `bits_needed(0) == 0`.
pub const fn bits_needed(value: u128) -> usize {
    (u128::BITS - value.leading_zeros()) as usize
}

/// Returns the sum of the integers in `a..=b`.
pub const fn range_sum(a: u128, b: u128) -> u128 {
    (b - a + 1) * (a + b) / 2
}

/// Returns the sum of the squares of the integers in `a..=b`.
pub const fn range_sum_of_squares(a: u128, b: u128) -> u128 {
    let below = if a == 0 {
        0
    } else {
        sum_of_squares_to(a - 1)
    };
    sum_of_squares_to(b) - below
}

/// Returns `range_sum(a, b) * range_sum(c, d)`, the sum of `x * y` over the rectangle
/// `a..=b` by `c..=d`.
pub const fn cross_sum(a: u128, b: u128, c: u128, d: u128) -> u128 {
    range_sum(a, b) * range_sum(c, d)
}

const fn sum_of_squares_to(n: u128) -> u128 {
    n * (n + 1) * (2 * n + 1) / 6
}
