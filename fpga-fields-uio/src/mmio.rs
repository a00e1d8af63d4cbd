//! Single-instruction loads and stores of device words.

use core::ptr::{read_volatile, write_volatile};

use fpga_fields::BusWord;

/// A bus word the CPU can move to or from device memory in one access.
///
/// # Safety
///
/// Implementations must perform exactly one load or store of the full word, never split or
/// merged with neighbouring accesses.
pub unsafe trait MmioWord: BusWord {
    /// Stores `value` at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes and aligned to the word size.
    unsafe fn store(ptr: *mut Self, value: Self);

    /// Loads the word at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and aligned to the word size.
    unsafe fn load(ptr: *const Self) -> Self;
}

macro_rules! impl_volatile {
    ($($ty:ty),* $(,)?) => {
        $(
            unsafe impl MmioWord for $ty {
                #[inline(always)]
                unsafe fn store(ptr: *mut Self, value: Self) {
                    write_volatile(ptr, value)
                }

                #[inline(always)]
                unsafe fn load(ptr: *const Self) -> Self {
                    read_volatile(ptr)
                }
            }
        )*
    };
}

impl_volatile!(u8, u16, u32, u64);

// A volatile u128 access may be split into two 64-bit accesses, which the fabric sees as two
// transactions.
#[cfg(target_arch = "aarch64")]
unsafe impl MmioWord for u128 {
    #[inline(always)]
    unsafe fn store(ptr: *mut Self, value: Self) {
        core::arch::asm!(
            "stp {lo}, {hi}, [{ptr}]",
            ptr = in(reg) ptr,
            lo = in(reg) value as u64,
            hi = in(reg) (value >> 64) as u64,
            options(preserves_flags, nostack),
        )
    }

    #[inline(always)]
    unsafe fn load(ptr: *const Self) -> Self {
        let lo: u64;
        let hi: u64;
        core::arch::asm!(
            "ldp {lo}, {hi}, [{ptr}]",
            ptr = in(reg) ptr,
            lo = out(reg) lo,
            hi = out(reg) hi,
            options(preserves_flags, nostack, readonly),
        );
        (hi as u128) << 64 | lo as u128
    }
}

#[cfg(target_arch = "x86_64")]
unsafe impl MmioWord for u128 {
    #[inline(always)]
    unsafe fn store(ptr: *mut Self, value: Self) {
        let value: core::arch::x86_64::__m128i = core::mem::transmute(value);
        core::arch::asm!(
            "movdqa xmmword ptr [{ptr}], {value}",
            ptr = in(reg) ptr,
            value = in(xmm_reg) value,
            options(preserves_flags, nostack),
        )
    }

    #[inline(always)]
    unsafe fn load(ptr: *const Self) -> Self {
        let value: core::arch::x86_64::__m128i;
        core::arch::asm!(
            "movdqa {value}, xmmword ptr [{ptr}]",
            ptr = in(reg) ptr,
            value = out(xmm_reg) value,
            options(preserves_flags, nostack, readonly),
        );
        core::mem::transmute(value)
    }
}
