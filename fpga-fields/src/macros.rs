/// Declares a field identifier enum and its ordered field widths.
///
/// The enum is `#[repr(usize)]` and implements [`FieldId`](crate::FieldId) with a layout planned
/// at compile time. The `widths` list must name every variant exactly once, in declaration
/// order; anything else is rejected while compiling. Widths are arbitrary constant expressions,
/// typically derived with [`bit_math`](crate::bit_math).
///
/// # Examples
///
/// ```
/// use fpga_fields::prelude::*;
///
/// const COUNTER_BITS: usize = fpga_fields::bit_math::bits_needed(1000);
///
/// field_table! {
///     /// Fields written to the accelerator.
///     pub enum WrField {
///         Enable,
///         Counter,
///     }
///
///     widths {
///         Enable: 1,
///         Counter: COUNTER_BITS,
///     }
/// }
///
/// assert_eq!(WrField::Counter.desc(), FieldDesc { bit_offset: 1, bit_width: 10 });
/// assert_eq!(WrField::TOTAL_BITS, 11);
/// assert_eq!(WrField::Counter.name(), "Counter");
/// ```
///
/// Widths listed out of declaration order do not compile:
///
/// ```compile_fail
/// use fpga_fields::prelude::*;
///
/// field_table! {
///     pub enum WrField {
///         Enable,
///         Counter,
///     }
///
///     widths {
///         Counter: 10,
///         Enable: 1,
///     }
/// }
/// ```
///
/// Neither does a table that leaves a field out:
///
/// ```compile_fail
/// use fpga_fields::prelude::*;
///
/// field_table! {
///     pub enum WrField {
///         Enable,
///         Counter,
///     }
///
///     widths {
///         Enable: 1,
///     }
/// }
/// ```
#[macro_export]
macro_rules! field_table {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_attr:meta])*
                $variant:ident
            ),*
            $(,)?
        }

        widths {
            $($spec_id:ident: $width:expr),*
            $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(usize)]
        $vis enum $name {
            $(
                $(#[$variant_attr])*
                $variant,
            )*
        }

        const _: () = {
            assert!(
                [$($name::$spec_id as usize),*].len() == [$($name::$variant as usize),*].len(),
                concat!(
                    "field table ",
                    stringify!($name),
                    " must list a width for every field",
                ),
            );
            assert!(
                $crate::layout::ids_in_order(&[$($name::$spec_id as usize),*]),
                concat!(
                    "field table ",
                    stringify!($name),
                    " lists widths out of declaration order",
                ),
            );
        };

        impl $crate::FieldId for $name {
            const COUNT: usize = [$(Self::$variant),*].len();
            const ALL: &'static [Self] = &[$(Self::$variant),*];
            const SPECS: &'static [$crate::FieldSpec<Self>] = &[$(
                $crate::FieldSpec { id: Self::$spec_id, width: $width },
            )*];
            const DESCS: &'static [$crate::FieldDesc] = &$crate::layout::plan(&[$(
                $crate::FieldSpec { id: Self::$spec_id, width: $width },
            )*]);
            const TOTAL_BITS: usize = $crate::layout::total_bits(Self::SPECS);

            #[inline(always)]
            fn index(self) -> usize {
                self as usize
            }

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }
        }
    };
}
