//! Convenience re-exports.

#[doc(no_inline)]
pub use crate::{
    field_table, BusWord, FieldDesc, FieldId, FieldInterface, FieldSpec, FieldValue, HwAccess,
};
