#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

extern crate alloc;

#[macro_use]
mod macros;

pub mod bit_math;
pub mod bit_slicer;
mod error;
pub mod hw_access;
mod interface;
pub mod layout;
pub mod prelude;
pub mod shadow;
mod word;

pub use crate::error::{Error, Result, Side};
pub use crate::hw_access::HwAccess;
pub use crate::interface::FieldInterface;
pub use crate::layout::{FieldDesc, FieldId, FieldSpec};
pub use crate::shadow::ShadowCache;
pub use crate::word::{BusWord, FieldValue};
