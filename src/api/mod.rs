//! Purpose: Define the public Rust API boundary for autojson.
//! Exports: Façade operations, their option types, and the shared error type.
//! Role: Public, additive-only surface; hides the path and codec helpers.
//! Invariants: This module is the only public path to the core helpers.
//! Invariants: Every operation is synchronous and keeps no state between calls.

mod collect;
mod file;
mod options;

pub use crate::core::codec::Encoding;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorClass, ErrorKind};
pub use collect::{Collection, SkippedFile, auto};
pub use file::{
    create, create_with, delete, delete_if_exists, exists, read, read_as, update, write,
};
pub use options::{AutoOptions, CreateOptions, ErrorPolicy, KeyStyle, UpdateOptions, WriteOptions};

pub type ApiResult<T> = Result<T, Error>;

/// Encodes `document` to bytes exactly as [`write`] would store it.
pub fn to_vec<T: serde::Serialize + ?Sized>(document: &T, encoding: &Encoding) -> ApiResult<Vec<u8>> {
    crate::core::codec::encode(document, encoding)
}
