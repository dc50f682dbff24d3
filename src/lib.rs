//! Reads and writes fixed-width primitives and text strings over seekable
//! byte streams, in an explicitly chosen byte order that is independent of
//! the host CPU's endianness.
//!
//! The crate is built for binary formats whose layout is defined by a
//! foreign byte order: game assets, network captures, legacy file formats.
//! [`EndianReader`] and [`EndianWriter`] are symmetric decorators over any
//! `std::io` stream; the pure conversion primitives they are built on live
//! in [`convert`].
//!
//! # References
//! * <https://learn.microsoft.com/en-us/dotnet/api/system.buffers.binary.binaryprimitives>

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]
#![warn(missing_docs)]

pub mod convert;
mod encoding;
mod error;
mod options;
mod order;
mod reader;
mod writer;


pub use encoding::TextEncoding;
pub use error::{Error, Result};
pub use options::Overrides;
pub use order::{is_reversal_required, ByteOrder};
pub use reader::EndianReader;
pub use writer::EndianWriter;
