//! Minimal text-encoding selector for the reader and writer.
//!
//! The codec only relies on one structural fact about an encoding: its code
//! unit width, one byte for byte-oriented encodings or two bytes for the
//! UTF-16 family. Transcoding itself is delegated to `std` and `zerocopy`;
//! decoding is lossy, replacing malformed sequences with U+FFFD rather than
//! failing partway through a string.

use zerocopy::byteorder::{BE, LE, U16};
use zerocopy::{FromBytes, IntoBytes};

/// Text encoding used for char and string operations.
///
/// A reader or writer always holds a concrete encoding; there is no absent
/// state. The default is UTF-8.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum TextEncoding {
    /// UTF-8, one byte per code unit. The default.
    #[default]
    Utf8,
    /// UTF-16 with little-endian code units.
    Utf16Le,
    /// UTF-16 with big-endian code units.
    Utf16Be,
}

impl TextEncoding {
    /// Width of one code unit in bytes: 1 for UTF-8, 2 for UTF-16.
    #[inline(always)]
    pub const fn unit_width(self) -> usize {
        match self {
            TextEncoding::Utf8 => 1,
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => 2,
        }
    }

    /// Number of bytes `encode` would produce for `value`, without
    /// allocating.
    pub fn encoded_len(self, value: &str) -> usize {
        match self {
            TextEncoding::Utf8 => value.len(),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => value.encode_utf16().count() * 2,
        }
    }

    /// Encodes `value` into bytes under this encoding.
    pub fn encode(self, value: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => value.as_bytes().to_vec(),
            TextEncoding::Utf16Le => {
                let units: Vec<U16<LE>> = value.encode_utf16().map(U16::new).collect();
                units.as_bytes().to_vec()
            }
            TextEncoding::Utf16Be => {
                let units: Vec<U16<BE>> = value.encode_utf16().map(U16::new).collect();
                units.as_bytes().to_vec()
            }
        }
    }

    /// Decodes `bytes` into a string, replacing malformed sequences with
    /// the Unicode replacement character.
    ///
    /// For UTF-16 encodings a dangling final byte cannot form a code unit
    /// and also decodes to the replacement character.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf16Le => {
                let even = bytes.len() & !1;
                // Even length and alignment 1, so the cast cannot fail.
                let wchars = <[U16<LE>]>::ref_from_bytes(&bytes[..even]).unwrap_or(&[]);
                let mut wide: Vec<u16> = wchars.iter().map(|w| w.get()).collect();
                if even != bytes.len() {
                    wide.push(char::REPLACEMENT_CHARACTER as u16);
                }
                String::from_utf16_lossy(&wide)
            }
            TextEncoding::Utf16Be => {
                let even = bytes.len() & !1;
                let wchars = <[U16<BE>]>::ref_from_bytes(&bytes[..even]).unwrap_or(&[]);
                let mut wide: Vec<u16> = wchars.iter().map(|w| w.get()).collect();
                if even != bytes.len() {
                    wide.push(char::REPLACEMENT_CHARACTER as u16);
                }
                String::from_utf16_lossy(&wide)
            }
        }
    }

    /// Decodes a single code unit.
    ///
    /// `raw` holds `unit_width` significant bytes; the rest is zero. A unit
    /// that is not a valid scalar value on its own (a non-ASCII lead byte
    /// in UTF-8, a lone surrogate in UTF-16) decodes to the replacement
    /// character.
    pub(crate) fn unit_to_char(self, raw: [u8; 2]) -> char {
        match self {
            TextEncoding::Utf8 => {
                if raw[0].is_ascii() {
                    raw[0] as char
                } else {
                    char::REPLACEMENT_CHARACTER
                }
            }
            TextEncoding::Utf16Le => wide_to_char(u16::from_le_bytes(raw)),
            TextEncoding::Utf16Be => wide_to_char(u16::from_be_bytes(raw)),
        }
    }
}

fn wide_to_char(unit: u16) -> char {
    char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER)
}
