use std::io::{Seek, SeekFrom, Write};

use tracing::trace;

use crate::convert;
use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::options::Overrides;
use crate::order::{is_reversal_required, ByteOrder};

/// Encodes values to a seekable byte stream under a configurable byte
/// order.
///
/// The mirror of [`EndianReader`](crate::EndianReader): multi-byte
/// primitives are laid out in host-native order and reversed when the
/// requested byte order differs from the host order. The byte order and
/// text encoding held by the writer are defaults; every encoding method
/// has a `*_with` twin taking [`Overrides`].
///
/// The writer borrows or owns its stream through the type parameter, the
/// same way the reader does. Nothing is buffered inside the writer; every
/// operation goes straight to the stream, and [`flush`](Self::flush) only
/// forwards to it.
///
/// Argument errors (zero lengths, out-of-bounds ranges) are detected
/// before any byte is written. A failed write may leave the position at a
/// midpoint; there is no cross-call recovery state.
pub struct EndianWriter<W> {
    stream: W,
    byte_order: ByteOrder,
    encoding: TextEncoding,
}

impl<W> EndianWriter<W> {
    /// Creates a writer with little-endian byte order and UTF-8 encoding.
    pub fn new(stream: W) -> Self {
        Self::with_options(stream, ByteOrder::LittleEndian, TextEncoding::Utf8)
    }

    /// Creates a writer with the given byte order and UTF-8 encoding.
    pub fn with_order(stream: W, order: ByteOrder) -> Self {
        Self::with_options(stream, order, TextEncoding::Utf8)
    }

    /// Creates a writer with the given byte order and text encoding.
    pub fn with_options(stream: W, order: ByteOrder, encoding: TextEncoding) -> Self {
        Self {
            stream,
            byte_order: order,
            encoding,
        }
    }

    /// The default byte order for encoding.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Replaces the default byte order.
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }

    /// The default text encoding for char and string encoding.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Replaces the default text encoding.
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Borrows the underlying stream. No flush happens here; use
    /// [`flush`](Self::flush) or [`into_inner`](Self::into_inner) when
    /// pending state must reach the stream first.
    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    /// Mutably borrows the underlying stream.
    ///
    /// Writes issued directly on the stream move the shared position.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.stream
    }

    #[inline(always)]
    fn wants_reversal(&self, overrides: Overrides) -> bool {
        overrides.reverse || is_reversal_required(overrides.order.unwrap_or(self.byte_order))
    }

    #[inline(always)]
    fn effective_encoding(&self, overrides: Overrides) -> TextEncoding {
        overrides.encoding.unwrap_or(self.encoding)
    }
}

impl<W: Write> EndianWriter<W> {
    /// Flushes the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }

    /// Flushes, then consumes the writer and returns the stream.
    pub fn into_inner(mut self) -> Result<W> {
        self.stream.flush()?;
        Ok(self.stream)
    }

    /// Flushes and consumes the writer. An owned stream is closed by the
    /// drop; a borrowed stream is flushed and left open.
    pub fn close(mut self) -> Result<()> {
        trace!("closing writer");
        self.stream.flush()?;
        Ok(())
    }

    #[inline(always)]
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes)?;
        Ok(())
    }

    /// Writes a single `u8`.
    #[inline(always)]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_raw(&[value])
    }

    /// Writes a single `i8`.
    #[inline(always)]
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_raw(&[value as u8])
    }

    /// Writes a `bool` as one byte; true is 1, false is 0.
    #[inline(always)]
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    /// Writes a `u16` in the writer's default byte order.
    #[inline(always)]
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_u16_with(value, Overrides::default())
    }

    /// Writes a `u16` with per-call overrides.
    #[inline(always)]
    pub fn write_u16_with(&mut self, value: u16, overrides: Overrides) -> Result<()> {
        let reverse = self.wants_reversal(overrides);
        self.write_raw(&convert::bytes_from_u16_reversed(value, reverse))
    }

    /// Writes an `i16` in the writer's default byte order.
    #[inline(always)]
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_i16_with(value, Overrides::default())
    }

    /// Writes an `i16` with per-call overrides.
    #[inline(always)]
    pub fn write_i16_with(&mut self, value: i16, overrides: Overrides) -> Result<()> {
        let reverse = self.wants_reversal(overrides);
        self.write_raw(&convert::bytes_from_i16_reversed(value, reverse))
    }

    /// Writes a `u32` in the writer's default byte order.
    #[inline(always)]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_u32_with(value, Overrides::default())
    }

    /// Writes a `u32` with per-call overrides.
    #[inline(always)]
    pub fn write_u32_with(&mut self, value: u32, overrides: Overrides) -> Result<()> {
        let reverse = self.wants_reversal(overrides);
        self.write_raw(&convert::bytes_from_u32_reversed(value, reverse))
    }

    /// Writes an `i32` in the writer's default byte order.
    #[inline(always)]
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_i32_with(value, Overrides::default())
    }

    /// Writes an `i32` with per-call overrides.
    #[inline(always)]
    pub fn write_i32_with(&mut self, value: i32, overrides: Overrides) -> Result<()> {
        let reverse = self.wants_reversal(overrides);
        self.write_raw(&convert::bytes_from_i32_reversed(value, reverse))
    }

    /// Writes a `u64` in the writer's default byte order.
    #[inline(always)]
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_u64_with(value, Overrides::default())
    }

    /// Writes a `u64` with per-call overrides.
    #[inline(always)]
    pub fn write_u64_with(&mut self, value: u64, overrides: Overrides) -> Result<()> {
        let reverse = self.wants_reversal(overrides);
        self.write_raw(&convert::bytes_from_u64_reversed(value, reverse))
    }

    /// Writes an `i64` in the writer's default byte order.
    #[inline(always)]
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_i64_with(value, Overrides::default())
    }

    /// Writes an `i64` with per-call overrides.
    #[inline(always)]
    pub fn write_i64_with(&mut self, value: i64, overrides: Overrides) -> Result<()> {
        let reverse = self.wants_reversal(overrides);
        self.write_raw(&convert::bytes_from_i64_reversed(value, reverse))
    }

    /// Writes an `f32` in the writer's default byte order.
    #[inline(always)]
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_f32_with(value, Overrides::default())
    }

    /// Writes an `f32` with per-call overrides.
    #[inline(always)]
    pub fn write_f32_with(&mut self, value: f32, overrides: Overrides) -> Result<()> {
        let reverse = self.wants_reversal(overrides);
        self.write_raw(&convert::bytes_from_f32_reversed(value, reverse))
    }

    /// Writes an `f64` in the writer's default byte order.
    #[inline(always)]
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_f64_with(value, Overrides::default())
    }

    /// Writes an `f64` with per-call overrides.
    #[inline(always)]
    pub fn write_f64_with(&mut self, value: f64, overrides: Overrides) -> Result<()> {
        let reverse = self.wants_reversal(overrides);
        self.write_raw(&convert::bytes_from_f64_reversed(value, reverse))
    }

    /// Writes raw bytes as-is.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_raw(bytes)
    }

    /// Writes `count` raw bytes starting at `offset`.
    ///
    /// The range is validated against the buffer before any byte is
    /// written; a range past the end of the buffer is an invalid argument.
    pub fn write_bytes_range(&mut self, bytes: &[u8], offset: usize, count: usize) -> Result<()> {
        let range = checked_range(bytes.len(), offset, count)?;
        self.write_raw(&bytes[range])
    }

    /// Writes one char in the writer's default encoding.
    pub fn write_char(&mut self, value: char) -> Result<()> {
        self.write_char_with(value, Overrides::default())
    }

    /// Writes one char with per-call overrides.
    ///
    /// The char is encoded through the active encoding and may occupy more
    /// than one code unit (a multi-byte UTF-8 sequence, a UTF-16 surrogate
    /// pair).
    pub fn write_char_with(&mut self, value: char, overrides: Overrides) -> Result<()> {
        let encoding = self.effective_encoding(overrides);
        let mut utf8 = [0u8; 4];
        let bytes = encoding.encode(value.encode_utf8(&mut utf8));
        self.write_raw(&bytes)
    }

    /// Writes a run of chars in the writer's default encoding.
    pub fn write_chars(&mut self, values: &[char]) -> Result<()> {
        self.write_chars_with(values, Overrides::default())
    }

    /// Writes a run of chars with per-call overrides.
    pub fn write_chars_with(&mut self, values: &[char], overrides: Overrides) -> Result<()> {
        let encoding = self.effective_encoding(overrides);
        let text: String = values.iter().collect();
        self.write_raw(&encoding.encode(&text))
    }

    /// Writes `count` chars starting at `offset`, in the writer's default
    /// encoding.
    ///
    /// The range is validated against the buffer before any byte is
    /// written.
    pub fn write_chars_range(&mut self, values: &[char], offset: usize, count: usize) -> Result<()> {
        let range = checked_range(values.len(), offset, count)?;
        self.write_chars_with(&values[range], Overrides::default())
    }

    /// Writes a non-negative length as a 7-bit encoded integer.
    ///
    /// Each byte carries 7 bits, least-significant group first, with bit 7
    /// set on every byte except the last; at most 5 bytes. Counts above
    /// `i32::MAX` cannot be represented in the prefix.
    pub fn write_7bit_encoded_len(&mut self, count: u32) -> Result<()> {
        if count > i32::MAX as u32 {
            return Err(Error::CannotEncode {
                len: count as usize,
            });
        }
        let mut v = count;
        while v >= 0x80 {
            self.write_u8((v as u8) | 0x80)?;
            v >>= 7;
        }
        self.write_u8(v as u8)
    }

    /// Writes a length-prefixed string in the writer's default encoding.
    pub fn write_prefixed_string(&mut self, value: &str) -> Result<()> {
        self.write_prefixed_string_with(value, Overrides::default())
    }

    /// Writes a length-prefixed string with per-call overrides.
    ///
    /// The prefix is the encoded byte length of the string as a 7-bit
    /// encoded integer; a string too large for the 32-bit prefix is a
    /// cannot-encode error, reported before anything is written.
    pub fn write_prefixed_string_with(&mut self, value: &str, overrides: Overrides) -> Result<()> {
        let encoding = self.effective_encoding(overrides);
        let byte_len = encoding.encoded_len(value);
        if byte_len > i32::MAX as usize {
            return Err(Error::CannotEncode { len: byte_len });
        }
        self.write_7bit_encoded_len(byte_len as u32)?;
        self.write_raw(&encoding.encode(value))
    }

    /// Writes a length-prefixed payload without treating it as text.
    pub fn write_prefixed_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > i32::MAX as usize {
            return Err(Error::CannotEncode { len: bytes.len() });
        }
        self.write_7bit_encoded_len(bytes.len() as u32)?;
        self.write_raw(bytes)
    }

    /// Writes a fixed-length string in the writer's default encoding.
    pub fn write_fixed_string(&mut self, value: &str, len_units: usize) -> Result<()> {
        self.write_fixed_string_with(value, len_units, Overrides::default())
    }

    /// Writes a fixed-length string with per-call overrides.
    ///
    /// Exactly `len_units` code units go to the stream: a longer value is
    /// truncated, a shorter one is padded with NUL units. A zero
    /// `len_units` is an invalid argument.
    pub fn write_fixed_string_with(
        &mut self,
        value: &str,
        len_units: usize,
        overrides: Overrides,
    ) -> Result<()> {
        if len_units == 0 {
            return Err(Error::InvalidLength);
        }
        let encoding = self.effective_encoding(overrides);
        let mut bytes = encoding.encode(value);
        bytes.resize(len_units * encoding.unit_width(), 0);
        self.write_raw(&bytes)
    }

    /// Writes a NUL-terminated string in the writer's default encoding.
    pub fn write_nul_terminated_string(
        &mut self,
        value: &str,
        max_units: Option<usize>,
    ) -> Result<()> {
        self.write_nul_terminated_string_with(value, max_units, Overrides::default())
    }

    /// Writes a NUL-terminated string with per-call overrides.
    ///
    /// Up to `max_units` code units of the value (all of it for `None`),
    /// followed by exactly one NUL unit.
    pub fn write_nul_terminated_string_with(
        &mut self,
        value: &str,
        max_units: Option<usize>,
        overrides: Overrides,
    ) -> Result<()> {
        let encoding = self.effective_encoding(overrides);
        let mut bytes = encoding.encode(value);
        if let Some(max) = max_units {
            let cap = max * encoding.unit_width();
            if bytes.len() > cap {
                bytes.truncate(cap);
            }
        }
        bytes.extend_from_slice(&[0, 0][..encoding.unit_width()]);
        self.write_raw(&bytes)
    }
}

impl<W: Seek> EndianWriter<W> {
    /// The current stream position.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.stream.stream_position()?)
    }

    /// Moves the stream position to an absolute offset.
    pub fn set_position(&mut self, position: u64) -> Result<()> {
        self.stream.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Seeks within the underlying stream.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.stream.seek(pos)?)
    }
}

/// Validates an (offset, count) pair against a buffer length, returning
/// the usable range. Overflowing or out-of-bounds pairs are rejected
/// before any I/O happens.
fn checked_range(len: usize, offset: usize, count: usize) -> Result<std::ops::Range<usize>> {
    let end = offset
        .checked_add(count)
        .filter(|&end| end <= len)
        .ok_or(Error::RangeOutOfBounds { offset, count, len })?;
    Ok(offset..end)
}
