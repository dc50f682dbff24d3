use std::io::{ErrorKind, Read, Seek, SeekFrom};

use tracing::trace;

use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::options::Overrides;
use crate::order::{is_reversal_required, ByteOrder};

/// Decodes values from a seekable byte stream under a configurable byte
/// order.
///
/// Multi-byte primitives are read as their host-native byte layout,
/// reversed when the requested byte order differs from the host order.
/// The byte order and text encoding held by the reader are defaults; every
/// decoding method has a `*_with` twin taking [`Overrides`] for per-call
/// control.
///
/// The reader borrows or owns its stream through the type parameter:
/// `EndianReader::new(&mut stream)` leaves the stream open after the reader
/// is gone, while `EndianReader::new(stream)` takes ownership, closing the
/// stream when the reader is dropped. The stream position is shared state —
/// seeking the stream between calls, or through [`seek`](Self::seek), is
/// legal and observable.
///
/// Reading past the end of the stream surfaces as the underlying stream's
/// own fault (an [`ErrorKind::UnexpectedEof`] I/O error for fixed-width
/// values); there is no short-read retry and no padding. Char and string
/// loops instead degrade gracefully at end-of-stream, as each method
/// documents.
pub struct EndianReader<R> {
    stream: R,
    byte_order: ByteOrder,
    encoding: TextEncoding,
}

impl<R> EndianReader<R> {
    /// Creates a reader with little-endian byte order and UTF-8 encoding.
    pub fn new(stream: R) -> Self {
        Self::with_options(stream, ByteOrder::LittleEndian, TextEncoding::Utf8)
    }

    /// Creates a reader with the given byte order and UTF-8 encoding.
    pub fn with_order(stream: R, order: ByteOrder) -> Self {
        Self::with_options(stream, order, TextEncoding::Utf8)
    }

    /// Creates a reader with the given byte order and text encoding.
    pub fn with_options(stream: R, order: ByteOrder, encoding: TextEncoding) -> Self {
        Self {
            stream,
            byte_order: order,
            encoding,
        }
    }

    /// The default byte order for decoding.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Replaces the default byte order.
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }

    /// The default text encoding for char and string decoding.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Replaces the default text encoding.
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Borrows the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.stream
    }

    /// Mutably borrows the underlying stream.
    ///
    /// Reads issued directly on the stream move the shared position.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.stream
    }

    /// Consumes the reader and returns the stream.
    pub fn into_inner(self) -> R {
        self.stream
    }

    /// Consumes the reader. An owned stream is closed by the drop; a
    /// borrowed stream is left open.
    pub fn close(self) {
        trace!("closing reader");
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

impl<R: Read> EndianReader<R> {
    /// Reads a small array of bytes with a constant length.
    #[inline(always)]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.stream.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads `N` bytes and reverses them when the overrides call for it.
    #[inline(always)]
    fn read_reversible<const N: usize>(&mut self, overrides: Overrides) -> Result<[u8; N]> {
        let mut bytes = self.read_array::<N>()?;
        if self.wants_reversal(overrides) {
            bytes.reverse();
        }
        Ok(bytes)
    }

    /// Reads bytes until `buffer` is full or the stream ends. Returns the
    /// number of bytes read; the unfilled tail keeps its existing contents.
    fn fill_until_eof(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.stream.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Io(err)),
            }
        }
        Ok(filled)
    }

    /// Reads one code unit. Returns `None` at end-of-stream; a partial
    /// final unit is zero-padded rather than faulting.
    fn read_unit(&mut self, encoding: TextEncoding) -> Result<Option<char>> {
        let width = encoding.unit_width();
        let mut raw = [0u8; 2];
        if self.fill_until_eof(&mut raw[..width])? == 0 {
            return Ok(None);
        }
        Ok(Some(encoding.unit_to_char(raw)))
    }

    /// Reads a single `u8`.
    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a single `i8`.
    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads one byte as a `bool`; any non-zero byte is true.
    #[inline(always)]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a `u16` in the reader's default byte order.
    #[inline(always)]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_u16_with(Overrides::default())
    }

    /// Reads a `u16` with per-call overrides.
    #[inline(always)]
    pub fn read_u16_with(&mut self, overrides: Overrides) -> Result<u16> {
        Ok(u16::from_ne_bytes(self.read_reversible(overrides)?))
    }

    /// Reads an `i16` in the reader's default byte order.
    #[inline(always)]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_i16_with(Overrides::default())
    }

    /// Reads an `i16` with per-call overrides.
    #[inline(always)]
    pub fn read_i16_with(&mut self, overrides: Overrides) -> Result<i16> {
        Ok(i16::from_ne_bytes(self.read_reversible(overrides)?))
    }

    /// Reads a `u32` in the reader's default byte order.
    #[inline(always)]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_u32_with(Overrides::default())
    }

    /// Reads a `u32` with per-call overrides.
    #[inline(always)]
    pub fn read_u32_with(&mut self, overrides: Overrides) -> Result<u32> {
        Ok(u32::from_ne_bytes(self.read_reversible(overrides)?))
    }

    /// Reads an `i32` in the reader's default byte order.
    #[inline(always)]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_i32_with(Overrides::default())
    }

    /// Reads an `i32` with per-call overrides.
    #[inline(always)]
    pub fn read_i32_with(&mut self, overrides: Overrides) -> Result<i32> {
        Ok(i32::from_ne_bytes(self.read_reversible(overrides)?))
    }

    /// Reads a `u64` in the reader's default byte order.
    #[inline(always)]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_u64_with(Overrides::default())
    }

    /// Reads a `u64` with per-call overrides.
    #[inline(always)]
    pub fn read_u64_with(&mut self, overrides: Overrides) -> Result<u64> {
        Ok(u64::from_ne_bytes(self.read_reversible(overrides)?))
    }

    /// Reads an `i64` in the reader's default byte order.
    #[inline(always)]
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_i64_with(Overrides::default())
    }

    /// Reads an `i64` with per-call overrides.
    #[inline(always)]
    pub fn read_i64_with(&mut self, overrides: Overrides) -> Result<i64> {
        Ok(i64::from_ne_bytes(self.read_reversible(overrides)?))
    }

    /// Reads an `f32` in the reader's default byte order.
    #[inline(always)]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_f32_with(Overrides::default())
    }

    /// Reads an `f32` with per-call overrides.
    #[inline(always)]
    pub fn read_f32_with(&mut self, overrides: Overrides) -> Result<f32> {
        Ok(f32::from_ne_bytes(self.read_reversible(overrides)?))
    }

    /// Reads an `f64` in the reader's default byte order.
    #[inline(always)]
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_f64_with(Overrides::default())
    }

    /// Reads an `f64` with per-call overrides.
    #[inline(always)]
    pub fn read_f64_with(&mut self, overrides: Overrides) -> Result<f64> {
        Ok(f64::from_ne_bytes(self.read_reversible(overrides)?))
    }

    /// Reads exactly `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; count];
        self.stream.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Fills `buffer` with raw bytes from the stream.
    pub fn read_into(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buffer)?;
        Ok(())
    }

    /// Reads one char in the reader's default encoding.
    pub fn read_char(&mut self) -> Result<char> {
        self.read_char_with(Overrides::default())
    }

    /// Reads one char with per-call overrides.
    ///
    /// The char is one code unit wide: 1 byte for byte-oriented encodings,
    /// 2 bytes for UTF-16. A partial final unit at end-of-stream is
    /// zero-padded; a read at end-of-stream itself fails with the stream's
    /// end-of-file error.
    pub fn read_char_with(&mut self, overrides: Overrides) -> Result<char> {
        let encoding = self.effective_encoding(overrides);
        match self.read_unit(encoding)? {
            Some(ch) => Ok(ch),
            None => Err(Error::Io(ErrorKind::UnexpectedEof.into())),
        }
    }

    /// Reads up to `count` chars in the reader's default encoding.
    pub fn read_chars(&mut self, count: usize) -> Result<Vec<char>> {
        self.read_chars_with(count, Overrides::default())
    }

    /// Reads up to `count` chars with per-call overrides, stopping early
    /// at end-of-stream.
    pub fn read_chars_with(&mut self, count: usize, overrides: Overrides) -> Result<Vec<char>> {
        let encoding = self.effective_encoding(overrides);
        let mut chars = Vec::with_capacity(count);
        while chars.len() < count {
            match self.read_unit(encoding)? {
                Some(ch) => chars.push(ch),
                None => break,
            }
        }
        Ok(chars)
    }

    /// Reads a 7-bit encoded non-negative length.
    ///
    /// Each byte carries 7 bits of the count, least-significant group
    /// first, with bit 7 set on every byte except the last. A count needs
    /// at most 5 bytes; a stream that asks for a 6th, or decodes to a
    /// count above `i32::MAX`, is corrupt.
    pub fn read_7bit_encoded_len(&mut self) -> Result<u32> {
        const MORE: u8 = 0x80;

        let mut shift: u32 = 0;
        let mut count: u32 = 0;

        loop {
            if shift == 5 * 7 {
                trace!("length prefix continued past five bytes");
                return Err(Error::CorruptLengthPrefix);
            }
            let b = self.read_u8()?;
            count |= u32::from(b & 0x7f) << shift;
            shift += 7;
            if b & MORE == 0 {
                break;
            }
        }

        if count > i32::MAX as u32 {
            return Err(Error::CorruptLengthPrefix);
        }
        Ok(count)
    }

    /// Reads a length-prefixed string in the reader's default encoding.
    pub fn read_prefixed_string(&mut self) -> Result<String> {
        self.read_prefixed_string_with(Overrides::default())
    }

    /// Reads a length-prefixed string with per-call overrides.
    ///
    /// The prefix is a 7-bit encoded byte count, followed by exactly that
    /// many bytes of text.
    pub fn read_prefixed_string_with(&mut self, overrides: Overrides) -> Result<String> {
        let encoding = self.effective_encoding(overrides);
        let len = self.read_7bit_encoded_len()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(encoding.decode(&bytes))
    }

    /// Reads a length-prefixed payload without decoding it as text.
    pub fn read_prefixed_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_7bit_encoded_len()? as usize;
        self.read_bytes(len)
    }

    /// Reads a length-prefixed payload as a byte string.
    #[cfg(feature = "bstr")]
    pub fn read_prefixed_bstr(&mut self) -> Result<bstr::BString> {
        Ok(bstr::BString::from(self.read_prefixed_bytes()?))
    }

    /// Reads a fixed-length string in the reader's default encoding.
    pub fn read_fixed_string(&mut self, len_units: usize, trim: bool) -> Result<String> {
        self.read_fixed_string_with(len_units, trim, Overrides::default())
    }

    /// Reads a fixed-length string with per-call overrides.
    ///
    /// Decodes exactly `len_units` code units' worth of bytes. When `trim`
    /// is set, trailing NUL code units are stripped from the result. A
    /// stream that ends early yields the zero-padded remainder. A zero
    /// `len_units` is an invalid argument.
    pub fn read_fixed_string_with(
        &mut self,
        len_units: usize,
        trim: bool,
        overrides: Overrides,
    ) -> Result<String> {
        if len_units == 0 {
            return Err(Error::InvalidLength);
        }
        let encoding = self.effective_encoding(overrides);
        let mut bytes = vec![0u8; len_units * encoding.unit_width()];
        self.fill_until_eof(&mut bytes)?;
        let mut value = encoding.decode(&bytes);
        if trim {
            let end = value.trim_end_matches('\0').len();
            value.truncate(end);
        }
        Ok(value)
    }

    /// Reads a NUL-terminated string in the reader's default encoding.
    pub fn read_nul_terminated_string(&mut self, max_units: Option<usize>) -> Result<String> {
        self.read_nul_terminated_string_with(max_units, Overrides::default())
    }

    /// Reads a NUL-terminated string with per-call overrides.
    ///
    /// Accumulates code units until a NUL unit (which is consumed), the
    /// `max_units` cap, or end-of-stream. When the cap ends the loop, any
    /// terminator is left unconsumed — the position lands wherever
    /// decoding stopped. `None` means unbounded.
    pub fn read_nul_terminated_string_with(
        &mut self,
        max_units: Option<usize>,
        overrides: Overrides,
    ) -> Result<String> {
        let encoding = self.effective_encoding(overrides);
        let mut value = String::new();
        let mut remaining = max_units;
        loop {
            if remaining == Some(0) {
                break;
            }
            match self.read_unit(encoding)? {
                None | Some('\0') => break,
                Some(ch) => value.push(ch),
            }
            if let Some(left) = remaining.as_mut() {
                *left -= 1;
            }
        }
        Ok(value)
    }
}

impl<R: Read + Seek> EndianReader<R> {
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

    /// Runs a read with the position saved first and restored afterwards.
    ///
    /// The position is restored whether or not the read succeeds. Not
    /// atomic: another user of the same stream moving the position between
    /// the save and the restore is a race.
    fn peek_at<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let position = self.stream.stream_position()?;
        let value = read(self);
        let restored = self.stream.seek(SeekFrom::Start(position));
        match value {
            Ok(value) => {
                restored?;
                Ok(value)
            }
            Err(error) => Err(error),
        }
    }

    /// Reads a `u8` without consuming it.
    pub fn peek_u8(&mut self) -> Result<u8> {
        self.peek_at(|r| r.read_u8())
    }

    /// Reads an `i8` without consuming it.
    pub fn peek_i8(&mut self) -> Result<i8> {
        self.peek_at(|r| r.read_i8())
    }

    /// Reads a `bool` without consuming it.
    pub fn peek_bool(&mut self) -> Result<bool> {
        self.peek_at(|r| r.read_bool())
    }

    /// Reads a `u16` without consuming it.
    pub fn peek_u16(&mut self) -> Result<u16> {
        self.peek_at(|r| r.read_u16())
    }

    /// Reads a `u16` with overrides, without consuming it.
    pub fn peek_u16_with(&mut self, overrides: Overrides) -> Result<u16> {
        self.peek_at(|r| r.read_u16_with(overrides))
    }

    /// Reads an `i16` without consuming it.
    pub fn peek_i16(&mut self) -> Result<i16> {
        self.peek_at(|r| r.read_i16())
    }

    /// Reads an `i16` with overrides, without consuming it.
    pub fn peek_i16_with(&mut self, overrides: Overrides) -> Result<i16> {
        self.peek_at(|r| r.read_i16_with(overrides))
    }

    /// Reads a `u32` without consuming it.
    pub fn peek_u32(&mut self) -> Result<u32> {
        self.peek_at(|r| r.read_u32())
    }

    /// Reads a `u32` with overrides, without consuming it.
    pub fn peek_u32_with(&mut self, overrides: Overrides) -> Result<u32> {
        self.peek_at(|r| r.read_u32_with(overrides))
    }

    /// Reads an `i32` without consuming it.
    pub fn peek_i32(&mut self) -> Result<i32> {
        self.peek_at(|r| r.read_i32())
    }

    /// Reads an `i32` with overrides, without consuming it.
    pub fn peek_i32_with(&mut self, overrides: Overrides) -> Result<i32> {
        self.peek_at(|r| r.read_i32_with(overrides))
    }

    /// Reads a `u64` without consuming it.
    pub fn peek_u64(&mut self) -> Result<u64> {
        self.peek_at(|r| r.read_u64())
    }

    /// Reads a `u64` with overrides, without consuming it.
    pub fn peek_u64_with(&mut self, overrides: Overrides) -> Result<u64> {
        self.peek_at(|r| r.read_u64_with(overrides))
    }

    /// Reads an `i64` without consuming it.
    pub fn peek_i64(&mut self) -> Result<i64> {
        self.peek_at(|r| r.read_i64())
    }

    /// Reads an `i64` with overrides, without consuming it.
    pub fn peek_i64_with(&mut self, overrides: Overrides) -> Result<i64> {
        self.peek_at(|r| r.read_i64_with(overrides))
    }

    /// Reads an `f32` without consuming it.
    pub fn peek_f32(&mut self) -> Result<f32> {
        self.peek_at(|r| r.read_f32())
    }

    /// Reads an `f32` with overrides, without consuming it.
    pub fn peek_f32_with(&mut self, overrides: Overrides) -> Result<f32> {
        self.peek_at(|r| r.read_f32_with(overrides))
    }

    /// Reads an `f64` without consuming it.
    pub fn peek_f64(&mut self) -> Result<f64> {
        self.peek_at(|r| r.read_f64())
    }

    /// Reads an `f64` with overrides, without consuming it.
    pub fn peek_f64_with(&mut self, overrides: Overrides) -> Result<f64> {
        self.peek_at(|r| r.read_f64_with(overrides))
    }

    /// Reads raw bytes without consuming them.
    pub fn peek_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.peek_at(|r| r.read_bytes(count))
    }

    /// Reads one char without consuming it.
    pub fn peek_char(&mut self) -> Result<char> {
        self.peek_char_with(Overrides::default())
    }

    /// Reads one char with overrides, without consuming it.
    pub fn peek_char_with(&mut self, overrides: Overrides) -> Result<char> {
        self.peek_at(|r| r.read_char_with(overrides))
    }

    /// Reads chars without consuming them.
    pub fn peek_chars(&mut self, count: usize) -> Result<Vec<char>> {
        self.peek_chars_with(count, Overrides::default())
    }

    /// Reads chars with overrides, without consuming them.
    pub fn peek_chars_with(&mut self, count: usize, overrides: Overrides) -> Result<Vec<char>> {
        self.peek_at(|r| r.read_chars_with(count, overrides))
    }

    /// Reads a length-prefixed string without consuming it.
    pub fn peek_prefixed_string(&mut self) -> Result<String> {
        self.peek_prefixed_string_with(Overrides::default())
    }

    /// Reads a length-prefixed string with overrides, without consuming it.
    pub fn peek_prefixed_string_with(&mut self, overrides: Overrides) -> Result<String> {
        self.peek_at(|r| r.read_prefixed_string_with(overrides))
    }

    /// Reads a length-prefixed payload without consuming it.
    pub fn peek_prefixed_bytes(&mut self) -> Result<Vec<u8>> {
        self.peek_at(|r| r.read_prefixed_bytes())
    }

    /// Reads a fixed-length string without consuming it.
    pub fn peek_fixed_string(&mut self, len_units: usize, trim: bool) -> Result<String> {
        self.peek_fixed_string_with(len_units, trim, Overrides::default())
    }

    /// Reads a fixed-length string with overrides, without consuming it.
    pub fn peek_fixed_string_with(
        &mut self,
        len_units: usize,
        trim: bool,
        overrides: Overrides,
    ) -> Result<String> {
        self.peek_at(|r| r.read_fixed_string_with(len_units, trim, overrides))
    }

    /// Reads a NUL-terminated string without consuming it.
    pub fn peek_nul_terminated_string(&mut self, max_units: Option<usize>) -> Result<String> {
        self.peek_nul_terminated_string_with(max_units, Overrides::default())
    }

    /// Reads a NUL-terminated string with overrides, without consuming it.
    pub fn peek_nul_terminated_string_with(
        &mut self,
        max_units: Option<usize>,
        overrides: Overrides,
    ) -> Result<String> {
        self.peek_at(|r| r.read_nul_terminated_string_with(max_units, overrides))
    }
}
