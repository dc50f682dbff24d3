/// Errors produced by [`EndianReader`](crate::EndianReader) and
/// [`EndianWriter`](crate::EndianWriter).
///
/// Argument errors are detected before any bytes are touched. A failed
/// decode or I/O call may leave the stream position at a midpoint; callers
/// that want to retry must reset the position themselves.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error from the underlying stream, including short reads
    /// surfacing as `UnexpectedEof`. Propagated as-is; there is no retry.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A length or count argument that must be positive was zero.
    #[error("length must be positive")]
    InvalidLength,

    /// An explicit (offset, count) sub-range falls outside the buffer.
    #[error("range {offset}..{offset}+{count} out of bounds for buffer of {len} bytes")]
    RangeOutOfBounds {
        /// Start of the requested range.
        offset: usize,
        /// Number of elements requested.
        count: usize,
        /// Length of the buffer the range was applied to.
        len: usize,
    },

    /// A 7-bit encoded length prefix ran past its 5-byte maximum or
    /// decoded to a negative count. The bytes already consumed are not
    /// un-read.
    #[error("malformed 7-bit length prefix")]
    CorruptLengthPrefix,

    /// A string is too large for its length to fit the 32-bit prefix.
    #[error("value of {len} bytes cannot be encoded with a 32-bit length prefix")]
    CannotEncode {
        /// Encoded byte length of the rejected value.
        len: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
