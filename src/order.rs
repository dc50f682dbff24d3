/// Byte order of a multi-byte value on the wire.
///
/// Little-endian places the least-significant byte first. Values are `Copy`
/// and are passed by value everywhere; a reader or writer holds one as its
/// ambient default and individual calls may override it.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ByteOrder {
    /// Least-significant byte first.
    LittleEndian,
    /// Most-significant byte first.
    BigEndian,
}

impl ByteOrder {
    /// Returns the byte order of the host CPU.
    #[inline(always)]
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// Returns true if this is [`ByteOrder::LittleEndian`].
    #[inline(always)]
    pub const fn is_little_endian(self) -> bool {
        matches!(self, ByteOrder::LittleEndian)
    }
}

/// Returns true if encoding a value for `order` requires reversing its
/// host-native byte layout.
///
/// Reversal is required exactly when `order` differs from the host order:
/// a big-endian request on a little-endian host, or vice versa.
#[inline(always)]
pub const fn is_reversal_required(order: ByteOrder) -> bool {
    ByteOrder::native().is_little_endian() != order.is_little_endian()
}
