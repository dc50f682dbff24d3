use crate::encoding::TextEncoding;
use crate::order::ByteOrder;

/// Per-call overrides for read and write operations.
///
/// Every field defaults to "use the instance default". `reverse` forces a
/// byte reversal regardless of any byte order; when it is false, the
/// effective order (the override if present, the instance default
/// otherwise) decides.
///
/// ```
/// use endian_binary_io::{ByteOrder, Overrides, TextEncoding};
///
/// let big = Overrides::order(ByteOrder::BigEndian);
/// let wide = Overrides::encoding(TextEncoding::Utf16Le);
/// let both = Overrides {
///     order: Some(ByteOrder::BigEndian),
///     encoding: Some(TextEncoding::Utf16Le),
///     ..Overrides::default()
/// };
/// # let _ = (big, wide, both);
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct Overrides {
    /// Byte order for this call; `None` uses the instance default.
    pub order: Option<ByteOrder>,
    /// Force byte reversal regardless of order.
    pub reverse: bool,
    /// Text encoding for this call; `None` uses the instance default.
    pub encoding: Option<TextEncoding>,
}

impl Overrides {
    /// Overrides the byte order for one call.
    pub fn order(order: ByteOrder) -> Self {
        Self {
            order: Some(order),
            ..Self::default()
        }
    }

    /// Forces byte reversal for one call.
    pub fn reversed() -> Self {
        Self {
            reverse: true,
            ..Self::default()
        }
    }

    /// Overrides the text encoding for one call.
    pub fn encoding(encoding: TextEncoding) -> Self {
        Self {
            encoding: Some(encoding),
            ..Self::default()
        }
    }
}
