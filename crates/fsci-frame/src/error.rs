/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The trailing checksum does not match the packet contents.
    #[error("checksum mismatch (expected {expected:#04x}, got {actual:#04x})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing packets.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors raised by the payload cursors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Not enough bytes left for a declared field.
    #[error("truncated field `{field}` ({needed} bytes needed, {remaining} remaining)")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// An encoder wrote past the buffer it was sized for.
    #[error("write overflow ({needed} bytes needed, {remaining} remaining)")]
    Overflow { needed: usize, remaining: usize },

    /// A variable-length sub-block could not be allocated.
    #[error("out of memory allocating `{field}` ({requested} bytes)")]
    OutOfMemory { field: &'static str, requested: usize },

    /// A field holds a value outside its domain.
    #[error("invalid value {value:#x} for field `{field}`")]
    InvalidValue { field: &'static str, value: u32 },

    /// Bytes were left over after a complete record was decoded.
    #[error("{count} trailing bytes after record")]
    TrailingBytes { count: usize },

    /// An encoder wrote fewer bytes than its size calculator promised.
    #[error("size mismatch (sized {expected} bytes, wrote {written})")]
    SizeMismatch { expected: usize, written: usize },

    /// A length does not fit the width of its wire prefix.
    #[error("length {len} does not fit the prefix of field `{field}`")]
    LengthOverflow { field: &'static str, len: usize },
}

pub type WireResult<T> = std::result::Result<T, WireError>;
