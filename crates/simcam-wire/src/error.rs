/// Errors that can occur while encoding or decoding the step protocol.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The packet header contains an invalid magic number.
    #[error("invalid packet magic (expected 0x5343 \"SC\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A record tag that has no meaning at this point of the stream.
    #[error("unknown record tag 0x{0:02x}")]
    UnknownTag(u8),

    /// A record ended before all of its fields were read.
    #[error("truncated {field}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A count field carried a negative value.
    #[error("negative {field} count: {value}")]
    NegativeCount { field: &'static str, value: i32 },

    /// A string field was not valid UTF-8 or lacked its terminator.
    #[error("malformed string: {0}")]
    MalformedString(String),

    /// An image payload does not match its declared dimensions.
    #[error("image payload is {actual} bytes, expected {expected} for {width}x{height}")]
    ImageSize {
        width: u16,
        height: u16,
        expected: usize,
        actual: usize,
    },

    /// An I/O error occurred while reading or writing packets.
    #[error("packet I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,
}

impl WireError {
    /// Whether the error means the byte stream can no longer be trusted.
    ///
    /// I/O failures are reported to the caller as-is; everything else means
    /// the two sides disagree about where records start.
    pub fn is_desync(&self) -> bool {
        !matches!(self, WireError::Io(_) | WireError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
