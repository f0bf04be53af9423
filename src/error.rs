use std::fmt;

pub type EncodeResult<T, E = EncodeError> = std::result::Result<T, E>;
pub type DecodeResult<T, E = DecodeError> = std::result::Result<T, E>;

/// Failures while building a chunk stream. Nothing is retried; whatever was already appended to
/// the output before the failing chunk stays there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// A VarInt (chunk id, length, or array count) exceeded 42 bits.
    ValueTooLarge(u64),
    /// A chunk id was negative.
    NegativeId(i64),
    /// Array elements didn't all share one value variant.
    ArrayTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// Raw byte array elements didn't all share one length.
    ArrayElementLengthMismatch { expected: usize, actual: usize },
    /// A non-empty raw byte array held only empty byte strings.
    ZeroWidthArray { count: usize },
    /// The value can't be encoded in this position (e.g. a string inside an array).
    UnsupportedValueType(&'static str),
    /// `leave_container` was called with no container open.
    LeaveAtOutermostContainer,
    /// `finish` was called while containers were still open.
    UnclosedContainers { open: usize },
    /// A record field has no id in the key table used to encode it.
    MissingKey {
        parent: Option<String>,
        name: String,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodeError::ValueTooLarge(v) => {
                write!(f, "Value {} is too large for a 42-bit VarInt", v)
            }
            EncodeError::NegativeId(v) => write!(f, "Chunk id {} is negative", v),
            EncodeError::ArrayTypeMismatch { expected, actual } => write!(
                f,
                "Array elements must share one type: expected {}, got {}",
                expected, actual
            ),
            EncodeError::ArrayElementLengthMismatch { expected, actual } => write!(
                f,
                "Array elements cannot differ in length: expected {} bytes, got {}",
                expected, actual
            ),
            EncodeError::ZeroWidthArray { count } => write!(
                f,
                "Array of {} empty byte strings cannot be encoded",
                count
            ),
            EncodeError::UnsupportedValueType(name) => {
                write!(f, "Value type {} is not supported here", name)
            }
            EncodeError::LeaveAtOutermostContainer => {
                f.write_str("Cannot leave the outermost container")
            }
            EncodeError::UnclosedContainers { open } => {
                write!(f, "Encoding finished with {} container(s) still open", open)
            }
            EncodeError::MissingKey {
                ref parent,
                ref name,
            } => match parent {
                Some(parent) => write!(
                    f,
                    "Field {:?} under {:?} is not in the key table",
                    name, parent
                ),
                None => write!(f, "Top-level field {:?} is not in the key table", name),
            },
        }
    }
}

impl std::error::Error for EncodeError {}

/// Failures while reading a chunk stream. Every read is bounds-checked, so corrupted or
/// adversarial input always ends up here instead of panicking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Data ended too early.
    TruncatedBuffer {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// A VarInt started with a byte that isn't a valid lead byte.
    InvalidLeadByte(u8),
    /// A decoded VarInt doesn't fit in a `usize` on this platform.
    VarIntOutOfRange(u64),
    /// Chunk header carried a type tag with no defined meaning.
    UnknownTypeTag(u8),
    /// The type tag is valid, but not for an array chunk.
    InvalidArrayType(u8),
    /// Array payload couldn't be split into `count` equal-width elements.
    ArrayWidthNotDivisible { payload: usize, count: usize },
    /// A non-empty raw byte array had no element bytes.
    ZeroWidthArray { count: usize },
    /// Array element count exceeded the configured limit.
    ArrayTooLong { max: usize, actual: usize },
    /// A signed integer payload was empty or wider than 8 bytes.
    InvalidIntegerWidth(usize),
    /// A float payload wasn't exactly 8 bytes.
    InvalidFloatWidth(usize),
    /// A string payload wasn't valid UTF-8.
    InvalidUtf8,
    /// `enter_container` was called when the last chunk read wasn't a container.
    NotAtContainer,
    /// `leave_container` was called with no container entered.
    LeaveAtOutermostContainer,
    /// The decoder was used again after it had already returned an error.
    AlreadyFailed,
    /// Container nesting went deeper than the configured limit.
    DepthLimitExceeded { max: usize },
    /// A chunk id had no entry in the stream's key table.
    UnresolvedKeyId { id: u64, parent: Option<String> },
    /// The stream didn't start with a key table chunk.
    MissingKeyTable,
    /// The key table chunk itself was malformed.
    MalformedKeyTable(String),
    /// A top-level chunk after the key table wasn't a record container.
    UnexpectedRecordChunk { id: u64 },
    /// The stream held a different number of records than the caller asked for.
    RecordCount { expected: usize, actual: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::TruncatedBuffer {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected {} bytes, but only {} remain on step [{}]",
                expected, actual, step
            ),
            DecodeError::InvalidLeadByte(b) => write!(f, "Invalid VarInt lead byte 0x{:02x}", b),
            DecodeError::VarIntOutOfRange(v) => {
                write!(f, "VarInt value {} does not fit in a usize", v)
            }
            DecodeError::UnknownTypeTag(t) => write!(f, "Unknown chunk type tag {}", t),
            DecodeError::InvalidArrayType(t) => {
                write!(f, "Chunk type tag {} cannot be used for an array", t)
            }
            DecodeError::ArrayWidthNotDivisible { payload, count } => write!(
                f,
                "Array element region of {} bytes cannot hold {} equal-width elements",
                payload, count
            ),
            DecodeError::ZeroWidthArray { count } => write!(
                f,
                "Array claims {} elements but has no element bytes",
                count
            ),
            DecodeError::ArrayTooLong { max, actual } => write!(
                f,
                "Array has {} elements, maximum allowed is {}",
                actual, max
            ),
            DecodeError::InvalidIntegerWidth(w) => {
                write!(f, "Signed integer cannot be {} bytes wide", w)
            }
            DecodeError::InvalidFloatWidth(w) => {
                write!(f, "Float64 must be 8 bytes wide, got {}", w)
            }
            DecodeError::InvalidUtf8 => f.write_str("String payload is not valid UTF-8"),
            DecodeError::NotAtContainer => {
                f.write_str("Cannot enter: the last chunk read was not a container")
            }
            DecodeError::LeaveAtOutermostContainer => {
                f.write_str("Cannot leave the outermost container")
            }
            DecodeError::AlreadyFailed => {
                f.write_str("Decoder already failed on an earlier chunk")
            }
            DecodeError::DepthLimitExceeded { max } => {
                write!(f, "Container nesting exceeded depth limit of {}", max)
            }
            DecodeError::UnresolvedKeyId { id, ref parent } => match parent {
                Some(parent) => {
                    write!(f, "Key id {} under {:?} is not in the key table", id, parent)
                }
                None => write!(f, "Key id {} at the top level is not in the key table", id),
            },
            DecodeError::MissingKeyTable => f.write_str("Stream does not start with a key table"),
            DecodeError::MalformedKeyTable(ref msg) => write!(f, "Malformed key table: {}", msg),
            DecodeError::UnexpectedRecordChunk { id } => write!(
                f,
                "Top-level chunk with id {} is not a record container",
                id
            ),
            DecodeError::RecordCount { expected, actual } => write!(
                f,
                "Expected {} record(s), but the stream holds {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for DecodeError {}
