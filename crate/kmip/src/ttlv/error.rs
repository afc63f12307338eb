use thiserror::Error;

/// Errors raised by the TTLV wire format engine.
///
/// Every variant maps to one malformed-wire condition so callers can match on
/// the exact failure instead of parsing strings.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TtlvError {
    #[error("data too short for TTLV header: required {required}, available {available}")]
    DataTooShort { required: usize, available: usize },

    #[error("empty TTLV input")]
    EmptyInput,

    #[error("insufficient padding data: required {required}, available {available}")]
    InsufficientPaddingData { required: usize, available: usize },

    #[error("insufficient value data: required {required}, available {available}")]
    InsufficientValueData { required: usize, available: usize },

    #[error("invalid encoding type byte: {0:#04x}")]
    InvalidTypeByte(u8),

    #[error("invalid encoding type name: {0}")]
    InvalidTypeName(String),

    #[error("tag must be {expected} bytes, got {actual}")]
    InvalidTagLength { expected: usize, actual: usize },

    #[error("tag value {0:#x} exceeds the 3-byte tag domain")]
    InvalidTagValue(u32),

    #[error("invalid {encoding} value length: expected {expected}, got {actual}")]
    InvalidValueLength {
        encoding: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("value length {0} exceeds the 32-bit TTLV length domain")]
    LengthOverflow(usize),

    #[error("{encoding} value is out of range: {reason}")]
    ValueOutOfRange {
        encoding: &'static str,
        reason: String,
    },

    #[error("expected a Structure value, got {0}")]
    NotAStructure(String),

    #[error("expected a primitive value, got a Structure")]
    NotAPrimitive,

    #[error("TTLV input length {0} is not a multiple of 8")]
    UnalignedInput(usize),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for TtlvError {
    fn from(value: String) -> Self {
        Self::Custom(value)
    }
}

impl From<&str> for TtlvError {
    fn from(value: &str) -> Self {
        Self::Custom(value.to_owned())
    }
}
