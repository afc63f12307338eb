use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::error::TtlvError;

/// The ten KMIP item types of the TTLV encoding.
///
/// Each kind carries its wire code byte and, for fixed-length kinds, the raw
/// byte size of the value before padding.
#[derive(
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Display,
    EnumString,
    EnumIter,
)]
pub enum EncodingType {
    Structure,
    Integer,
    LongInteger,
    BigInteger,
    Enumeration,
    Boolean,
    TextString,
    ByteString,
    DateTime,
    Interval,
}

impl EncodingType {
    /// The wire code byte of this item type.
    #[must_use]
    pub const fn type_byte(self) -> u8 {
        match self {
            Self::Structure => 0x01,
            Self::Integer => 0x02,
            Self::LongInteger => 0x03,
            Self::BigInteger => 0x04,
            Self::Enumeration => 0x05,
            Self::Boolean => 0x06,
            Self::TextString => 0x07,
            Self::ByteString => 0x08,
            Self::DateTime => 0x09,
            Self::Interval => 0x0A,
        }
    }

    /// Raw value size in bytes before padding, `None` for variable-length kinds.
    #[must_use]
    pub const fn raw_byte_size(self) -> Option<usize> {
        match self {
            Self::Structure | Self::BigInteger | Self::TextString | Self::ByteString => None,
            Self::Integer | Self::Enumeration | Self::Interval => Some(4),
            Self::LongInteger | Self::Boolean | Self::DateTime => Some(8),
        }
    }

    #[must_use]
    pub const fn is_fixed_length(self) -> bool {
        self.raw_byte_size().is_some()
    }

    pub const fn from_type_byte(byte: u8) -> Result<Self, TtlvError> {
        Ok(match byte {
            0x01 => Self::Structure,
            0x02 => Self::Integer,
            0x03 => Self::LongInteger,
            0x04 => Self::BigInteger,
            0x05 => Self::Enumeration,
            0x06 => Self::Boolean,
            0x07 => Self::TextString,
            0x08 => Self::ByteString,
            0x09 => Self::DateTime,
            0x0A => Self::Interval,
            other => return Err(TtlvError::InvalidTypeByte(other)),
        })
    }

    pub fn from_name(name: &str) -> Result<Self, TtlvError> {
        Self::from_str(name).map_err(|_| TtlvError::InvalidTypeName(name.to_owned()))
    }
}
