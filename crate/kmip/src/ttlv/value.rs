use time::OffsetDateTime;

use super::{
    big_int::KmipBigInt,
    encoding_type::EncodingType,
    error::TtlvError,
    object::{TtlvObject, tag_to_bytes},
};

/// A typed TTLV tree node: numeric tag plus typed value.
///
/// This is the in-memory pivot between the raw wire engine ([`TtlvObject`])
/// and the JSON / XML text forms.
#[derive(Debug, Clone, PartialEq)]
pub struct Ttlv {
    pub tag: u32,
    pub value: TtlvValue,
}

/// The typed value of a TTLV node, one variant per encoding type.
#[derive(Debug, Clone, PartialEq)]
pub enum TtlvValue {
    Structure(Vec<Ttlv>),
    Integer(i32),
    LongInteger(i64),
    BigInteger(KmipBigInt),
    Enumeration(TtlvEnumeration),
    Boolean(bool),
    TextString(String),
    ByteString(Vec<u8>),
    DateTime(OffsetDateTime),
    Interval(u32),
}

impl TtlvValue {
    #[must_use]
    pub const fn encoding_type(&self) -> EncodingType {
        match self {
            Self::Structure(_) => EncodingType::Structure,
            Self::Integer(_) => EncodingType::Integer,
            Self::LongInteger(_) => EncodingType::LongInteger,
            Self::BigInteger(_) => EncodingType::BigInteger,
            Self::Enumeration(_) => EncodingType::Enumeration,
            Self::Boolean(_) => EncodingType::Boolean,
            Self::TextString(_) => EncodingType::TextString,
            Self::ByteString(_) => EncodingType::ByteString,
            Self::DateTime(_) => EncodingType::DateTime,
            Self::Interval(_) => EncodingType::Interval,
        }
    }
}

/// An enumeration value with an optional symbolic name.
///
/// The binary form only carries the 32-bit value; the text forms prefer the
/// name when one is known. Two variants compare equal by name when both carry
/// one, by value otherwise.
///
/// A variant parsed from a text form by name alone keeps `value` at 0, and
/// that 0 is what the binary form emits. Schema types that know their
/// catalog (e.g. a lifecycle state) must resolve the name back to its
/// numeric value before lowering to wire bytes.
#[derive(Debug, Clone)]
pub struct TtlvEnumeration {
    pub value: u32,
    pub name: String,
}

impl TtlvEnumeration {
    #[must_use]
    pub const fn from_value(value: u32) -> Self {
        Self {
            value,
            name: String::new(),
        }
    }
}

impl PartialEq for TtlvEnumeration {
    fn eq(&self, other: &Self) -> bool {
        if self.name.is_empty() || other.name.is_empty() {
            self.value == other.value
        } else {
            self.name == other.name
        }
    }
}

impl Ttlv {
    #[must_use]
    pub const fn new(tag: u32, value: TtlvValue) -> Self {
        Self { tag, value }
    }

    /// The child nodes of a structure; error for primitives.
    pub fn children(&self) -> Result<&[Ttlv], TtlvError> {
        match &self.value {
            TtlvValue::Structure(children) => Ok(children),
            other => Err(TtlvError::NotAStructure(
                other.encoding_type().to_string(),
            )),
        }
    }

    /// The first child with the given tag, if any.
    #[must_use]
    pub fn child(&self, tag: u32) -> Option<&Ttlv> {
        match &self.value {
            TtlvValue::Structure(children) => children.iter().find(|c| c.tag == tag),
            _ => None,
        }
    }

    /// Lower this node to a raw wire object.
    pub fn to_object(&self) -> Result<TtlvObject, TtlvError> {
        let tag = tag_to_bytes(self.tag)?;
        let encoding = self.value.encoding_type();
        let value = match &self.value {
            TtlvValue::Structure(children) => {
                let mut bytes = Vec::new();
                for child in children {
                    bytes.extend(child.to_object()?.to_bytes()?);
                }
                bytes
            }
            TtlvValue::Integer(v) => v.to_be_bytes().to_vec(),
            TtlvValue::LongInteger(v) => v.to_be_bytes().to_vec(),
            TtlvValue::BigInteger(v) => v.to_bytes_be(),
            TtlvValue::Enumeration(v) => v.value.to_be_bytes().to_vec(),
            TtlvValue::Boolean(v) => u64::from(*v).to_be_bytes().to_vec(),
            TtlvValue::TextString(v) => v.as_bytes().to_vec(),
            TtlvValue::ByteString(v) => v.clone(),
            TtlvValue::DateTime(v) => v.unix_timestamp().to_be_bytes().to_vec(),
            TtlvValue::Interval(v) => v.to_be_bytes().to_vec(),
        };
        TtlvObject::new(tag, encoding, value)
    }

    /// Lift a raw wire object into a typed node, decoding nested structures
    /// recursively.
    pub fn from_object(object: &TtlvObject) -> Result<Self, TtlvError> {
        let encoding = object.encoding_type()?;
        if let Some(expected) = encoding.raw_byte_size() {
            if object.length() != expected {
                return Err(TtlvError::InvalidValueLength {
                    encoding: encoding_name(encoding),
                    expected,
                    actual: object.length(),
                });
            }
        }
        let value = match encoding {
            EncodingType::Structure => {
                let mut children = Vec::new();
                for child in object.nested_value()? {
                    children.push(Self::from_object(&child)?);
                }
                TtlvValue::Structure(children)
            }
            EncodingType::Integer => {
                TtlvValue::Integer(i32::from_be_bytes(fixed_bytes(object)?))
            }
            EncodingType::LongInteger => {
                TtlvValue::LongInteger(i64::from_be_bytes(fixed_bytes(object)?))
            }
            EncodingType::BigInteger => {
                TtlvValue::BigInteger(KmipBigInt::from_bytes_be(object.value()))
            }
            EncodingType::Enumeration => TtlvValue::Enumeration(TtlvEnumeration::from_value(
                u32::from_be_bytes(fixed_bytes(object)?),
            )),
            EncodingType::Boolean => {
                let bytes: [u8; 8] = fixed_bytes(object)?;
                TtlvValue::Boolean(bytes[7] != 0)
            }
            EncodingType::TextString => TtlvValue::TextString(
                String::from_utf8(object.value().to_vec()).map_err(|e| {
                    TtlvError::ValueOutOfRange {
                        encoding: "TextString",
                        reason: e.to_string(),
                    }
                })?,
            ),
            EncodingType::ByteString => TtlvValue::ByteString(object.value().to_vec()),
            EncodingType::DateTime => {
                let timestamp = i64::from_be_bytes(fixed_bytes(object)?);
                TtlvValue::DateTime(OffsetDateTime::from_unix_timestamp(timestamp).map_err(
                    |e| TtlvError::ValueOutOfRange {
                        encoding: "DateTime",
                        reason: e.to_string(),
                    },
                )?)
            }
            EncodingType::Interval => {
                TtlvValue::Interval(u32::from_be_bytes(fixed_bytes(object)?))
            }
        };
        Ok(Self {
            tag: object.tag_value(),
            value,
        })
    }

    /// Encode this tree to TTLV wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TtlvError> {
        self.to_object()?.to_bytes()
    }

    /// Decode one tree from TTLV wire bytes; trailing bytes are an error.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TtlvError> {
        let (object, consumed) = TtlvObject::from_bytes(data)?;
        if consumed != data.len() {
            return Err(TtlvError::Custom(format!(
                "trailing bytes after TTLV record: {} consumed, {} available",
                consumed,
                data.len()
            )));
        }
        Self::from_object(&object)
    }
}

const fn encoding_name(encoding: EncodingType) -> &'static str {
    match encoding {
        EncodingType::Structure => "Structure",
        EncodingType::Integer => "Integer",
        EncodingType::LongInteger => "LongInteger",
        EncodingType::BigInteger => "BigInteger",
        EncodingType::Enumeration => "Enumeration",
        EncodingType::Boolean => "Boolean",
        EncodingType::TextString => "TextString",
        EncodingType::ByteString => "ByteString",
        EncodingType::DateTime => "DateTime",
        EncodingType::Interval => "Interval",
    }
}

fn fixed_bytes<const N: usize>(object: &TtlvObject) -> Result<[u8; N], TtlvError> {
    object
        .value()
        .try_into()
        .map_err(|_| TtlvError::InvalidValueLength {
            encoding: match object.encoding_type() {
                Ok(encoding) => encoding_name(encoding),
                Err(_) => "unknown",
            },
            expected: N,
            actual: object.length(),
        })
}
