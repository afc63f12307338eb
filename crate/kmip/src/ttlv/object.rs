use std::fmt::Write;

use tracing::trace;

use super::{encoding_type::EncodingType, error::TtlvError};

/// Size in bytes of a TTLV tag.
pub const TAG_SIZE: usize = 3;
/// Size in bytes of a TTLV header: 3-byte tag, 1-byte type, 4-byte length.
pub const HEADER_SIZE: usize = 8;
/// TTLV items are padded with zero bytes to a multiple of this alignment.
pub const ALIGNMENT: usize = 8;

/// Total aligned size of an item whose header plus value spans `content` bytes.
#[must_use]
pub const fn padded_length(content: usize) -> usize {
    content.div_ceil(ALIGNMENT) * ALIGNMENT
}

/// A single TTLV record: 3-byte tag, encoding type byte and raw value bytes.
///
/// The value of a `Structure` item is the concatenation of the encodings of
/// its children; [`TtlvObject::nested_value`] recovers them. Instances are
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlvObject {
    tag: [u8; TAG_SIZE],
    encoding_type: u8,
    value: Vec<u8>,
}

impl TtlvObject {
    /// Build a record from its parts. The value length must fit the 4-byte
    /// length field.
    pub fn new(
        tag: [u8; TAG_SIZE],
        encoding_type: EncodingType,
        value: Vec<u8>,
    ) -> Result<Self, TtlvError> {
        if u32::try_from(value.len()).is_err() {
            return Err(TtlvError::LengthOverflow(value.len()));
        }
        Ok(Self {
            tag,
            encoding_type: encoding_type.type_byte(),
            value,
        })
    }

    /// Build a record from a numeric tag, which must fit 24 bits.
    pub fn from_tag_value(
        tag: u32,
        encoding_type: EncodingType,
        value: Vec<u8>,
    ) -> Result<Self, TtlvError> {
        Self::new(tag_to_bytes(tag)?, encoding_type, value)
    }

    /// Build a record from a tag slice, validating its length.
    pub fn try_new(tag: &[u8], encoding_type: EncodingType, value: Vec<u8>) -> Result<Self, TtlvError> {
        let tag: [u8; TAG_SIZE] = tag.try_into().map_err(|_| TtlvError::InvalidTagLength {
            expected: TAG_SIZE,
            actual: tag.len(),
        })?;
        Self::new(tag, encoding_type, value)
    }

    #[must_use]
    pub const fn tag(&self) -> [u8; TAG_SIZE] {
        self.tag
    }

    /// The tag as a 24-bit big-endian integer.
    #[must_use]
    pub const fn tag_value(&self) -> u32 {
        u32::from_be_bytes([0, self.tag[0], self.tag[1], self.tag[2]])
    }

    #[must_use]
    pub const fn type_byte(&self) -> u8 {
        self.encoding_type
    }

    pub const fn encoding_type(&self) -> Result<EncodingType, TtlvError> {
        EncodingType::from_type_byte(self.encoding_type)
    }

    /// The value length in bytes, before padding.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.value.len()
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[must_use]
    pub fn is_structure(&self) -> bool {
        self.encoding_type == EncodingType::Structure.type_byte()
    }

    /// The raw value of a primitive item; error when called on a structure.
    pub fn primitive_value(&self) -> Result<&[u8], TtlvError> {
        if self.is_structure() {
            return Err(TtlvError::NotAPrimitive);
        }
        Ok(&self.value)
    }

    /// Decode the children of a structure item; error when called on a
    /// primitive.
    pub fn nested_value(&self) -> Result<Vec<Self>, TtlvError> {
        if !self.is_structure() {
            return Err(TtlvError::NotAStructure(match self.encoding_type() {
                Ok(encoding) => encoding.to_string(),
                Err(_) => format!("type byte {:#04x}", self.encoding_type),
            }));
        }
        if self.value.is_empty() {
            return Ok(Vec::new());
        }
        Self::from_bytes_multiple(&self.value)
    }

    /// Encode this record: header, value, zero padding to an 8-byte boundary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TtlvError> {
        let length =
            u32::try_from(self.value.len()).map_err(|_| TtlvError::LengthOverflow(self.value.len()))?;
        let total = padded_length(HEADER_SIZE + self.value.len());
        let mut bytes = Vec::with_capacity(total);
        bytes.extend_from_slice(&self.tag);
        bytes.push(self.encoding_type);
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&self.value);
        bytes.resize(total, 0);
        Ok(bytes)
    }

    /// Decode one record from the front of `data`, returning it together with
    /// the number of bytes consumed (header, value and padding).
    ///
    /// Padding bytes must be present but their content is not validated:
    /// reads are permissive, writes are strict.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), TtlvError> {
        let header: &[u8; HEADER_SIZE] =
            data.get(..HEADER_SIZE)
                .and_then(|h| h.try_into().ok())
                .ok_or(TtlvError::DataTooShort {
                    required: HEADER_SIZE,
                    available: data.len(),
                })?;
        let tag = [header[0], header[1], header[2]];
        let encoding_type = header[3];
        let length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let rest = &data[HEADER_SIZE..];
        let value = rest
            .get(..length)
            .ok_or(TtlvError::InsufficientValueData {
                required: length,
                available: rest.len(),
            })?
            .to_vec();

        let padding = padded_length(HEADER_SIZE + length) - (HEADER_SIZE + length);
        let trailing = rest.len() - length;
        if trailing < padding {
            return Err(TtlvError::InsufficientPaddingData {
                required: padding,
                available: trailing,
            });
        }

        let consumed = HEADER_SIZE + length + padding;
        trace!(
            "decoded TTLV tag {} type {encoding_type:#04x} length {length} ({consumed} bytes)",
            hex::encode_upper(tag)
        );
        Ok((
            Self {
                tag,
                encoding_type,
                value,
            },
            consumed,
        ))
    }

    /// Decode a sequence of adjacent records until the input is exhausted.
    ///
    /// The input must be non-empty, at least one header long, and 8-byte
    /// aligned overall.
    pub fn from_bytes_multiple(data: &[u8]) -> Result<Vec<Self>, TtlvError> {
        if data.is_empty() {
            return Err(TtlvError::EmptyInput);
        }
        if data.len() < HEADER_SIZE {
            return Err(TtlvError::DataTooShort {
                required: HEADER_SIZE,
                available: data.len(),
            });
        }
        if !data.len().is_multiple_of(ALIGNMENT) {
            return Err(TtlvError::UnalignedInput(data.len()));
        }
        let mut objects = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let (object, consumed) = Self::from_bytes(&data[offset..])?;
            offset += consumed;
            objects.push(object);
        }
        Ok(objects)
    }

    /// The full encoding as a contiguous hex string.
    pub fn hex_string(&self) -> Result<String, TtlvError> {
        Ok(hex::encode_upper(self.to_bytes()?))
    }

    /// An indented, recursive hex dump: one line per header and value, nested
    /// structures indented. Undecodable nested content degrades to a flat
    /// value dump.
    #[must_use]
    pub fn structured_hex_string(&self) -> String {
        let mut out = String::new();
        self.write_hex_dump(&mut out, 0);
        out
    }

    fn write_hex_dump(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let length = u32::try_from(self.value.len()).unwrap_or(u32::MAX);
        let _ = writeln!(
            out,
            "{indent}{} {:02X} {}",
            hex::encode_upper(self.tag),
            self.encoding_type,
            hex::encode_upper(length.to_be_bytes())
        );
        if self.is_structure() {
            if let Ok(children) = self.nested_value() {
                for child in children {
                    child.write_hex_dump(out, depth + 1);
                }
                return;
            }
        }
        if !self.value.is_empty() {
            let _ = writeln!(out, "{indent}  {}", hex::encode_upper(&self.value));
        }
    }

    /// A tag/type/length/value text dump for diagnostics.
    #[must_use]
    pub fn structured_string(&self) -> String {
        let mut out = String::new();
        self.write_text_dump(&mut out, 0);
        out
    }

    fn write_text_dump(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let type_name = match self.encoding_type() {
            Ok(encoding) => encoding.to_string(),
            Err(_) => format!("{:#04x}", self.encoding_type),
        };
        let _ = writeln!(out, "{indent}Tag: 0x{}", hex::encode_upper(self.tag));
        let _ = writeln!(out, "{indent}Type: {type_name}");
        let _ = writeln!(out, "{indent}Length: {}", self.value.len());
        if self.is_structure() {
            if let Ok(children) = self.nested_value() {
                let _ = writeln!(out, "{indent}Value:");
                for child in children {
                    child.write_text_dump(out, depth + 1);
                }
                return;
            }
        }
        let _ = writeln!(out, "{indent}Value: {}", hex::encode_upper(&self.value));
    }
}

/// Convert a 24-bit numeric tag to its big-endian byte form.
pub const fn tag_to_bytes(tag: u32) -> Result<[u8; TAG_SIZE], TtlvError> {
    if tag > 0x00FF_FFFF {
        return Err(TtlvError::InvalidTagValue(tag));
    }
    let bytes = tag.to_be_bytes();
    Ok([bytes[1], bytes[2], bytes[3]])
}

/// Convert a 3-byte tag to its numeric form.
#[must_use]
pub const fn tag_from_bytes(tag: [u8; TAG_SIZE]) -> u32 {
    u32::from_be_bytes([0, tag[0], tag[1], tag[2]])
}

#[allow(clippy::unwrap_used, clippy::panic_in_result_fn)]
#[cfg(test)]
mod tests {
    use super::{HEADER_SIZE, TAG_SIZE, TtlvObject, padded_length, tag_to_bytes};
    use crate::ttlv::{EncodingType, TtlvError};

    #[test]
    fn padding_arithmetic() {
        assert_eq!(padded_length(8), 8);
        assert_eq!(padded_length(9), 16);
        assert_eq!(padded_length(12), 16);
        assert_eq!(padded_length(16), 16);
        assert_eq!(padded_length(19), 24);
    }

    #[test]
    fn integer_encoding_is_padded_to_16_bytes() {
        // KMIP 1.0 spec 9.1.2: an Integer containing the decimal value 8
        let object = TtlvObject::new(
            [0x42, 0x00, 0x20],
            EncodingType::Integer,
            8_i32.to_be_bytes().to_vec(),
        )
        .unwrap();
        assert_eq!(
            object.to_bytes().unwrap(),
            hex::decode("42002002000000040000000800000000").unwrap()
        );
    }

    #[test]
    fn text_string_encoding_is_padded_to_24_bytes() {
        // KMIP 1.0 spec 9.1.2: a Text String containing "Hello World"
        let object = TtlvObject::new(
            [0x42, 0x00, 0x20],
            EncodingType::TextString,
            b"Hello World".to_vec(),
        )
        .unwrap();
        assert_eq!(
            object.to_bytes().unwrap(),
            hex::decode("420020070000000B48656C6C6F20576F726C640000000000").unwrap()
        );
    }

    #[test]
    fn byte_string_encoding_is_padded_to_16_bytes() {
        // KMIP 1.0 spec 9.1.2: a Byte String containing the bytes 01 02 03
        let object = TtlvObject::new(
            [0x42, 0x00, 0x20],
            EncodingType::ByteString,
            vec![0x01, 0x02, 0x03],
        )
        .unwrap();
        assert_eq!(
            object.to_bytes().unwrap(),
            hex::decode("42002008000000030102030000000000").unwrap()
        );
    }

    #[test]
    fn boolean_encoding_has_no_padding() {
        // KMIP 1.0 spec 9.1.2: a Boolean containing True
        let object = TtlvObject::new(
            [0x42, 0x00, 0x20],
            EncodingType::Boolean,
            vec![0, 0, 0, 0, 0, 0, 0, 1],
        )
        .unwrap();
        assert_eq!(
            object.to_bytes().unwrap(),
            hex::decode("42002006000000080000000000000001").unwrap()
        );
    }

    #[test]
    fn round_trip_preserves_object_and_reports_consumed_bytes() {
        let object = TtlvObject::new(
            [0x42, 0x00, 0x20],
            EncodingType::TextString,
            b"Hello World".to_vec(),
        )
        .unwrap();
        let bytes = object.to_bytes().unwrap();
        let (decoded, consumed) = TtlvObject::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, object);
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded.length(), 11);
        assert_eq!(decoded.tag_value(), 0x0042_0020);
    }

    #[test]
    fn decode_ignores_non_zero_padding() {
        let object = TtlvObject::new(
            [0x42, 0x00, 0x20],
            EncodingType::ByteString,
            vec![0xAA, 0xBB],
        )
        .unwrap();
        let mut bytes = object.to_bytes().unwrap();
        // corrupt the padding area
        let len = bytes.len();
        bytes[len - 1] = 0xFF;
        let (decoded, _) = TtlvObject::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.value(), &[0xAA, 0xBB]);
    }

    #[test]
    fn decode_fails_on_short_header() {
        let err = TtlvObject::from_bytes(&[0x42, 0x00, 0x20, 0x02]).unwrap_err();
        assert_eq!(
            err,
            TtlvError::DataTooShort {
                required: HEADER_SIZE,
                available: 4
            }
        );
        assert!(err.to_string().contains("data too short"));
    }

    #[test]
    fn decode_fails_on_truncated_value() {
        // header declares 4 value bytes but only 2 follow
        let mut bytes = vec![0x42, 0x00, 0x20, 0x02, 0x00, 0x00, 0x00, 0x04];
        bytes.extend_from_slice(&[0x00, 0x01]);
        assert_eq!(
            TtlvObject::from_bytes(&bytes).unwrap_err(),
            TtlvError::InsufficientValueData {
                required: 4,
                available: 2
            }
        );
    }

    #[test]
    fn decode_fails_on_truncated_padding() {
        // 3 value bytes present but the 5 padding bytes are missing
        let mut bytes = vec![0x42, 0x00, 0x20, 0x08, 0x00, 0x00, 0x00, 0x03];
        bytes.extend_from_slice(&[0x01, 0x02, 0x03]);
        assert_eq!(
            TtlvObject::from_bytes(&bytes).unwrap_err(),
            TtlvError::InsufficientPaddingData {
                required: 5,
                available: 0
            }
        );
    }

    #[test]
    fn multiple_record_decode() {
        let first = TtlvObject::new(
            [0x42, 0x00, 0x0A],
            EncodingType::TextString,
            b"x-attr".to_vec(),
        )
        .unwrap();
        let second = TtlvObject::new(
            [0x42, 0x00, 0x0B],
            EncodingType::Integer,
            7_i32.to_be_bytes().to_vec(),
        )
        .unwrap();
        let mut bytes = first.to_bytes().unwrap();
        bytes.extend(second.to_bytes().unwrap());
        let decoded = TtlvObject::from_bytes_multiple(&bytes).unwrap();
        assert_eq!(decoded, vec![first, second]);
    }

    #[test]
    fn multiple_record_decode_rejects_bad_input() {
        assert_eq!(
            TtlvObject::from_bytes_multiple(&[]).unwrap_err(),
            TtlvError::EmptyInput
        );
        assert_eq!(
            TtlvObject::from_bytes_multiple(&[0x42, 0x00, 0x20]).unwrap_err(),
            TtlvError::DataTooShort {
                required: HEADER_SIZE,
                available: 3
            }
        );
        let object = TtlvObject::new([0x42, 0x00, 0x20], EncodingType::Integer, vec![0, 0, 0, 1])
            .unwrap();
        let mut bytes = object.to_bytes().unwrap();
        bytes.push(0);
        assert_eq!(
            TtlvObject::from_bytes_multiple(&bytes).unwrap_err(),
            TtlvError::UnalignedInput(17)
        );
    }

    #[test]
    fn protocol_version_structure_layout() {
        // ProtocolVersion { Major = 1, Minor = 2 }: 32 bytes total with the
        // child headers at offsets 8 and 24
        let major = TtlvObject::new(
            [0x42, 0x00, 0x6A],
            EncodingType::Integer,
            1_i32.to_be_bytes().to_vec(),
        )
        .unwrap();
        let minor = TtlvObject::new(
            [0x42, 0x00, 0x6B],
            EncodingType::Integer,
            2_i32.to_be_bytes().to_vec(),
        )
        .unwrap();
        let mut value = major.to_bytes().unwrap();
        value.extend(minor.to_bytes().unwrap());
        let version = TtlvObject::new([0x42, 0x00, 0x69], EncodingType::Structure, value).unwrap();

        let bytes = version.to_bytes().unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..8], hex::decode("4200690100000018").unwrap().as_slice());
        assert_eq!(&bytes[8..16], hex::decode("42006A0200000004").unwrap().as_slice());
        assert_eq!(&bytes[16..24], hex::decode("0000000100000000").unwrap().as_slice());
        assert_eq!(&bytes[24..32], hex::decode("42006B0200000004").unwrap().as_slice());

        let (decoded, consumed) = TtlvObject::from_bytes(&bytes).unwrap();
        assert_eq!(consumed, 32);
        assert!(decoded.is_structure());
        assert_eq!(decoded.nested_value().unwrap(), vec![major, minor]);
    }

    #[test]
    fn nested_value_rejects_primitives_and_vice_versa() {
        let primitive =
            TtlvObject::new([0x42, 0x00, 0x20], EncodingType::Integer, vec![0, 0, 0, 1]).unwrap();
        assert!(matches!(
            primitive.nested_value().unwrap_err(),
            TtlvError::NotAStructure(_)
        ));
        assert!(primitive.primitive_value().is_ok());

        let structure =
            TtlvObject::new([0x42, 0x00, 0x69], EncodingType::Structure, Vec::new()).unwrap();
        assert_eq!(structure.nested_value().unwrap(), Vec::new());
        assert_eq!(
            structure.primitive_value().unwrap_err(),
            TtlvError::NotAPrimitive
        );
    }

    #[test]
    fn tag_conversions() {
        assert_eq!(tag_to_bytes(0x0042_0069).unwrap(), [0x42, 0x00, 0x69]);
        assert_eq!(
            tag_to_bytes(0x0100_0000).unwrap_err(),
            TtlvError::InvalidTagValue(0x0100_0000)
        );
        assert_eq!(
            TtlvObject::try_new(&[0x42, 0x00], EncodingType::Integer, vec![0, 0, 0, 1])
                .unwrap_err(),
            TtlvError::InvalidTagLength {
                expected: TAG_SIZE,
                actual: 2
            }
        );
    }

    #[test]
    fn diagnostic_dumps_render() {
        let object = TtlvObject::new(
            [0x42, 0x00, 0x20],
            EncodingType::ByteString,
            vec![0x01, 0x02, 0x03],
        )
        .unwrap();
        assert_eq!(
            object.hex_string().unwrap(),
            "42002008000000030102030000000000"
        );
        let text = object.structured_string();
        assert!(text.contains("Tag: 0x420020"));
        assert!(text.contains("Type: ByteString"));
        assert!(text.contains("Length: 3"));
        assert!(object.structured_hex_string().contains("010203"));
    }
}
