use tracing::debug;

use super::{
    FromTtlv, KmipDataType, ProtocolVersion, ToTtlv, expect_integer, expect_structure, format_tag,
};
use crate::{
    context::KmipContext,
    error::{KmipError, result::KmipResult},
    kmip_ensure,
    spec::{ALL_SPECS, KmipSpec, SpecSet},
    ttlv::{EncodingType, Ttlv, TtlvEnumeration, TtlvValue},
};

const TAG_REQUEST_MESSAGE: u32 = 0x42_0078;
const TAG_REQUEST_HEADER: u32 = 0x42_0077;
const TAG_BATCH_ITEM: u32 = 0x42_000F;
const TAG_MAXIMUM_RESPONSE_SIZE: u32 = 0x42_0050;
const TAG_BATCH_COUNT: u32 = 0x42_000D;
const TAG_OPERATION: u32 = 0x42_005C;
const TAG_UNIQUE_BATCH_ITEM_ID: u32 = 0x42_0093;
const TAG_REQUEST_PAYLOAD: u32 = 0x42_0079;
const SUPPORTED: SpecSet = ALL_SPECS;

/// The request header: the ProtocolVersion that governs the whole message,
/// plus the optional envelope fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRequestHeader {
    pub protocol_version: ProtocolVersion,
    pub maximum_response_size: Option<i32>,
    pub batch_count: Option<i32>,
}

impl SimpleRequestHeader {
    #[must_use]
    pub const fn new(protocol_version: ProtocolVersion) -> Self {
        Self {
            protocol_version,
            maximum_response_size: None,
            batch_count: None,
        }
    }
}

impl KmipDataType for SimpleRequestHeader {
    fn tag(&self) -> u32 {
        TAG_REQUEST_HEADER
    }

    fn encoding_type(&self) -> EncodingType {
        EncodingType::Structure
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl ToTtlv for SimpleRequestHeader {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        kmip_ensure!(
            self.is_supported_for(spec),
            KmipError::NotSupported("RequestHeader".to_owned(), spec)
        );
        let mut children = vec![self.protocol_version.to_ttlv(spec)?];
        if let Some(size) = self.maximum_response_size {
            children.push(Ttlv::new(
                TAG_MAXIMUM_RESPONSE_SIZE,
                TtlvValue::Integer(size),
            ));
        }
        if let Some(count) = self.batch_count {
            children.push(Ttlv::new(TAG_BATCH_COUNT, TtlvValue::Integer(count)));
        }
        Ok(Ttlv::new(TAG_REQUEST_HEADER, TtlvValue::Structure(children)))
    }
}

impl FromTtlv for SimpleRequestHeader {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        let children = expect_structure(ttlv, TAG_REQUEST_HEADER)?;
        let mut protocol_version = None;
        let mut maximum_response_size = None;
        let mut batch_count = None;
        for child in children {
            match child.tag {
                0x42_0069 => protocol_version = Some(ProtocolVersion::from_ttlv(spec, child)?),
                TAG_MAXIMUM_RESPONSE_SIZE => {
                    maximum_response_size =
                        Some(expect_integer(child, TAG_MAXIMUM_RESPONSE_SIZE)?);
                }
                TAG_BATCH_COUNT => batch_count = Some(expect_integer(child, TAG_BATCH_COUNT)?),
                other => {
                    debug!("ignoring header field {}", format_tag(other));
                }
            }
        }
        Ok(Self {
            protocol_version: protocol_version
                .ok_or_else(|| KmipError::NotFound("ProtocolVersion".to_owned()))?,
            maximum_response_size,
            batch_count,
        })
    }
}

/// A single batch item: the operation, an optional client-chosen id, and the
/// operation's payload left as a raw TTLV forest.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleRequestBatchItem {
    pub operation: TtlvEnumeration,
    pub unique_batch_item_id: Option<Vec<u8>>,
    pub payload: Option<Vec<Ttlv>>,
}

impl SimpleRequestBatchItem {
    #[must_use]
    pub const fn new(operation: TtlvEnumeration) -> Self {
        Self {
            operation,
            unique_batch_item_id: None,
            payload: None,
        }
    }
}

impl KmipDataType for SimpleRequestBatchItem {
    fn tag(&self) -> u32 {
        TAG_BATCH_ITEM
    }

    fn encoding_type(&self) -> EncodingType {
        EncodingType::Structure
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl ToTtlv for SimpleRequestBatchItem {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        kmip_ensure!(
            self.is_supported_for(spec),
            KmipError::NotSupported("BatchItem".to_owned(), spec)
        );
        let mut children = vec![Ttlv::new(
            TAG_OPERATION,
            TtlvValue::Enumeration(self.operation.clone()),
        )];
        if let Some(id) = &self.unique_batch_item_id {
            children.push(Ttlv::new(
                TAG_UNIQUE_BATCH_ITEM_ID,
                TtlvValue::ByteString(id.clone()),
            ));
        }
        if let Some(payload) = &self.payload {
            children.push(Ttlv::new(
                TAG_REQUEST_PAYLOAD,
                TtlvValue::Structure(payload.clone()),
            ));
        }
        Ok(Ttlv::new(TAG_BATCH_ITEM, TtlvValue::Structure(children)))
    }
}

impl FromTtlv for SimpleRequestBatchItem {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        let children = expect_structure(ttlv, TAG_BATCH_ITEM)?;
        let mut operation = None;
        let mut unique_batch_item_id = None;
        let mut payload = None;
        for child in children {
            match (child.tag, &child.value) {
                (TAG_OPERATION, TtlvValue::Enumeration(op)) => operation = Some(op.clone()),
                (TAG_OPERATION, other) => {
                    return Err(KmipError::TypeMismatch {
                        tag: format_tag(TAG_OPERATION),
                        expected: EncodingType::Enumeration.to_string(),
                        actual: other.encoding_type().to_string(),
                    });
                }
                (TAG_UNIQUE_BATCH_ITEM_ID, TtlvValue::ByteString(id)) => {
                    unique_batch_item_id = Some(id.clone());
                }
                (TAG_UNIQUE_BATCH_ITEM_ID, other) => {
                    return Err(KmipError::TypeMismatch {
                        tag: format_tag(TAG_UNIQUE_BATCH_ITEM_ID),
                        expected: EncodingType::ByteString.to_string(),
                        actual: other.encoding_type().to_string(),
                    });
                }
                (TAG_REQUEST_PAYLOAD, TtlvValue::Structure(inner)) => {
                    payload = Some(inner.clone());
                }
                (TAG_REQUEST_PAYLOAD, other) => {
                    return Err(KmipError::TypeMismatch {
                        tag: format_tag(TAG_REQUEST_PAYLOAD),
                        expected: EncodingType::Structure.to_string(),
                        actual: other.encoding_type().to_string(),
                    });
                }
                (other, _) => {
                    return Err(KmipError::InvalidAttribute(format!(
                        "unexpected child {} in BatchItem",
                        format_tag(other)
                    )));
                }
            }
        }
        let item = Self {
            operation: operation.ok_or_else(|| KmipError::NotFound("Operation".to_owned()))?,
            unique_batch_item_id,
            payload,
        };
        kmip_ensure!(
            item.is_supported_for(spec),
            KmipError::NotSupported("BatchItem".to_owned(), spec)
        );
        Ok(item)
    }
}

/// A request message: the header followed by its batch items.
///
/// The header's ProtocolVersion governs the decode of every batch item, and a
/// malformed item is captured in place instead of failing the whole message,
/// so the surviving items stay usable.
#[derive(Debug)]
pub struct SimpleRequestMessage {
    pub header: SimpleRequestHeader,
    pub batch_items: Vec<KmipResult<SimpleRequestBatchItem>>,
}

impl SimpleRequestMessage {
    #[must_use]
    pub fn new(header: SimpleRequestHeader, batch_items: Vec<SimpleRequestBatchItem>) -> Self {
        Self {
            header,
            batch_items: batch_items.into_iter().map(Ok).collect(),
        }
    }
}

impl KmipDataType for SimpleRequestMessage {
    fn tag(&self) -> u32 {
        TAG_REQUEST_MESSAGE
    }

    fn encoding_type(&self) -> EncodingType {
        EncodingType::Structure
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl ToTtlv for SimpleRequestMessage {
    /// Encodes under the header's own protocol version; items that were
    /// captured as decode errors are not re-encodable and fail the encode.
    fn to_ttlv(&self, _spec: KmipSpec) -> KmipResult<Ttlv> {
        let spec = self.header.protocol_version.spec();
        KmipContext::with_spec(spec, || {
            let mut children = vec![self.header.to_ttlv(spec)?];
            for item in &self.batch_items {
                match item {
                    Ok(item) => children.push(item.to_ttlv(spec)?),
                    Err(e) => {
                        return Err(KmipError::Default(format!(
                            "cannot encode a batch item captured as a decode error: {e}"
                        )));
                    }
                }
            }
            Ok(Ttlv::new(
                TAG_REQUEST_MESSAGE,
                TtlvValue::Structure(children),
            ))
        })
    }
}

impl FromTtlv for SimpleRequestMessage {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        let children = expect_structure(ttlv, TAG_REQUEST_MESSAGE)?;
        let (header_ttlv, item_ttlvs) = children
            .split_first()
            .ok_or_else(|| KmipError::NotFound("RequestHeader".to_owned()))?;
        let header = SimpleRequestHeader::from_ttlv(spec, header_ttlv)?;

        // from here on, the header's version governs
        let message_spec = header.protocol_version.spec();
        let batch_items = KmipContext::with_spec(message_spec, || {
            item_ttlvs
                .iter()
                .map(|item| {
                    let decoded = SimpleRequestBatchItem::from_ttlv(KmipContext::spec(), item);
                    if let Err(e) = &decoded {
                        debug!("batch item capture: {e}");
                    }
                    decoded
                })
                .collect()
        });
        Ok(Self {
            header,
            batch_items,
        })
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::{SimpleRequestBatchItem, SimpleRequestHeader, SimpleRequestMessage};
    use crate::{
        error::KmipError,
        kmip::{FromTtlv, ProtocolVersion, ToTtlv},
        spec::KmipSpec,
        ttlv::{Ttlv, TtlvEnumeration, TtlvValue},
    };

    fn create_item(id: u8) -> SimpleRequestBatchItem {
        let mut item = SimpleRequestBatchItem::new(TtlvEnumeration::from_value(0x01));
        item.unique_batch_item_id = Some(vec![id]);
        item.payload = Some(vec![Ttlv::new(
            0x42_0057,
            TtlvValue::Enumeration(TtlvEnumeration::from_value(0x02)),
        )]);
        item
    }

    #[test]
    fn round_trip_preserves_header_and_items() {
        let mut header = SimpleRequestHeader::new(ProtocolVersion::new(1, 2));
        header.maximum_response_size = Some(4096);
        header.batch_count = Some(2);
        let message = SimpleRequestMessage::new(header.clone(), vec![create_item(1), create_item(2)]);

        let bytes = message
            .to_ttlv(KmipSpec::UnknownVersion)
            .unwrap()
            .to_bytes()
            .unwrap();
        let decoded = SimpleRequestMessage::from_ttlv(
            KmipSpec::UnknownVersion,
            &Ttlv::from_bytes(&bytes).unwrap(),
        )
        .unwrap();

        assert_eq!(decoded.header, header);
        assert_eq!(decoded.batch_items.len(), 2);
        assert_eq!(
            decoded.batch_items[0].as_ref().unwrap().unique_batch_item_id,
            Some(vec![1])
        );
        assert_eq!(
            decoded.batch_items[1].as_ref().unwrap().unique_batch_item_id,
            Some(vec![2])
        );
    }

    #[test]
    fn a_malformed_item_is_captured_without_poisoning_its_neighbors() {
        let header = SimpleRequestHeader::new(ProtocolVersion::new(1, 2));
        let header_ttlv = header.to_ttlv(KmipSpec::V1_2).unwrap();
        // the middle item lacks its Operation
        let broken = Ttlv::new(
            0x42_000F,
            TtlvValue::Structure(vec![Ttlv::new(
                0x42_0093,
                TtlvValue::ByteString(vec![2]),
            )]),
        );
        let message_ttlv = Ttlv::new(
            0x42_0078,
            TtlvValue::Structure(vec![
                header_ttlv,
                create_item(1).to_ttlv(KmipSpec::V1_2).unwrap(),
                broken,
                create_item(3).to_ttlv(KmipSpec::V1_2).unwrap(),
            ]),
        );

        let decoded =
            SimpleRequestMessage::from_ttlv(KmipSpec::UnknownVersion, &message_ttlv).unwrap();
        assert_eq!(decoded.batch_items.len(), 3);
        assert!(decoded.batch_items[0].is_ok());
        assert!(matches!(
            decoded.batch_items[1],
            Err(KmipError::NotFound(_))
        ));
        assert!(decoded.batch_items[2].is_ok());

        // a message with a captured error cannot be re-encoded as-is
        assert!(decoded.to_ttlv(KmipSpec::UnknownVersion).is_err());
    }

    #[test]
    fn header_version_governs_item_decoding() {
        let header = SimpleRequestHeader::new(ProtocolVersion::new(2, 1));
        let message = SimpleRequestMessage::new(header, vec![create_item(1)]);
        let ttlv = message.to_ttlv(KmipSpec::UnknownVersion).unwrap();

        // decoding starts under the wildcard; the items still come back under
        // the header's V2_1 because the header is read first
        let decoded =
            SimpleRequestMessage::from_ttlv(KmipSpec::UnknownVersion, &ttlv).unwrap();
        assert_eq!(decoded.header.protocol_version.spec(), KmipSpec::V2_1);
        assert!(decoded.batch_items[0].is_ok());
    }

    #[test]
    fn an_empty_message_is_rejected() {
        let empty = Ttlv::new(0x42_0078, TtlvValue::Structure(Vec::new()));
        assert!(matches!(
            SimpleRequestMessage::from_ttlv(KmipSpec::UnknownVersion, &empty),
            Err(KmipError::NotFound(_))
        ));
    }
}
