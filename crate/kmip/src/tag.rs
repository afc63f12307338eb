//! The protocol-version-scoped tag registry.
//!
//! Standard tags are compiled in; extension tags live in the custom band
//! `0x540000..=0x54FFFF` and are registered at runtime. Registration is
//! last-write-wins: re-registering a value replaces the previous entry.

use std::collections::HashMap;
use std::sync::RwLock;

use lazy_static::lazy_static;
use tracing::debug;

use crate::{
    error::{KmipError, result::KmipResult},
    kmip_bail, kmip_ensure,
    spec::{ALL_SPECS, KmipSpec, SpecSet},
    ttlv::{TAG_SIZE, tag_to_bytes},
};

/// First value of the custom tag extension band.
pub const EXTENSION_START: u32 = 0x0054_0000;
/// Last value of the custom tag extension band.
pub const EXTENSION_END: u32 = 0x0054_FFFF;

/// A registered tag: numeric value, symbolic description and the protocol
/// versions it is valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    value: u32,
    description: String,
    supported: SpecSet,
    custom: bool,
}

impl TagValue {
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn supported(&self) -> SpecSet {
        self.supported
    }

    /// Whether this tag comes from the runtime extension band.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        self.custom
    }

    #[must_use]
    pub const fn is_supported_for(&self, spec: KmipSpec) -> bool {
        self.supported.supports(spec)
    }

    /// The 3-byte big-endian wire form of this tag.
    #[must_use]
    pub fn tag_bytes(&self) -> [u8; TAG_SIZE] {
        // registered values are always within the 24-bit tag domain
        tag_to_bytes(self.value).unwrap_or([0, 0, 0])
    }

    #[must_use]
    pub fn hex_string(&self) -> String {
        format!("0x{}", hex::encode_upper(self.tag_bytes()))
    }
}

const V1_2_ONLY: SpecSet = SpecSet::UNKNOWN.union(SpecSet::V1_2);
const THROUGH_V2_1: SpecSet = SpecSet::UNKNOWN.union(SpecSet::V1_2).union(SpecSet::V2_1);

/// The compiled-in standard catalog: KMIP registry values with the protocol
/// versions each tag is defined for. Gaps are tags this codec never touches.
const STANDARD_TAGS: &[(u32, &str, SpecSet)] = &[
    (0x42_0001, "ActivationDate", ALL_SPECS),
    (0x42_0002, "ApplicationData", ALL_SPECS),
    (0x42_0003, "ApplicationNamespace", ALL_SPECS),
    (0x42_0004, "ApplicationSpecificInformation", ALL_SPECS),
    (0x42_0005, "ArchiveDate", ALL_SPECS),
    (0x42_0006, "AsynchronousCorrelationValue", ALL_SPECS),
    (0x42_0007, "AsynchronousIndicator", ALL_SPECS),
    (0x42_0008, "Attribute", ALL_SPECS),
    (0x42_0009, "AttributeIndex", V1_2_ONLY),
    (0x42_000A, "AttributeName", ALL_SPECS),
    (0x42_000B, "AttributeValue", ALL_SPECS),
    (0x42_000C, "Authentication", ALL_SPECS),
    (0x42_000D, "BatchCount", THROUGH_V2_1),
    (0x42_000E, "BatchErrorContinuationOption", ALL_SPECS),
    (0x42_000F, "BatchItem", ALL_SPECS),
    (0x42_0010, "BatchOrderOption", THROUGH_V2_1),
    (0x42_0011, "BlockCipherMode", ALL_SPECS),
    (0x42_0012, "CancellationResult", ALL_SPECS),
    (0x42_0013, "Certificate", ALL_SPECS),
    (0x42_0018, "CertificateRequest", ALL_SPECS),
    (0x42_0019, "CertificateRequestType", ALL_SPECS),
    (0x42_001D, "CertificateType", ALL_SPECS),
    (0x42_001E, "CertificateValue", ALL_SPECS),
    (0x42_001F, "CommonTemplateAttribute", V1_2_ONLY),
    (0x42_0020, "CompromiseDate", ALL_SPECS),
    (0x42_0021, "CompromiseOccurrenceDate", ALL_SPECS),
    (0x42_0022, "ContactInformation", ALL_SPECS),
    (0x42_0023, "Credential", ALL_SPECS),
    (0x42_0024, "CredentialType", ALL_SPECS),
    (0x42_0025, "CredentialValue", ALL_SPECS),
    (0x42_0026, "CriticalityIndicator", ALL_SPECS),
    (0x42_0027, "CrtCoefficient", ALL_SPECS),
    (0x42_0028, "CryptographicAlgorithm", ALL_SPECS),
    (0x42_0029, "CryptographicDomainParameters", ALL_SPECS),
    (0x42_002A, "CryptographicLength", ALL_SPECS),
    (0x42_002B, "CryptographicParameters", ALL_SPECS),
    (0x42_002C, "CryptographicUsageMask", ALL_SPECS),
    (0x42_002D, "Custom", V1_2_ONLY),
    (0x42_002E, "D", ALL_SPECS),
    (0x42_002F, "DeactivationDate", ALL_SPECS),
    (0x42_0030, "DerivationData", ALL_SPECS),
    (0x42_0031, "DerivationMethod", ALL_SPECS),
    (0x42_0032, "DerivationParameters", ALL_SPECS),
    (0x42_0033, "DestroyDate", ALL_SPECS),
    (0x42_0034, "Digest", ALL_SPECS),
    (0x42_0035, "DigestValue", ALL_SPECS),
    (0x42_0036, "EncryptionKeyInformation", ALL_SPECS),
    (0x42_0037, "G", ALL_SPECS),
    (0x42_0038, "HashingAlgorithm", ALL_SPECS),
    (0x42_0039, "InitialDate", ALL_SPECS),
    (0x42_003A, "InitializationVector", ALL_SPECS),
    (0x42_003C, "IterationCount", ALL_SPECS),
    (0x42_003D, "IvCounterNonce", ALL_SPECS),
    (0x42_003E, "J", ALL_SPECS),
    (0x42_003F, "Key", ALL_SPECS),
    (0x42_0040, "KeyBlock", ALL_SPECS),
    (0x42_0041, "KeyCompressionType", ALL_SPECS),
    (0x42_0042, "KeyFormatType", ALL_SPECS),
    (0x42_0043, "KeyMaterial", ALL_SPECS),
    (0x42_0044, "KeyPartIdentifier", ALL_SPECS),
    (0x42_0045, "KeyValue", ALL_SPECS),
    (0x42_0046, "KeyWrappingData", ALL_SPECS),
    (0x42_0047, "KeyWrappingSpecification", ALL_SPECS),
    (0x42_0048, "LastChangeDate", ALL_SPECS),
    (0x42_0049, "LeaseTime", ALL_SPECS),
    (0x42_004A, "Link", THROUGH_V2_1),
    (0x42_004B, "LinkType", THROUGH_V2_1),
    (0x42_004C, "LinkedObjectIdentifier", THROUGH_V2_1),
    (0x42_004D, "MacSignature", ALL_SPECS),
    (0x42_004E, "MacSignatureKeyInformation", ALL_SPECS),
    (0x42_004F, "MaximumItems", ALL_SPECS),
    (0x42_0050, "MaximumResponseSize", ALL_SPECS),
    (0x42_0051, "MessageExtension", ALL_SPECS),
    (0x42_0052, "Modulus", ALL_SPECS),
    (0x42_0053, "Name", ALL_SPECS),
    (0x42_0054, "NameType", THROUGH_V2_1),
    (0x42_0055, "NameValue", THROUGH_V2_1),
    (0x42_0056, "ObjectGroup", THROUGH_V2_1),
    (0x42_0057, "ObjectType", ALL_SPECS),
    (0x42_0058, "Offset", ALL_SPECS),
    (0x42_0059, "OpaqueDataType", ALL_SPECS),
    (0x42_005A, "OpaqueDataValue", ALL_SPECS),
    (0x42_005B, "OpaqueObject", ALL_SPECS),
    (0x42_005C, "Operation", ALL_SPECS),
    (0x42_005D, "OperationPolicyName", V1_2_ONLY),
    (0x42_005E, "P", ALL_SPECS),
    (0x42_005F, "PaddingMethod", ALL_SPECS),
    (0x42_0060, "PrimeExponentP", ALL_SPECS),
    (0x42_0061, "PrimeExponentQ", ALL_SPECS),
    (0x42_0062, "PrimeFieldSize", ALL_SPECS),
    (0x42_0063, "PrivateExponent", ALL_SPECS),
    (0x42_0064, "PrivateKey", ALL_SPECS),
    (0x42_0065, "PrivateKeyTemplateAttribute", V1_2_ONLY),
    (0x42_0066, "PrivateKeyUniqueIdentifier", ALL_SPECS),
    (0x42_0067, "ProcessStartDate", ALL_SPECS),
    (0x42_0068, "ProtectStopDate", ALL_SPECS),
    (0x42_0069, "ProtocolVersion", ALL_SPECS),
    (0x42_006A, "ProtocolVersionMajor", ALL_SPECS),
    (0x42_006B, "ProtocolVersionMinor", ALL_SPECS),
    (0x42_006C, "PublicExponent", ALL_SPECS),
    (0x42_006D, "PublicKey", ALL_SPECS),
    (0x42_006E, "PublicKeyTemplateAttribute", V1_2_ONLY),
    (0x42_006F, "PublicKeyUniqueIdentifier", ALL_SPECS),
    (0x42_0070, "PutFunction", ALL_SPECS),
    (0x42_0071, "Q", ALL_SPECS),
    (0x42_0072, "QString", ALL_SPECS),
    (0x42_0073, "Qlength", ALL_SPECS),
    (0x42_0074, "QueryFunction", ALL_SPECS),
    (0x42_0075, "RecommendedCurve", ALL_SPECS),
    (0x42_0076, "ReplacedUniqueIdentifier", ALL_SPECS),
    (0x42_0077, "RequestHeader", ALL_SPECS),
    (0x42_0078, "RequestMessage", ALL_SPECS),
    (0x42_0079, "RequestPayload", ALL_SPECS),
    (0x42_007A, "ResponseHeader", ALL_SPECS),
    (0x42_007B, "ResponseMessage", ALL_SPECS),
    (0x42_007C, "ResponsePayload", ALL_SPECS),
    (0x42_007D, "ResultMessage", ALL_SPECS),
    (0x42_007E, "ResultReason", ALL_SPECS),
    (0x42_007F, "ResultStatus", ALL_SPECS),
    (0x42_0080, "RevocationMessage", ALL_SPECS),
    (0x42_0081, "RevocationReason", ALL_SPECS),
    (0x42_0082, "RevocationReasonCode", ALL_SPECS),
    (0x42_0083, "KeyRoleType", ALL_SPECS),
    (0x42_0084, "Salt", ALL_SPECS),
    (0x42_0085, "SecretData", ALL_SPECS),
    (0x42_0086, "SecretDataType", ALL_SPECS),
    (0x42_0088, "ServerInformation", ALL_SPECS),
    (0x42_0089, "SplitKey", ALL_SPECS),
    (0x42_008A, "SplitKeyMethod", ALL_SPECS),
    (0x42_008B, "SplitKeyParts", ALL_SPECS),
    (0x42_008C, "SplitKeyThreshold", ALL_SPECS),
    (0x42_008D, "State", ALL_SPECS),
    (0x42_008E, "StorageStatusMask", ALL_SPECS),
    (0x42_008F, "SymmetricKey", ALL_SPECS),
    (0x42_0090, "Template", V1_2_ONLY),
    (0x42_0091, "TemplateAttribute", V1_2_ONLY),
    (0x42_0092, "TimeStamp", ALL_SPECS),
    (0x42_0093, "UniqueBatchItemId", THROUGH_V2_1),
    (0x42_0094, "UniqueIdentifier", ALL_SPECS),
    (0x42_0095, "UsageLimits", ALL_SPECS),
    (0x42_0096, "UsageLimitsCount", ALL_SPECS),
    (0x42_0097, "UsageLimitsTotal", ALL_SPECS),
    (0x42_0098, "UsageLimitsUnit", ALL_SPECS),
    (0x42_0099, "Username", ALL_SPECS),
    (0x42_009A, "ValidityDate", ALL_SPECS),
    (0x42_009B, "ValidityIndicator", ALL_SPECS),
];

lazy_static! {
    static ref STANDARD_BY_VALUE: HashMap<u32, TagValue> = STANDARD_TAGS
        .iter()
        .map(|&(value, description, supported)| {
            (value, TagValue {
                value,
                description: description.to_owned(),
                supported,
                custom: false,
            })
        })
        .collect();
    static ref STANDARD_BY_NAME: HashMap<&'static str, u32> = STANDARD_TAGS
        .iter()
        .map(|&(value, description, _)| (description, value))
        .collect();
    static ref EXTENSIONS: RwLock<HashMap<u32, TagValue>> = RwLock::new(HashMap::new());
}

/// Register a custom tag in the extension band.
///
/// The value must lie in `0x540000..=0x54FFFF`, the description must not be
/// blank and the spec set must not be empty. Re-registering a value replaces
/// the previous entry.
pub fn register(value: u32, description: &str, supported: SpecSet) -> KmipResult<TagValue> {
    kmip_ensure!(
        (EXTENSION_START..=EXTENSION_END).contains(&value),
        KmipError::Registration(format!(
            "custom tag {value:#08x} is outside the extension band {EXTENSION_START:#08x}..={EXTENSION_END:#08x}"
        ))
    );
    kmip_ensure!(
        !description.trim().is_empty(),
        KmipError::Registration("custom tag description must not be blank".to_owned())
    );
    kmip_ensure!(
        !supported.is_empty(),
        KmipError::Registration("custom tag spec set must not be empty".to_owned())
    );
    let tag = TagValue {
        value,
        description: description.to_owned(),
        supported,
        custom: true,
    };
    debug!("registering custom tag {} ({description})", tag.hex_string());
    let mut extensions = EXTENSIONS
        .write()
        .map_err(|e| KmipError::Registration(format!("tag registry poisoned: {e}")))?;
    // last write wins
    extensions.insert(value, tag.clone());
    Ok(tag)
}

/// Look up a tag by numeric value, filtered to those valid under `spec`.
pub fn from_value(spec: KmipSpec, value: u32) -> KmipResult<TagValue> {
    let found = STANDARD_BY_VALUE.get(&value).cloned().or_else(|| {
        EXTENSIONS
            .read()
            .ok()
            .and_then(|extensions| extensions.get(&value).cloned())
    });
    match found {
        Some(tag) if tag.is_supported_for(spec) => Ok(tag),
        Some(tag) => Err(KmipError::NotSupported(
            format!("tag {} ({})", tag.hex_string(), tag.description),
            spec,
        )),
        None => Err(KmipError::NotFound(format!("tag value {value:#08x}"))),
    }
}

/// Look up a tag by description, standard catalog first, then extensions.
/// Matching is case-sensitive.
pub fn from_name(spec: KmipSpec, name: &str) -> KmipResult<TagValue> {
    if let Some(value) = STANDARD_BY_NAME.get(name) {
        return from_value(spec, *value);
    }
    let found = EXTENSIONS.read().ok().and_then(|extensions| {
        extensions
            .values()
            .find(|tag| tag.description == name)
            .cloned()
    });
    match found {
        Some(tag) if tag.is_supported_for(spec) => Ok(tag),
        Some(tag) => Err(KmipError::NotSupported(
            format!("tag {} ({})", tag.hex_string(), tag.description),
            spec,
        )),
        None => Err(KmipError::NotFound(format!("tag name {name:?}"))),
    }
}

/// Look up a tag from its 3-byte wire form.
pub fn from_bytes(spec: KmipSpec, bytes: &[u8]) -> KmipResult<TagValue> {
    if bytes.len() != TAG_SIZE {
        kmip_bail!(KmipError::InvalidTag(format!(
            "tag must be {TAG_SIZE} bytes, got {}",
            bytes.len()
        )));
    }
    let value = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
    from_value(spec, value)
}

/// All currently registered extension tags, in unspecified order.
#[must_use]
pub fn registered_extensions() -> Vec<TagValue> {
    EXTENSIONS
        .read()
        .map(|extensions| extensions.values().cloned().collect())
        .unwrap_or_default()
}
