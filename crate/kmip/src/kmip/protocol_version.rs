use super::{FromTtlv, KmipDataType, ToTtlv, expect_integer, expect_structure};
use crate::{
    error::{KmipError, result::KmipResult},
    kmip_ensure,
    spec::{ALL_SPECS, KmipSpec, SpecSet},
    ttlv::{EncodingType, Ttlv, TtlvValue},
};

const TAG: u32 = 0x42_0069;
const TAG_MAJOR: u32 = 0x42_006A;
const TAG_MINOR: u32 = 0x42_006B;
const SUPPORTED: SpecSet = ALL_SPECS;

/// The KMIP ProtocolVersion structure: two Integers, major and minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: i32,
    pub minor: i32,
}

impl ProtocolVersion {
    #[must_use]
    pub const fn new(major: i32, minor: i32) -> Self {
        Self { major, minor }
    }

    /// The spec this version selects; unknown combinations degrade to the
    /// wildcard.
    #[must_use]
    pub const fn spec(&self) -> KmipSpec {
        KmipSpec::from_version(self.major, self.minor)
    }
}

impl KmipDataType for ProtocolVersion {
    fn tag(&self) -> u32 {
        TAG
    }

    fn encoding_type(&self) -> EncodingType {
        EncodingType::Structure
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl ToTtlv for ProtocolVersion {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        kmip_ensure!(
            self.is_supported_for(spec),
            KmipError::NotSupported("ProtocolVersion".to_owned(), spec)
        );
        Ok(Ttlv::new(
            TAG,
            TtlvValue::Structure(vec![
                Ttlv::new(TAG_MAJOR, TtlvValue::Integer(self.major)),
                Ttlv::new(TAG_MINOR, TtlvValue::Integer(self.minor)),
            ]),
        ))
    }
}

impl FromTtlv for ProtocolVersion {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        let children = expect_structure(ttlv, TAG)?;
        let major = children
            .iter()
            .find(|c| c.tag == TAG_MAJOR)
            .ok_or_else(|| KmipError::NotFound("ProtocolVersionMajor".to_owned()))?;
        let minor = children
            .iter()
            .find(|c| c.tag == TAG_MINOR)
            .ok_or_else(|| KmipError::NotFound("ProtocolVersionMinor".to_owned()))?;
        let version = Self {
            major: expect_integer(major, TAG_MAJOR)?,
            minor: expect_integer(minor, TAG_MINOR)?,
        };
        kmip_ensure!(
            version.is_supported_for(spec),
            KmipError::NotSupported("ProtocolVersion".to_owned(), spec)
        );
        Ok(version)
    }
}
