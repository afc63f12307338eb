use lazy_static::lazy_static;
use regex::Regex;

use super::{Attribute, AttributeName, AttributeValue, FromTtlv, KmipAttribute, KmipDataType,
            State, ToTtlv};
use crate::{
    error::{KmipError, result::KmipResult},
    spec::{KmipSpec, SpecSet},
    ttlv::{EncodingType, Ttlv},
};

const TAG: u32 = 0x42_0008;
const SUPPORTED: SpecSet = SpecSet::UNKNOWN.union(SpecSet::V1_2);

lazy_static! {
    static ref CLIENT_PREFIX: Regex = Regex::new("(?i)^x-").expect("hardcoded regex");
    static ref SERVER_PREFIX: Regex = Regex::new("(?i)^y-").expect("hardcoded regex");
}

/// A KMIP 1.x custom attribute.
///
/// Names starting with `x-` belong to the client, names starting with `y-`
/// belong to the server; the prefix check is case-insensitive. The owning
/// side may modify the attribute in any lifecycle state, the other side may
/// not.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    name: AttributeName,
    value: AttributeValue,
}

impl CustomAttribute {
    /// Fails with [`KmipError::InvalidAttribute`] when the name carries
    /// neither custom prefix.
    pub fn new(name: AttributeName, value: AttributeValue) -> KmipResult<Self> {
        if !Self::is_custom_name(name.as_str()) {
            return Err(KmipError::InvalidAttribute(format!(
                "'{}' is not a custom attribute name, expected an x- or y- prefix",
                name.as_str()
            )));
        }
        Ok(Self { name, value })
    }

    #[must_use]
    pub fn is_custom_name(name: &str) -> bool {
        CLIENT_PREFIX.is_match(name) || SERVER_PREFIX.is_match(name)
    }

    #[must_use]
    pub fn is_client_owned(&self) -> bool {
        CLIENT_PREFIX.is_match(self.name.as_str())
    }

    #[must_use]
    pub fn is_server_owned(&self) -> bool {
        SERVER_PREFIX.is_match(self.name.as_str())
    }
}

impl KmipDataType for CustomAttribute {
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

impl KmipAttribute for CustomAttribute {
    fn attribute_name(&self) -> AttributeName {
        self.name.clone()
    }

    fn attribute_value(&self) -> AttributeValue {
        self.value.clone()
    }

    fn is_server_modifiable(&self, _state: State) -> bool {
        self.is_server_owned()
    }

    fn is_client_modifiable(&self, _state: State) -> bool {
        self.is_client_owned()
    }

    fn is_client_deletable(&self) -> bool {
        self.is_client_owned()
    }

    fn is_multi_instance_allowed(&self) -> bool {
        true
    }
}

impl ToTtlv for CustomAttribute {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        Attribute::of(self).to_ttlv(spec)
    }
}

impl FromTtlv for CustomAttribute {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        let carrier = Attribute::from_ttlv(spec, ttlv)?;
        Self::new(carrier.name, carrier.value)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::CustomAttribute;
    use crate::{
        error::KmipError,
        kmip::{AttributeName, AttributeValue, FromTtlv, KmipAttribute, KmipDataType, State,
               ToTtlv},
        spec::KmipSpec,
        ttlv::Ttlv,
    };

    fn custom(name: &str) -> CustomAttribute {
        CustomAttribute::new(
            AttributeName::new(name),
            AttributeValue::TextString("v".to_owned()),
        )
        .unwrap()
    }

    #[test]
    fn name_must_carry_a_custom_prefix() {
        assert!(CustomAttribute::is_custom_name("x-color"));
        assert!(CustomAttribute::is_custom_name("X-Color"));
        assert!(CustomAttribute::is_custom_name("y-internal"));
        assert!(CustomAttribute::is_custom_name("Y-Internal"));
        assert!(!CustomAttribute::is_custom_name("xcolor"));
        assert!(!CustomAttribute::is_custom_name("ActivationDate"));
        assert!(!CustomAttribute::is_custom_name("ax-color"));

        assert!(matches!(
            CustomAttribute::new(
                AttributeName::new("color"),
                AttributeValue::Integer(1)
            ),
            Err(KmipError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn ownership_drives_modifiability() {
        let client = custom("x-color");
        let server = custom("y-internal");

        for state in [State::PreActive, State::Active, State::Destroyed] {
            assert!(client.is_client_modifiable(state));
            assert!(!client.is_server_modifiable(state));
            assert!(server.is_server_modifiable(state));
            assert!(!server.is_client_modifiable(state));
        }
        assert!(client.is_client_deletable());
        assert!(!server.is_client_deletable());
        assert!(client.is_multi_instance_allowed());
        assert!(client.is_client_initializable());
        assert!(server.is_server_initializable());
    }

    #[test]
    fn version_gating() {
        let attribute = custom("x-color");
        assert!(attribute.is_supported_for(KmipSpec::V1_2));
        assert!(attribute.is_supported_for(KmipSpec::UnknownVersion));
        assert!(!attribute.is_supported_for(KmipSpec::V2_1));
        assert!(!attribute.is_supported_for(KmipSpec::V3_0));
        assert!(!attribute.is_supported_for(KmipSpec::UnsupportedVersion));

        assert!(matches!(
            attribute.to_ttlv(KmipSpec::V2_1),
            Err(KmipError::NotSupported(_, KmipSpec::V2_1))
        ));
    }

    #[test]
    fn wire_round_trip() {
        let attribute = custom("x-color");
        let bytes = attribute.to_ttlv(KmipSpec::V1_2).unwrap().to_bytes().unwrap();
        let decoded =
            CustomAttribute::from_ttlv(KmipSpec::V1_2, &Ttlv::from_bytes(&bytes).unwrap()).unwrap();
        assert_eq!(decoded, attribute);
    }
}
