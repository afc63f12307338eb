use time::OffsetDateTime;

use super::{
    Attribute, AttributeName, AttributeValue, FromTtlv, KmipAttribute, KmipDataType, State, ToTtlv,
    check_tag, format_tag,
};
use crate::{
    error::{KmipError, result::KmipResult},
    spec::{KmipSpec, SpecSet},
    ttlv::{EncodingType, Ttlv, TtlvValue},
};

const TAG: u32 = 0x42_0001;
const SUPPORTED: SpecSet = SpecSet::UNKNOWN.union(SpecSet::V1_2);
const NAME: &str = "ActivationDate";

/// The ActivationDate attribute: the date and time an object becomes usable.
///
/// Once the object leaves `PreActive` the date is frozen for both sides, and
/// clients can never delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationDate(pub OffsetDateTime);

impl ActivationDate {
    #[must_use]
    pub const fn new(date: OffsetDateTime) -> Self {
        Self(date)
    }

    #[must_use]
    pub const fn date(&self) -> OffsetDateTime {
        self.0
    }
}

impl KmipDataType for ActivationDate {
    fn tag(&self) -> u32 {
        TAG
    }

    fn encoding_type(&self) -> EncodingType {
        EncodingType::DateTime
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl KmipAttribute for ActivationDate {
    fn attribute_name(&self) -> AttributeName {
        AttributeName::new(NAME)
    }

    fn attribute_value(&self) -> AttributeValue {
        AttributeValue::DateTime(self.0)
    }

    fn is_server_modifiable(&self, state: State) -> bool {
        state == State::PreActive
    }

    fn is_client_modifiable(&self, state: State) -> bool {
        state == State::PreActive
    }

    fn is_client_deletable(&self) -> bool {
        false
    }
}

impl ToTtlv for ActivationDate {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        Attribute::of(self).to_ttlv(spec)
    }
}

impl FromTtlv for ActivationDate {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        let carrier = Attribute::from_ttlv(spec, ttlv)?;
        Self::try_from(&carrier)
    }
}

impl TryFrom<&Attribute> for ActivationDate {
    type Error = KmipError;

    fn try_from(carrier: &Attribute) -> Result<Self, Self::Error> {
        if carrier.name.as_str() != NAME {
            return Err(KmipError::InvalidAttribute(format!(
                "expected an {NAME} carrier, got '{}'",
                carrier.name.as_str()
            )));
        }
        match carrier.value {
            AttributeValue::DateTime(date) => Ok(Self(date)),
            ref other => Err(KmipError::TypeMismatch {
                tag: format_tag(TAG),
                expected: EncodingType::DateTime.to_string(),
                actual: other.encoding_type().to_string(),
            }),
        }
    }
}

/// Decode the raw tagged form (tag 0x420001, DateTime) rather than the
/// Attribute carrier.
impl ActivationDate {
    pub fn from_tagged_ttlv(ttlv: &Ttlv) -> KmipResult<Self> {
        check_tag(ttlv, TAG)?;
        match ttlv.value {
            TtlvValue::DateTime(date) => Ok(Self(date)),
            ref other => Err(KmipError::TypeMismatch {
                tag: format_tag(TAG),
                expected: EncodingType::DateTime.to_string(),
                actual: other.encoding_type().to_string(),
            }),
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::ActivationDate;
    use crate::{
        error::KmipError,
        kmip::{Attribute, AttributeName, AttributeValue, FromTtlv, KmipAttribute, KmipDataType,
               State, ToTtlv},
        spec::KmipSpec,
        ttlv::Ttlv,
    };

    #[test]
    fn modifiable_only_while_pre_active() {
        let date = ActivationDate::new(datetime!(2024-05-01 0:00 UTC));
        assert!(date.is_server_modifiable(State::PreActive));
        assert!(date.is_client_modifiable(State::PreActive));
        for state in [
            State::Active,
            State::Deactivated,
            State::Compromised,
            State::Destroyed,
            State::DestroyedCompromised,
        ] {
            assert!(!date.is_server_modifiable(state));
            assert!(!date.is_client_modifiable(state));
        }
        assert!(!date.is_client_deletable());
        assert!(!date.is_multi_instance_allowed());
    }

    #[test]
    fn version_gating() {
        let date = ActivationDate::new(datetime!(2024-05-01 0:00 UTC));
        assert!(date.is_supported_for(KmipSpec::V1_2));
        assert!(date.is_supported_for(KmipSpec::UnknownVersion));
        assert!(!date.is_supported_for(KmipSpec::V2_1));
    }

    #[test]
    fn carrier_round_trip() {
        let date = ActivationDate::new(datetime!(2008-03-14 11:56:40 UTC));
        let bytes = date.to_ttlv(KmipSpec::V1_2).unwrap().to_bytes().unwrap();
        let decoded =
            ActivationDate::from_ttlv(KmipSpec::V1_2, &Ttlv::from_bytes(&bytes).unwrap()).unwrap();
        assert_eq!(decoded, date);
    }

    #[test]
    fn rejects_foreign_carriers() {
        let wrong_name = Attribute::new(
            AttributeName::new("x-color"),
            AttributeValue::DateTime(datetime!(2024-05-01 0:00 UTC)),
        );
        assert!(matches!(
            ActivationDate::try_from(&wrong_name),
            Err(KmipError::InvalidAttribute(_))
        ));

        let wrong_type = Attribute::new(
            AttributeName::new("ActivationDate"),
            AttributeValue::Integer(7),
        );
        assert!(matches!(
            ActivationDate::try_from(&wrong_type),
            Err(KmipError::TypeMismatch { .. })
        ));
    }
}
