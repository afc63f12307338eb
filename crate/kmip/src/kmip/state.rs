use strum::{Display, EnumIter, EnumString};

use super::{FromTtlv, KmipDataType, ToTtlv, check_tag};
use crate::{
    error::{KmipError, result::KmipResult},
    spec::{ALL_SPECS, KmipSpec, SpecSet},
    ttlv::{EncodingType, Ttlv, TtlvEnumeration, TtlvValue},
};

const TAG: u32 = 0x42_008D;
const SUPPORTED: SpecSet = ALL_SPECS;

/// The KMIP object lifecycle State enumeration. It parameterizes the
/// modifiability policy of attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum State {
    PreActive,
    Active,
    Deactivated,
    Compromised,
    Destroyed,
    DestroyedCompromised,
}

impl State {
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::PreActive => 0x01,
            Self::Active => 0x02,
            Self::Deactivated => 0x03,
            Self::Compromised => 0x04,
            Self::Destroyed => 0x05,
            Self::DestroyedCompromised => 0x06,
        }
    }

    pub const fn from_value(value: u32) -> Result<Self, KmipError> {
        Ok(match value {
            0x01 => Self::PreActive,
            0x02 => Self::Active,
            0x03 => Self::Deactivated,
            0x04 => Self::Compromised,
            0x05 => Self::Destroyed,
            0x06 => Self::DestroyedCompromised,
            _ => return Err(KmipError::NotFound(String::new())),
        })
    }

    #[must_use]
    pub fn to_enumeration(self) -> TtlvEnumeration {
        TtlvEnumeration {
            value: self.value(),
            name: self.to_string(),
        }
    }
}

impl KmipDataType for State {
    fn tag(&self) -> u32 {
        TAG
    }

    fn encoding_type(&self) -> EncodingType {
        EncodingType::Enumeration
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl ToTtlv for State {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        if !self.is_supported_for(spec) {
            return Err(KmipError::NotSupported("State".to_owned(), spec));
        }
        Ok(Ttlv::new(
            TAG,
            TtlvValue::Enumeration(self.to_enumeration()),
        ))
    }
}

impl FromTtlv for State {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        check_tag(ttlv, TAG)?;
        let TtlvValue::Enumeration(variant) = &ttlv.value else {
            return Err(KmipError::TypeMismatch {
                tag: super::format_tag(ttlv.tag),
                expected: EncodingType::Enumeration.to_string(),
                actual: ttlv.value.encoding_type().to_string(),
            });
        };
        let state = Self::from_value(variant.value)
            .map_err(|_| KmipError::NotFound(format!("State value {}", variant.value)))?;
        if !state.is_supported_for(spec) {
            return Err(KmipError::NotSupported("State".to_owned(), spec));
        }
        Ok(state)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::State;
    use crate::{
        kmip::{FromTtlv, ToTtlv},
        spec::KmipSpec,
        ttlv::Ttlv,
    };

    #[test]
    fn values_round_trip() {
        for state in State::iter() {
            assert_eq!(State::from_value(state.value()).unwrap(), state);
        }
        assert!(State::from_value(0x07).is_err());
        assert!(State::from_value(0).is_err());
    }

    #[test]
    fn ttlv_round_trip_carries_value_not_name() {
        let ttlv = State::Deactivated.to_ttlv(KmipSpec::V1_2).unwrap();
        let bytes = ttlv.to_bytes().unwrap();
        let decoded =
            State::from_ttlv(KmipSpec::V1_2, &Ttlv::from_bytes(&bytes).unwrap()).unwrap();
        assert_eq!(decoded, State::Deactivated);
    }
}
