use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A KMIP protocol version, plus two sentinels.
///
/// `UnknownVersion` is the ambient default and acts as a wildcard when used
/// as a lookup spec; `UnsupportedVersion` matches nothing and exists to model
/// a negotiated-but-rejected version.
#[derive(
    Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash, Display, EnumString,
)]
pub enum KmipSpec {
    UnknownVersion,
    V1_2,
    V2_1,
    V3_0,
    UnsupportedVersion,
}

bitflags! {
    /// The set of protocol versions a tag or data type is valid for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpecSet: u8 {
        const UNKNOWN = 0b0000_0001;
        const V1_2 = 0b0000_0010;
        const V2_1 = 0b0000_0100;
        const V3_0 = 0b0000_1000;
    }
}

/// All concrete versions plus the wildcard.
pub const ALL_SPECS: SpecSet = SpecSet::UNKNOWN
    .union(SpecSet::V1_2)
    .union(SpecSet::V2_1)
    .union(SpecSet::V3_0);

impl KmipSpec {
    /// The flag this spec occupies in a [`SpecSet`]; empty for
    /// `UnsupportedVersion`, which is never a member of any set.
    #[must_use]
    pub const fn flag(self) -> SpecSet {
        match self {
            Self::UnknownVersion => SpecSet::UNKNOWN,
            Self::V1_2 => SpecSet::V1_2,
            Self::V2_1 => SpecSet::V2_1,
            Self::V3_0 => SpecSet::V3_0,
            Self::UnsupportedVersion => SpecSet::empty(),
        }
    }

    /// Map a wire ProtocolVersion to a spec; unknown combinations degrade to
    /// the wildcard.
    #[must_use]
    pub const fn from_version(major: i32, minor: i32) -> Self {
        match (major, minor) {
            (1, 2) => Self::V1_2,
            (2, 1) => Self::V2_1,
            (3, 0) => Self::V3_0,
            _ => Self::UnknownVersion,
        }
    }
}

impl SpecSet {
    /// Whether an item carrying this set is usable under `spec`.
    ///
    /// `UnsupportedVersion` maps to the empty flag, so it never matches.
    #[must_use]
    pub const fn supports(self, spec: KmipSpec) -> bool {
        if matches!(spec, KmipSpec::UnsupportedVersion) {
            return false;
        }
        self.contains(spec.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::{ALL_SPECS, KmipSpec, SpecSet};

    #[test]
    fn from_version_mapping() {
        assert_eq!(KmipSpec::from_version(1, 2), KmipSpec::V1_2);
        assert_eq!(KmipSpec::from_version(2, 1), KmipSpec::V2_1);
        assert_eq!(KmipSpec::from_version(3, 0), KmipSpec::V3_0);
        assert_eq!(KmipSpec::from_version(1, 0), KmipSpec::UnknownVersion);
        assert_eq!(KmipSpec::from_version(9, 9), KmipSpec::UnknownVersion);
    }

    #[test]
    fn set_membership() {
        let set = SpecSet::UNKNOWN | SpecSet::V1_2;
        assert!(set.supports(KmipSpec::UnknownVersion));
        assert!(set.supports(KmipSpec::V1_2));
        assert!(!set.supports(KmipSpec::V2_1));
        assert!(!set.supports(KmipSpec::UnsupportedVersion));
        assert!(ALL_SPECS.supports(KmipSpec::V3_0));
        assert!(!ALL_SPECS.supports(KmipSpec::UnsupportedVersion));
    }

    #[test]
    fn display_names() {
        assert_eq!(KmipSpec::V1_2.to_string(), "V1_2");
        assert_eq!(KmipSpec::UnknownVersion.to_string(), "UnknownVersion");
    }
}
