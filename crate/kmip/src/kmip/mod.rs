//! The typed KMIP schema layer.
//!
//! Every concrete type implements [`KmipDataType`] plus the [`ToTtlv`] /
//! [`FromTtlv`] codec traits; attributes additionally implement
//! [`KmipAttribute`], which carries the server/client policy surface.

mod activation_date;
mod attribute;
mod custom_attribute;
mod message;
mod protocol_version;
mod state;

pub use activation_date::ActivationDate;
pub use attribute::{Attribute, AttributeName, AttributeValue};
pub use custom_attribute::CustomAttribute;
pub use message::{SimpleRequestBatchItem, SimpleRequestHeader, SimpleRequestMessage};
pub use protocol_version::ProtocolVersion;
pub use state::State;

use crate::{
    error::{KmipError, result::KmipResult},
    kmip_ensure,
    spec::KmipSpec,
    ttlv::{EncodingType, Ttlv, TtlvValue},
};

/// The uniform capability every KMIP schema type exposes: its tag, its
/// encoding type, and the protocol versions it is valid for.
pub trait KmipDataType {
    /// The numeric KMIP tag of this type.
    fn tag(&self) -> u32;

    fn encoding_type(&self) -> EncodingType;

    fn is_supported_for(&self, spec: KmipSpec) -> bool;
}

/// Encode a schema type into the typed TTLV tree.
///
/// Implementations fail with [`KmipError::NotSupported`] when the value is
/// not valid under `spec`.
pub trait ToTtlv {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv>;
}

/// Decode a schema type from the typed TTLV tree, verifying tag and type and
/// checking spec support after assembly.
pub trait FromTtlv: Sized {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self>;
}

/// A KMIP attribute: a data type with a name, a primitive value and the
/// initializable / modifiable / deletable policy surface.
pub trait KmipAttribute: KmipDataType + std::fmt::Debug + Send + Sync {
    fn attribute_name(&self) -> AttributeName;

    fn attribute_value(&self) -> AttributeValue;

    fn is_always_present(&self) -> bool {
        false
    }

    fn is_server_initializable(&self) -> bool {
        true
    }

    fn is_client_initializable(&self) -> bool {
        true
    }

    fn is_server_modifiable(&self, state: State) -> bool;

    fn is_client_modifiable(&self, state: State) -> bool;

    fn is_client_deletable(&self) -> bool;

    fn is_multi_instance_allowed(&self) -> bool {
        false
    }
}

pub(crate) fn format_tag(tag: u32) -> String {
    format!("0x{tag:06X}")
}

/// Tag verification on decode: a mismatch is a hard failure.
pub(crate) fn check_tag(ttlv: &Ttlv, expected: u32) -> KmipResult<()> {
    kmip_ensure!(
        ttlv.tag == expected,
        KmipError::TagMismatch {
            expected: format_tag(expected),
            actual: format_tag(ttlv.tag),
        }
    );
    Ok(())
}

/// Verify tag and structure type, returning the children.
pub(crate) fn expect_structure(ttlv: &Ttlv, expected_tag: u32) -> KmipResult<&[Ttlv]> {
    check_tag(ttlv, expected_tag)?;
    match &ttlv.value {
        TtlvValue::Structure(children) => Ok(children),
        other => Err(KmipError::TypeMismatch {
            tag: format_tag(ttlv.tag),
            expected: EncodingType::Structure.to_string(),
            actual: other.encoding_type().to_string(),
        }),
    }
}

/// Verify tag and extract an Integer value.
pub(crate) fn expect_integer(ttlv: &Ttlv, expected_tag: u32) -> KmipResult<i32> {
    check_tag(ttlv, expected_tag)?;
    match &ttlv.value {
        TtlvValue::Integer(v) => Ok(*v),
        other => Err(KmipError::TypeMismatch {
            tag: format_tag(ttlv.tag),
            expected: EncodingType::Integer.to_string(),
            actual: other.encoding_type().to_string(),
        }),
    }
}

/// Verify tag and extract a TextString value.
pub(crate) fn expect_text_string(ttlv: &Ttlv, expected_tag: u32) -> KmipResult<String> {
    check_tag(ttlv, expected_tag)?;
    match &ttlv.value {
        TtlvValue::TextString(v) => Ok(v.clone()),
        other => Err(KmipError::TypeMismatch {
            tag: format_tag(ttlv.tag),
            expected: EncodingType::TextString.to_string(),
            actual: other.encoding_type().to_string(),
        }),
    }
}
