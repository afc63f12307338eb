use time::OffsetDateTime;

use super::{
    FromTtlv, KmipAttribute, KmipDataType, ToTtlv, check_tag, expect_structure, expect_text_string,
    format_tag,
};
use crate::{
    context::KmipContext,
    error::{KmipError, result::KmipResult},
    kmip::CustomAttribute,
    kmip_ensure, registry,
    spec::{KmipSpec, SpecSet},
    tag,
    ttlv::{EncodingType, KmipBigInt, Ttlv, TtlvEnumeration, TtlvValue},
};

const TAG_ATTRIBUTE: u32 = 0x42_0008;
const TAG_ATTRIBUTE_INDEX: u32 = 0x42_0009;
const TAG_ATTRIBUTE_NAME: u32 = 0x42_000A;
const TAG_ATTRIBUTE_VALUE: u32 = 0x42_000B;
const SUPPORTED: SpecSet = SpecSet::UNKNOWN.union(SpecSet::V1_2);

/// The KMIP AttributeName: a TextString naming an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeName(pub String);

impl AttributeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl KmipDataType for AttributeName {
    fn tag(&self) -> u32 {
        TAG_ATTRIBUTE_NAME
    }

    fn encoding_type(&self) -> EncodingType {
        EncodingType::TextString
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl ToTtlv for AttributeName {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        kmip_ensure!(
            self.is_supported_for(spec),
            KmipError::NotSupported("AttributeName".to_owned(), spec)
        );
        Ok(Ttlv::new(
            TAG_ATTRIBUTE_NAME,
            TtlvValue::TextString(self.0.clone()),
        ))
    }
}

impl FromTtlv for AttributeName {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        let name = Self(expect_text_string(ttlv, TAG_ATTRIBUTE_NAME)?);
        kmip_ensure!(
            name.is_supported_for(spec),
            KmipError::NotSupported("AttributeName".to_owned(), spec)
        );
        Ok(name)
    }
}

/// The KMIP AttributeValue: a primitive value whose encoding type varies
/// with the attribute it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
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

impl AttributeValue {
    #[must_use]
    pub const fn encoding_type(&self) -> EncodingType {
        match self {
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

    fn to_ttlv_value(&self) -> TtlvValue {
        match self {
            Self::Integer(v) => TtlvValue::Integer(*v),
            Self::LongInteger(v) => TtlvValue::LongInteger(*v),
            Self::BigInteger(v) => TtlvValue::BigInteger(v.clone()),
            Self::Enumeration(v) => TtlvValue::Enumeration(v.clone()),
            Self::Boolean(v) => TtlvValue::Boolean(*v),
            Self::TextString(v) => TtlvValue::TextString(v.clone()),
            Self::ByteString(v) => TtlvValue::ByteString(v.clone()),
            Self::DateTime(v) => TtlvValue::DateTime(*v),
            Self::Interval(v) => TtlvValue::Interval(*v),
        }
    }

    fn from_ttlv_value(value: &TtlvValue) -> KmipResult<Self> {
        Ok(match value {
            TtlvValue::Structure(_) => {
                return Err(KmipError::TypeMismatch {
                    tag: format_tag(TAG_ATTRIBUTE_VALUE),
                    expected: "a primitive encoding".to_owned(),
                    actual: EncodingType::Structure.to_string(),
                });
            }
            TtlvValue::Integer(v) => Self::Integer(*v),
            TtlvValue::LongInteger(v) => Self::LongInteger(*v),
            TtlvValue::BigInteger(v) => Self::BigInteger(v.clone()),
            TtlvValue::Enumeration(v) => Self::Enumeration(v.clone()),
            TtlvValue::Boolean(v) => Self::Boolean(*v),
            TtlvValue::TextString(v) => Self::TextString(v.clone()),
            TtlvValue::ByteString(v) => Self::ByteString(v.clone()),
            TtlvValue::DateTime(v) => Self::DateTime(*v),
            TtlvValue::Interval(v) => Self::Interval(*v),
        })
    }
}

impl KmipDataType for AttributeValue {
    fn tag(&self) -> u32 {
        TAG_ATTRIBUTE_VALUE
    }

    fn encoding_type(&self) -> EncodingType {
        self.encoding_type()
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl ToTtlv for AttributeValue {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        kmip_ensure!(
            KmipDataType::is_supported_for(self, spec),
            KmipError::NotSupported("AttributeValue".to_owned(), spec)
        );
        Ok(Ttlv::new(TAG_ATTRIBUTE_VALUE, self.to_ttlv_value()))
    }
}

impl FromTtlv for AttributeValue {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        check_tag(ttlv, TAG_ATTRIBUTE_VALUE)?;
        let value = Self::from_ttlv_value(&ttlv.value)?;
        kmip_ensure!(
            KmipDataType::is_supported_for(&value, spec),
            KmipError::NotSupported("AttributeValue".to_owned(), spec)
        );
        Ok(value)
    }
}

/// The KMIP 1.x Attribute structure: AttributeName, optional AttributeIndex,
/// AttributeValue.
///
/// This is the wire carrier for attributes; [`Attribute::resolve`]
/// materializes the registry-backed concrete attribute behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: AttributeName,
    pub index: Option<i32>,
    pub value: AttributeValue,
}

impl Attribute {
    #[must_use]
    pub const fn new(name: AttributeName, value: AttributeValue) -> Self {
        Self {
            name,
            index: None,
            value,
        }
    }

    /// Wrap a concrete attribute into its wire carrier form.
    pub fn of(attribute: &dyn KmipAttribute) -> Self {
        Self {
            name: attribute.attribute_name(),
            index: None,
            value: attribute.attribute_value(),
        }
    }

    /// Materialize the concrete attribute this carrier names: a
    /// [`CustomAttribute`] when the name follows the custom convention,
    /// otherwise whatever the data-type registry holds for
    /// (spec, tag, encoding type).
    pub fn resolve(&self, spec: KmipSpec) -> KmipResult<Box<dyn KmipAttribute>> {
        if CustomAttribute::is_custom_name(self.name.as_str()) {
            return Ok(Box::new(CustomAttribute::new(
                self.name.clone(),
                self.value.clone(),
            )?));
        }
        let tag = tag::from_name(spec, self.name.as_str())?;
        let entry = registry::resolve_data_type(spec, tag.value(), self.value.encoding_type())?;
        (entry.factory)(&self.value)
    }
}

impl KmipDataType for Attribute {
    fn tag(&self) -> u32 {
        TAG_ATTRIBUTE
    }

    fn encoding_type(&self) -> EncodingType {
        EncodingType::Structure
    }

    fn is_supported_for(&self, spec: KmipSpec) -> bool {
        SUPPORTED.supports(spec)
    }
}

impl ToTtlv for Attribute {
    fn to_ttlv(&self, spec: KmipSpec) -> KmipResult<Ttlv> {
        kmip_ensure!(
            self.is_supported_for(spec),
            KmipError::NotSupported("Attribute".to_owned(), spec)
        );
        let mut children = vec![self.name.to_ttlv(spec)?];
        if let Some(index) = self.index {
            children.push(Ttlv::new(TAG_ATTRIBUTE_INDEX, TtlvValue::Integer(index)));
        }
        children.push(self.value.to_ttlv(spec)?);
        Ok(Ttlv::new(TAG_ATTRIBUTE, TtlvValue::Structure(children)))
    }
}

impl FromTtlv for Attribute {
    fn from_ttlv(spec: KmipSpec, ttlv: &Ttlv) -> KmipResult<Self> {
        let children = expect_structure(ttlv, TAG_ATTRIBUTE)?;
        let mut name = None;
        let mut index = None;
        let mut value = None;
        for child in children {
            match child.tag {
                TAG_ATTRIBUTE_NAME => name = Some(AttributeName::from_ttlv(spec, child)?),
                TAG_ATTRIBUTE_INDEX => {
                    index = Some(super::expect_integer(child, TAG_ATTRIBUTE_INDEX)?);
                }
                TAG_ATTRIBUTE_VALUE => value = Some(AttributeValue::from_ttlv(spec, child)?),
                other => {
                    return Err(KmipError::InvalidAttribute(format!(
                        "unexpected child {} in Attribute",
                        format_tag(other)
                    )));
                }
            }
        }
        let attribute = Self {
            name: name.ok_or_else(|| KmipError::NotFound("AttributeName".to_owned()))?,
            index,
            value: value.ok_or_else(|| KmipError::NotFound("AttributeValue".to_owned()))?,
        };
        kmip_ensure!(
            attribute.is_supported_for(spec),
            KmipError::NotSupported("Attribute".to_owned(), spec)
        );
        Ok(attribute)
    }
}

/// Convenience: resolve a carrier decoded under the ambient spec.
impl Attribute {
    pub fn resolve_ambient(&self) -> KmipResult<Box<dyn KmipAttribute>> {
        self.resolve(KmipContext::spec())
    }
}
