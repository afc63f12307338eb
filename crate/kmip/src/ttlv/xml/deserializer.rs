use quick_xml::{Reader, events::Event};
use time::OffsetDateTime;

use super::RAW_ELEMENT;
use crate::{
    context::KmipContext,
    error::{KmipError, result::KmipResult},
    tag,
    ttlv::{KmipBigInt, Ttlv, TtlvEnumeration, TtlvValue},
};

pub struct TtlvXmlDeserializer;

impl TtlvXmlDeserializer {
    pub fn from_xml(xml: &str) -> KmipResult<Ttlv> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<Ttlv> = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => {
                    let attrs = Attrs::collect(&e)?;
                    let tag = Self::resolve_tag(e.name().as_ref(), attrs.tag.as_deref())?;
                    // a Start element is a structure; the type attribute may
                    // be omitted
                    if let Some(ty) = attrs.ty.as_deref() {
                        if ty != "Structure" {
                            return Err(KmipError::Default(format!(
                                "expected a Structure start element, got type '{ty}'"
                            )));
                        }
                    }
                    stack.push(Ttlv::new(tag, TtlvValue::Structure(Vec::new())));
                }
                Ok(Event::Empty(e)) => {
                    let attrs = Attrs::collect(&e)?;
                    let tag = Self::resolve_tag(e.name().as_ref(), attrs.tag.as_deref())?;
                    let value = match (attrs.ty.as_deref(), attrs.value.as_deref()) {
                        (None | Some("Structure"), None) => TtlvValue::Structure(Vec::new()),
                        (None, Some(_)) => {
                            return Err(KmipError::Default(
                                "missing type attribute on a valued element".to_owned(),
                            ));
                        }
                        (Some(ty), value) => {
                            Self::parse_primitive(ty, value, attrs.name.as_deref())?
                        }
                    };
                    let node = Ttlv::new(tag, value);
                    match stack.last_mut() {
                        Some(parent) => Self::append_child(parent, node),
                        None => return Ok(node),
                    }
                }
                Ok(Event::End(_)) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| KmipError::Default("unbalanced XML".to_owned()))?;
                    match stack.last_mut() {
                        Some(parent) => Self::append_child(parent, node),
                        None => return Ok(node),
                    }
                }
                Ok(_) => {}
                Err(e) => return Err(KmipError::Default(format!("XML parse error: {e}"))),
            }
            buf.clear();
        }
        Err(KmipError::Default("no root element".to_owned()))
    }

    fn append_child(parent: &mut Ttlv, child: Ttlv) {
        if let TtlvValue::Structure(children) = &mut parent.value {
            children.push(child);
        }
    }

    /// The numeric tag of an element: either the registry name used as the
    /// element name, or a `tag` attribute on the raw element form.
    fn resolve_tag(element: &[u8], tag_attr: Option<&str>) -> KmipResult<u32> {
        let name = String::from_utf8_lossy(element);
        if name == RAW_ELEMENT {
            let raw = tag_attr.ok_or_else(|| {
                KmipError::Default(format!("missing tag attribute on a {RAW_ELEMENT} element"))
            })?;
            let hex = raw.strip_prefix("0x").ok_or_else(|| {
                KmipError::Default(format!("expected a 0x-prefixed tag, got '{raw}'"))
            })?;
            return u32::from_str_radix(hex, 16)
                .map_err(|e| KmipError::Default(format!("invalid tag '{raw}': {e}")));
        }
        Ok(tag::from_name(KmipContext::spec(), &name)?.value())
    }

    fn parse_primitive(
        ty: &str,
        value: Option<&str>,
        name: Option<&str>,
    ) -> KmipResult<TtlvValue> {
        let raw = value
            .ok_or_else(|| KmipError::Default(format!("missing value for type '{ty}'")))?;
        Ok(match ty {
            "Integer" => TtlvValue::Integer(
                raw.parse()
                    .map_err(|e| KmipError::Default(format!("invalid Integer '{raw}': {e}")))?,
            ),
            "LongInteger" => TtlvValue::LongInteger(
                raw.parse().map_err(|e| {
                    KmipError::Default(format!("invalid LongInteger '{raw}': {e}"))
                })?,
            ),
            "BigInteger" => {
                let hex = raw.strip_prefix("0x").ok_or_else(|| {
                    KmipError::Default(format!("expected a 0x-prefixed BigInteger, got '{raw}'"))
                })?;
                let bytes = hex::decode(hex).map_err(|e| {
                    KmipError::Default(format!("invalid BigInteger '{raw}': {e}"))
                })?;
                TtlvValue::BigInteger(KmipBigInt::from_bytes_be(&bytes))
            }
            "Enumeration" => {
                let parsed = raw.parse().map_err(|e| {
                    KmipError::Default(format!("invalid Enumeration '{raw}': {e}"))
                })?;
                TtlvValue::Enumeration(TtlvEnumeration {
                    value: parsed,
                    name: name.unwrap_or_default().to_owned(),
                })
            }
            "Boolean" => TtlvValue::Boolean(match raw {
                "true" => true,
                "false" => false,
                other => {
                    return Err(KmipError::Default(format!("invalid Boolean '{other}'")));
                }
            }),
            "TextString" => TtlvValue::TextString(raw.to_owned()),
            "ByteString" => TtlvValue::ByteString(hex::decode(raw).map_err(|e| {
                KmipError::Default(format!("invalid ByteString '{raw}': {e}"))
            })?),
            "DateTime" => {
                let timestamp: i64 = raw.parse().map_err(|e| {
                    KmipError::Default(format!("invalid DateTime '{raw}': {e}"))
                })?;
                TtlvValue::DateTime(OffsetDateTime::from_unix_timestamp(timestamp).map_err(
                    |e| KmipError::Default(format!("invalid DateTime '{raw}': {e}")),
                )?)
            }
            "Interval" => TtlvValue::Interval(
                raw.parse()
                    .map_err(|e| KmipError::Default(format!("invalid Interval '{raw}': {e}")))?,
            ),
            other => {
                return Err(KmipError::Default(format!("unknown type '{other}'")));
            }
        })
    }
}

struct Attrs {
    ty: Option<String>,
    value: Option<String>,
    name: Option<String>,
    tag: Option<String>,
}

impl Attrs {
    fn collect(e: &quick_xml::events::BytesStart<'_>) -> KmipResult<Self> {
        let mut attrs = Self {
            ty: None,
            value: None,
            name: None,
            tag: None,
        };
        for a in e.attributes().flatten() {
            let v = a
                .unescape_value()
                .map_err(|e| KmipError::Default(format!("XML attribute: {e}")))?
                .into_owned();
            match a.key.as_ref() {
                b"type" => attrs.ty = Some(v),
                b"value" => attrs.value = Some(v),
                b"name" => attrs.name = Some(v),
                b"tag" => attrs.tag = Some(v),
                _ => {}
            }
        }
        Ok(attrs)
    }
}
