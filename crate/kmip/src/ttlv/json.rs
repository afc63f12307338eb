//! The JSON text form of TTLV trees.
//!
//! Every node serializes as `{"tag": ..., "type": ..., "value": ...}`. Tags
//! are written as registry names when the ambient protocol version knows
//! them, as `0x`-prefixed hex otherwise, and both forms are accepted on read.

use serde::{
    Deserialize, Serialize,
    de::Error as DeError,
    ser::{Error as SerError, SerializeMap},
};
use time::format_description::well_known::Rfc3339;

use super::{
    big_int::KmipBigInt,
    encoding_type::EncodingType,
    value::{Ttlv, TtlvEnumeration, TtlvValue},
};
use crate::{context::KmipContext, tag};

/// The tag as the JSON form writes it: a registry name under the ambient
/// spec, hex when the registry does not know the tag.
fn tag_name(value: u32) -> String {
    tag::from_value(KmipContext::spec(), value)
        .map_or_else(|_| format!("0x{value:06X}"), |t| t.description().to_owned())
}

fn tag_from_name(name: &str) -> Result<u32, String> {
    if let Some(hex) = name.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16)
            .map_err(|e| format!("invalid hex tag '{name}': {e}"));
    }
    tag::from_name(KmipContext::spec(), name)
        .map(|t| t.value())
        .map_err(|e| e.to_string())
}

impl Serialize for Ttlv {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("tag", &tag_name(self.tag))?;
        map.serialize_entry("type", &self.value.encoding_type())?;
        map.serialize_entry("value", &ValueForm(&self.value))?;
        map.end()
    }
}

struct ValueForm<'a>(&'a TtlvValue);

impl Serialize for ValueForm<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            TtlvValue::Structure(children) => children.serialize(serializer),
            TtlvValue::Integer(v) => serializer.serialize_i32(*v),
            TtlvValue::LongInteger(v) => {
                serializer.serialize_str(&format!("0x{:016X}", *v as u64))
            }
            TtlvValue::BigInteger(v) => v.serialize(serializer),
            TtlvValue::Enumeration(v) => {
                if v.name.is_empty() {
                    serializer.serialize_u32(v.value)
                } else {
                    serializer.serialize_str(&v.name)
                }
            }
            TtlvValue::Boolean(v) => serializer.serialize_bool(*v),
            TtlvValue::TextString(v) => serializer.serialize_str(v),
            TtlvValue::ByteString(v) => serializer.serialize_str(&hex::encode_upper(v)),
            TtlvValue::DateTime(v) => {
                serializer.serialize_str(&v.format(&Rfc3339).map_err(S::Error::custom)?)
            }
            TtlvValue::Interval(v) => serializer.serialize_u32(*v),
        }
    }
}

impl<'de> Deserialize<'de> for Ttlv {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        from_json_value(&raw).map_err(D::Error::custom)
    }
}

fn from_json_value(raw: &serde_json::Value) -> Result<Ttlv, String> {
    let object = raw.as_object().ok_or("a TTLV node must be a JSON object")?;
    let tag = tag_from_name(
        object
            .get("tag")
            .and_then(serde_json::Value::as_str)
            .ok_or("missing 'tag'")?,
    )?;
    let encoding = match object.get("type") {
        Some(t) => {
            let name = t.as_str().ok_or("'type' must be a string")?;
            EncodingType::from_name(name).map_err(|e| e.to_string())?
        }
        None => EncodingType::Structure,
    };
    let raw_value = object.get("value").ok_or("missing 'value'")?;
    let value = match encoding {
        EncodingType::Structure => {
            let children = raw_value
                .as_array()
                .ok_or("a Structure value must be a JSON array")?
                .iter()
                .map(from_json_value)
                .collect::<Result<Vec<_>, _>>()?;
            TtlvValue::Structure(children)
        }
        EncodingType::Integer => TtlvValue::Integer(match raw_value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or("Integer out of range")?,
            serde_json::Value::String(s) => {
                // the hex form is the 32-bit two's complement bit pattern
                let raw = u32::try_from(parse_hex_u64(s)?)
                    .map_err(|_| format!("Integer out of range: '{s}'"))?;
                raw as i32
            }
            _ => return Err("an Integer value must be a number or hex string".to_owned()),
        }),
        EncodingType::LongInteger => TtlvValue::LongInteger(match raw_value {
            serde_json::Value::Number(n) => n.as_i64().ok_or("LongInteger out of range")?,
            serde_json::Value::String(s) => parse_hex_u64(s)? as i64,
            _ => return Err("a LongInteger value must be a number or hex string".to_owned()),
        }),
        EncodingType::BigInteger => TtlvValue::BigInteger(
            serde_json::from_value::<KmipBigInt>(raw_value.clone()).map_err(|e| e.to_string())?,
        ),
        EncodingType::Enumeration => TtlvValue::Enumeration(match raw_value {
            serde_json::Value::Number(n) => TtlvEnumeration::from_value(
                n.as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or("Enumeration out of range")?,
            ),
            serde_json::Value::String(s) if s.starts_with("0x") => {
                TtlvEnumeration::from_value(
                    u32::try_from(parse_hex_u64(s)?).map_err(|e| e.to_string())?,
                )
            }
            serde_json::Value::String(s) => TtlvEnumeration {
                value: 0,
                name: s.clone(),
            },
            _ => return Err("an Enumeration value must be a number or string".to_owned()),
        }),
        EncodingType::Boolean => {
            TtlvValue::Boolean(raw_value.as_bool().ok_or("a Boolean value must be a bool")?)
        }
        EncodingType::TextString => TtlvValue::TextString(
            raw_value
                .as_str()
                .ok_or("a TextString value must be a string")?
                .to_owned(),
        ),
        EncodingType::ByteString => TtlvValue::ByteString(
            hex::decode(
                raw_value
                    .as_str()
                    .ok_or("a ByteString value must be a hex string")?,
            )
            .map_err(|e| e.to_string())?,
        ),
        EncodingType::DateTime => TtlvValue::DateTime(
            time::OffsetDateTime::parse(
                raw_value.as_str().ok_or("a DateTime value must be a string")?,
                &Rfc3339,
            )
            .map_err(|e| e.to_string())?,
        ),
        EncodingType::Interval => TtlvValue::Interval(
            raw_value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or("an Interval value must be a u32")?,
        ),
    };
    Ok(Ttlv::new(tag, value))
}

fn parse_hex_u64(s: &str) -> Result<u64, String> {
    let hex = s
        .strip_prefix("0x")
        .ok_or_else(|| format!("expected a 0x-prefixed hex string, got '{s}'"))?;
    u64::from_str_radix(hex, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}
