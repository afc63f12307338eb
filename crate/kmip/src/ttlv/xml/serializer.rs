use quick_xml::{
    Writer,
    events::{BytesStart, Event},
};

use super::RAW_ELEMENT;
use crate::{
    context::KmipContext,
    error::{KmipError, result::KmipResult},
    tag,
    ttlv::{Ttlv, TtlvValue},
};

pub struct TtlvXmlSerializer;

impl TtlvXmlSerializer {
    pub fn to_xml(ttlv: &Ttlv) -> KmipResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        Self::write_node(&mut writer, ttlv)?;
        let bytes = writer.into_inner();
        String::from_utf8(bytes).map_err(|e| KmipError::Default(format!("utf8: {e}")))
    }

    fn write_node(w: &mut Writer<Vec<u8>>, ttlv: &Ttlv) -> KmipResult<()> {
        let name = tag::from_value(KmipContext::spec(), ttlv.tag)
            .map_or_else(|_| RAW_ELEMENT.to_owned(), |t| t.description().to_owned());
        let mut elem = BytesStart::new(name.as_str());
        if name == RAW_ELEMENT {
            let hex = format!("0x{:06X}", ttlv.tag);
            elem.push_attribute(("tag", hex.as_str()));
        }
        match &ttlv.value {
            TtlvValue::Structure(children) => {
                elem.push_attribute(("type", "Structure"));
                w.write_event(Event::Start(elem))
                    .map_err(|e| KmipError::Default(format!("xml write: {e}")))?;
                for child in children {
                    Self::write_node(w, child)?;
                }
                w.write_event(Event::End(BytesStart::new(name.as_str()).to_end()))
                    .map_err(|e| KmipError::Default(format!("xml write: {e}")))?;
            }
            primitive => {
                match primitive {
                    TtlvValue::Integer(v) => {
                        elem.push_attribute(("type", "Integer"));
                        let val = v.to_string();
                        elem.push_attribute(("value", val.as_str()));
                    }
                    TtlvValue::LongInteger(v) => {
                        elem.push_attribute(("type", "LongInteger"));
                        let val = v.to_string();
                        elem.push_attribute(("value", val.as_str()));
                    }
                    TtlvValue::BigInteger(v) => {
                        elem.push_attribute(("type", "BigInteger"));
                        let val = format!("0x{}", hex::encode_upper(v.to_bytes_be()));
                        elem.push_attribute(("value", val.as_str()));
                    }
                    TtlvValue::Enumeration(variant) => {
                        elem.push_attribute(("type", "Enumeration"));
                        let val = variant.value.to_string();
                        elem.push_attribute(("value", val.as_str()));
                        if !variant.name.is_empty() {
                            elem.push_attribute(("name", variant.name.as_str()));
                        }
                    }
                    TtlvValue::Boolean(b) => {
                        elem.push_attribute(("type", "Boolean"));
                        elem.push_attribute(("value", if *b { "true" } else { "false" }));
                    }
                    TtlvValue::TextString(s) => {
                        elem.push_attribute(("type", "TextString"));
                        elem.push_attribute(("value", s.as_str()));
                    }
                    TtlvValue::ByteString(bytes) => {
                        elem.push_attribute(("type", "ByteString"));
                        let val = hex::encode(bytes);
                        elem.push_attribute(("value", val.as_str()));
                    }
                    TtlvValue::DateTime(dt) => {
                        elem.push_attribute(("type", "DateTime"));
                        let val = dt.unix_timestamp().to_string();
                        elem.push_attribute(("value", val.as_str()));
                    }
                    TtlvValue::Interval(i) => {
                        elem.push_attribute(("type", "Interval"));
                        let val = i.to_string();
                        elem.push_attribute(("value", val.as_str()));
                    }
                    TtlvValue::Structure(_) => {
                        return Err(KmipError::Default(
                            "cannot serialize Structure as an empty XML element".into(),
                        ));
                    }
                }
                w.write_event(Event::Empty(elem))
                    .map_err(|e| KmipError::Default(format!("xml write: {e}")))?;
            }
        }
        Ok(())
    }
}
