//! The XML text form of TTLV trees.
//!
//! Each node is an element named after its tag when the ambient protocol
//! version knows the name, or a generic `<TTLV tag="0x...">` element
//! otherwise. Structures nest child elements; primitives are empty elements
//! carrying `type` and `value` attributes.

mod deserializer;
mod serializer;

pub use deserializer::TtlvXmlDeserializer;
pub use serializer::TtlvXmlSerializer;

/// The element name used when the tag has no registered name.
const RAW_ELEMENT: &str = "TTLV";
