//! The TTLV wire format: the raw byte engine, the typed tree, and its JSON
//! and XML text forms.

mod big_int;
mod encoding_type;
mod error;
mod json;
mod object;
mod value;
pub mod xml;

pub use big_int::KmipBigInt;
pub use encoding_type::EncodingType;
pub use error::TtlvError;
pub use object::{
    ALIGNMENT, HEADER_SIZE, TAG_SIZE, TtlvObject, padded_length, tag_from_bytes, tag_to_bytes,
};
pub use value::{Ttlv, TtlvEnumeration, TtlvValue};
