//! A KMIP TTLV codec: the binary wire format, its JSON and XML text forms,
//! protocol-version-scoped tag and data-type registries, and the typed schema
//! layer built on top of them.

pub use error::{KmipError, result::{KmipResult, KmipResultHelper}};

pub mod context;
mod error;
pub mod kmip;
pub mod registry;
pub mod spec;
pub mod tag;
pub mod ttlv;
