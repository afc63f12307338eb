//! The data-type registry: maps (protocol version, tag, encoding type) to the
//! concrete attribute behind a wire-level Attribute carrier.
//!
//! Registration is last-write-wins so deployments can shadow a built-in
//! binding with their own.

use std::{
    collections::HashMap,
    sync::{Arc, Once, RwLock},
};

use lazy_static::lazy_static;
use tracing::debug;

use crate::{
    error::{KmipError, result::KmipResult},
    kmip::{ActivationDate, AttributeValue, KmipAttribute},
    spec::KmipSpec,
    ttlv::EncodingType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RegistryKey {
    spec: KmipSpec,
    tag: u32,
    encoding: EncodingType,
}

/// Builds the concrete attribute out of the carrier's primitive value.
pub type AttributeFactory =
    Arc<dyn Fn(&AttributeValue) -> KmipResult<Box<dyn KmipAttribute>> + Send + Sync>;

#[derive(Clone)]
pub struct DataTypeEntry {
    pub type_name: &'static str,
    pub factory: AttributeFactory,
}

lazy_static! {
    static ref DATA_TYPES: RwLock<HashMap<RegistryKey, DataTypeEntry>> =
        RwLock::new(HashMap::new());
}

/// Bind a factory to (spec, tag, encoding type), replacing any previous
/// binding for the same key.
pub fn register_data_type(
    spec: KmipSpec,
    tag: u32,
    encoding: EncodingType,
    type_name: &'static str,
    factory: AttributeFactory,
) -> KmipResult<()> {
    let key = RegistryKey {
        spec,
        tag,
        encoding,
    };
    let mut map = DATA_TYPES
        .write()
        .map_err(|e| KmipError::Registration(format!("data type registry poisoned: {e}")))?;
    if let Some(previous) = map.insert(key, DataTypeEntry { type_name, factory }) {
        debug!(
            "data type {type_name} replaces {} for tag 0x{tag:06X} ({encoding}) under {spec}",
            previous.type_name
        );
    }
    Ok(())
}

/// Look up the binding for (spec, tag, encoding type).
pub fn resolve_data_type(
    spec: KmipSpec,
    tag: u32,
    encoding: EncodingType,
) -> KmipResult<DataTypeEntry> {
    let key = RegistryKey {
        spec,
        tag,
        encoding,
    };
    let map = DATA_TYPES
        .read()
        .map_err(|e| KmipError::Registration(format!("data type registry poisoned: {e}")))?;
    map.get(&key).cloned().ok_or_else(|| {
        KmipError::NotFound(format!(
            "no data type registered for tag 0x{tag:06X} ({encoding}) under {spec}"
        ))
    })
}

static BUILTINS: Once = Once::new();

/// Register the built-in attribute bindings. Idempotent, cheap to call from
/// any entry point that resolves attributes.
pub fn register_builtin_types() {
    BUILTINS.call_once(|| {
        let activation_date: AttributeFactory = Arc::new(|value| match value {
            AttributeValue::DateTime(date) => {
                Ok(Box::new(ActivationDate::new(*date)) as Box<dyn KmipAttribute>)
            }
            other => Err(KmipError::TypeMismatch {
                tag: "0x420001".to_owned(),
                expected: EncodingType::DateTime.to_string(),
                actual: other.encoding_type().to_string(),
            }),
        });
        for spec in [KmipSpec::UnknownVersion, KmipSpec::V1_2] {
            if let Err(e) = register_data_type(
                spec,
                0x42_0001,
                EncodingType::DateTime,
                "ActivationDate",
                activation_date.clone(),
            ) {
                debug!("builtin registration failed: {e}");
            }
        }
    });
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{register_builtin_types, register_data_type, resolve_data_type, AttributeFactory};
    use crate::{
        error::KmipError,
        kmip::{ActivationDate, AttributeValue, KmipAttribute},
        spec::KmipSpec,
        ttlv::EncodingType,
    };

    fn dummy_factory() -> AttributeFactory {
        Arc::new(|value| match value {
            AttributeValue::DateTime(date) => {
                Ok(Box::new(ActivationDate::new(*date)) as Box<dyn KmipAttribute>)
            }
            _ => Err(KmipError::Default("dummy".to_owned())),
        })
    }

    #[test]
    fn resolve_missing_is_not_found() {
        assert!(matches!(
            resolve_data_type(KmipSpec::V3_0, 0x42_0042, EncodingType::Integer),
            Err(KmipError::NotFound(_))
        ));
    }

    #[test]
    fn registration_is_last_write_wins() {
        // a tag outside the builtin set so other tests are unaffected
        let tag = 0x42_0099;
        register_data_type(
            KmipSpec::V2_1,
            tag,
            EncodingType::DateTime,
            "First",
            dummy_factory(),
        )
        .unwrap();
        register_data_type(
            KmipSpec::V2_1,
            tag,
            EncodingType::DateTime,
            "Second",
            dummy_factory(),
        )
        .unwrap();
        let entry = resolve_data_type(KmipSpec::V2_1, tag, EncodingType::DateTime).unwrap();
        assert_eq!(entry.type_name, "Second");
    }

    #[test]
    fn keys_are_scoped_by_spec_and_encoding() {
        register_builtin_types();
        assert!(resolve_data_type(KmipSpec::V1_2, 0x42_0001, EncodingType::DateTime).is_ok());
        assert!(
            resolve_data_type(KmipSpec::UnknownVersion, 0x42_0001, EncodingType::DateTime).is_ok()
        );
        assert!(resolve_data_type(KmipSpec::V3_0, 0x42_0001, EncodingType::DateTime).is_err());
        assert!(resolve_data_type(KmipSpec::V1_2, 0x42_0001, EncodingType::Integer).is_err());
    }

    #[test]
    fn builtin_factory_checks_the_value_kind() {
        register_builtin_types();
        let entry = resolve_data_type(KmipSpec::V1_2, 0x42_0001, EncodingType::DateTime).unwrap();
        assert!(matches!(
            (entry.factory)(&AttributeValue::Integer(1)),
            Err(KmipError::TypeMismatch { .. })
        ));
    }
}
