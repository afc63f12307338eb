use thiserror::Error;

use crate::{spec::KmipSpec, ttlv::TtlvError};

pub(crate) mod result;

#[derive(Error, Debug)]
pub enum KmipError {
    #[error("Conversion Error: {0}")]
    ConversionError(String),

    #[error("{0}")]
    Default(String),

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not Supported: {0} for KMIP spec {1}")]
    NotSupported(String, KmipSpec),

    #[error("Registration error: {0}")]
    Registration(String),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Tag mismatch: expected {expected}, got {actual}")]
    TagMismatch { expected: String, actual: String },

    #[error(transparent)]
    TryFromSliceError(#[from] std::array::TryFromSliceError),

    #[error(transparent)]
    TtlvError(#[from] TtlvError),

    #[error("Type mismatch for {tag}: expected {expected}, got {actual}")]
    TypeMismatch {
        tag: String,
        expected: String,
        actual: String,
    },
}

/// Return early with an error if a condition is not satisfied.
///
/// This macro is equivalent to `if !$cond { return Err(From::from($err)); }`.
#[macro_export]
macro_rules! kmip_ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::kmip_error!($msg));
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return ::core::result::Result::Err($crate::kmip_error!($fmt, $($arg)*));
        }
    };
}

/// Construct a codec error from a string.
#[macro_export]
macro_rules! kmip_error {
    ($msg:literal) => {
        $crate::error::KmipError::Default(::core::format_args!($msg).to_string())
    };
    ($err:expr $(,)?) => ({
        $crate::error::KmipError::Default($err.to_string())
    });
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::KmipError::Default(::core::format_args!($fmt, $($arg)*).to_string())
    };
}

/// Return early with an error.
#[macro_export]
macro_rules! kmip_bail {
    ($msg:literal) => {
        return ::core::result::Result::Err($crate::kmip_error!($msg))
    };
    ($err:expr $(,)?) => {
        return ::core::result::Result::Err($err)
    };
    ($fmt:expr, $($arg:tt)*) => {
        return ::core::result::Result::Err($crate::kmip_error!($fmt, $($arg)*))
    };
}
