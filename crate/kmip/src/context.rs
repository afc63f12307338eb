//! Thread-scoped ambient protocol version.
//!
//! Message decoding reads the ProtocolVersion out of the header first, then
//! decodes the rest of the same message under that spec via
//! [`KmipContext::with_spec`]. The ambient value is thread-local so
//! concurrent decodes never observe each other's version.

use std::cell::Cell;

use tracing::trace;

use crate::spec::KmipSpec;

thread_local! {
    static CURRENT_SPEC: Cell<Option<KmipSpec>> = const { Cell::new(None) };
}

pub struct KmipContext;

impl KmipContext {
    /// The ambient spec of the current thread, `UnknownVersion` when unset.
    #[must_use]
    pub fn spec() -> KmipSpec {
        CURRENT_SPEC
            .with(Cell::get)
            .unwrap_or(KmipSpec::UnknownVersion)
    }

    /// Set the ambient spec for the current thread.
    pub fn set_spec(spec: KmipSpec) {
        CURRENT_SPEC.with(|current| current.set(Some(spec)));
    }

    /// Reset the current thread to the default (`UnknownVersion`).
    pub fn clear() {
        CURRENT_SPEC.with(|current| current.set(None));
    }

    /// Run `f` with `spec` as the ambient value, restoring the previous value
    /// afterwards, including when `f` panics.
    pub fn with_spec<R>(spec: KmipSpec, f: impl FnOnce() -> R) -> R {
        let _guard = SpecGuard::enter(spec);
        f()
    }
}

struct SpecGuard {
    previous: Option<KmipSpec>,
}

impl SpecGuard {
    fn enter(spec: KmipSpec) -> Self {
        let previous = CURRENT_SPEC.with(|current| current.replace(Some(spec)));
        trace!("entering KMIP context {spec} (was {previous:?})");
        Self { previous }
    }
}

impl Drop for SpecGuard {
    fn drop(&mut self) {
        CURRENT_SPEC.with(|current| current.set(self.previous));
    }
}

#[cfg(test)]
mod tests {
    use super::KmipContext;
    use crate::spec::KmipSpec;

    // The ambient value is thread-local, so each test drives its own thread
    // to stay independent of the harness' test threading.

    #[test]
    fn defaults_to_unknown_version() {
        std::thread::spawn(|| {
            assert_eq!(KmipContext::spec(), KmipSpec::UnknownVersion);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn set_and_clear() {
        std::thread::spawn(|| {
            KmipContext::set_spec(KmipSpec::V1_2);
            assert_eq!(KmipContext::spec(), KmipSpec::V1_2);
            KmipContext::clear();
            assert_eq!(KmipContext::spec(), KmipSpec::UnknownVersion);
            // a second clear is a no-op
            KmipContext::clear();
            assert_eq!(KmipContext::spec(), KmipSpec::UnknownVersion);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn with_spec_scopes_and_restores() {
        std::thread::spawn(|| {
            KmipContext::set_spec(KmipSpec::V2_1);
            let seen = KmipContext::with_spec(KmipSpec::V1_2, KmipContext::spec);
            assert_eq!(seen, KmipSpec::V1_2);
            assert_eq!(KmipContext::spec(), KmipSpec::V2_1);

            KmipContext::clear();
            KmipContext::with_spec(KmipSpec::V3_0, || {
                assert_eq!(KmipContext::spec(), KmipSpec::V3_0);
            });
            assert_eq!(KmipContext::spec(), KmipSpec::UnknownVersion);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn with_spec_nests() {
        std::thread::spawn(|| {
            KmipContext::with_spec(KmipSpec::V1_2, || {
                KmipContext::with_spec(KmipSpec::V2_1, || {
                    assert_eq!(KmipContext::spec(), KmipSpec::V2_1);
                });
                assert_eq!(KmipContext::spec(), KmipSpec::V1_2);
            });
        })
        .join()
        .unwrap();
    }

    #[test]
    fn with_spec_restores_on_panic() {
        std::thread::spawn(|| {
            KmipContext::set_spec(KmipSpec::V1_2);
            let caught = std::panic::catch_unwind(|| {
                KmipContext::with_spec(KmipSpec::V2_1, || panic!("boom"));
            });
            assert!(caught.is_err());
            assert_eq!(KmipContext::spec(), KmipSpec::V1_2);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn spec_is_thread_local() {
        std::thread::spawn(|| {
            KmipContext::set_spec(KmipSpec::V1_2);
            let other = std::thread::spawn(KmipContext::spec).join().unwrap();
            assert_eq!(other, KmipSpec::UnknownVersion);
            assert_eq!(KmipContext::spec(), KmipSpec::V1_2);
        })
        .join()
        .unwrap();
    }
}
