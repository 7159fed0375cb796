use thiserror::Error;

/// Failure taxonomy for the value layer.
///
/// Every variant is a local, synchronous failure surfaced directly to the
/// caller of the offending operation; nothing is retried, logged, or swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A payload failed its type's validity predicate.
    #[error("invalid value: {reason}")]
    Invalid { reason: String },
    /// An operand failed the expected-capability check at an operation boundary.
    #[error("signature mismatch: expected {expected}, found {found}")]
    SignatureMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// An algebra or ordering method was invoked on a type that lacks it.
    #[error("{operation} is not implemented for {class}")]
    NotImplemented {
        operation: &'static str,
        class: &'static str,
    },
    /// A temporal accessor or op needs finer resolution than the value carries.
    #[error("{actual} resolution is too coarse for a {required}-level access")]
    Resolution {
        required: &'static str,
        actual: &'static str,
    },
}

impl ValueError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ValueError::Invalid {
            reason: reason.into(),
        }
    }
}
