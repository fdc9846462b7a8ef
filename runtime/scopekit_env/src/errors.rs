//! Error types for the environment engine.
//!
//! Every failure is local and typed: it is returned where it is detected and
//! nothing in this crate substitutes a default value for a failed lookup.
//! Operations validate before they mutate, so an `Err` never leaves a binding
//! table or parent link half-updated.

use std::fmt;

use scopekit_ir::{quote_name, Name, StringLookup};

use crate::graph::EnvId;

/// Result alias used throughout the crate.
pub type EnvResult<T> = Result<T, EnvError>;

/// Why a parent assignment was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParentViolation {
    /// The empty environment has no parent and never gets one.
    EmptyHasNoParent,
    /// The proposed parent chain already passes through the environment.
    Cycle,
}

impl fmt::Display for ParentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentViolation::EmptyHasNoParent => f.write_str("the empty environment has no parent"),
            ParentViolation::Cycle => f.write_str("parent chain would loop back to itself"),
        }
    }
}

/// Failure raised by the environment engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    /// Strict lookup or resolution found no binding for `name`.
    #[error("object {name:?} not found")]
    NameNotFound { name: Name },

    #[error("cannot set parent of {env}: {reason}")]
    InvalidParent { env: EnvId, reason: ParentViolation },

    /// Call depth reached the configured limit.
    #[error("evaluation nested too deeply: call depth limit of {limit} reached")]
    DepthExceeded { limit: usize },

    #[error("cannot assign values in the empty environment")]
    EmptyEnvironment,

    /// The handle refers to an environment that has been reclaimed.
    #[error("{env} has been reclaimed")]
    StaleEnvironment { env: EnvId },

    #[error("closure takes {expected} argument(s), {got} supplied")]
    ArityMismatch { expected: usize, got: usize },

    #[error("parameter {name:?} appears more than once")]
    DuplicateParameter { name: Name },

    #[error("attempt to apply non-function of kind {kind}")]
    NotCallable { kind: &'static str },

    /// Failure reported by a closure body.
    #[error("{message}")]
    Raised { message: String },
}

impl EnvError {
    /// Failure raised from inside a closure body.
    pub fn raised(message: impl Into<String>) -> Self {
        EnvError::Raised {
            message: message.into(),
        }
    }

    /// Render the error with names spelled out instead of as handles.
    pub fn describe(&self, names: &dyn StringLookup) -> String {
        match self {
            EnvError::NameNotFound { name } => {
                format!("object {} not found", quote_name(names.lookup(*name)))
            }
            EnvError::DuplicateParameter { name } => format!(
                "parameter {} appears more than once",
                quote_name(names.lookup(*name))
            ),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopekit_ir::StringInterner;

    #[test]
    fn test_describe_quotes_non_syntactic_names() {
        let interner = StringInterner::new();
        let err = EnvError::NameNotFound {
            name: interner.intern("my var"),
        };
        assert_eq!(err.describe(&interner), "object `my var` not found");
    }

    #[test]
    fn test_describe_duplicate_parameter() {
        let interner = StringInterner::new();
        let err = EnvError::DuplicateParameter {
            name: interner.intern("a"),
        };
        assert_eq!(err.describe(&interner), "parameter a appears more than once");
    }

    #[test]
    fn test_describe_falls_back_to_display() {
        let interner = StringInterner::new();
        let err = EnvError::DepthExceeded { limit: 12 };
        assert_eq!(
            err.describe(&interner),
            "evaluation nested too deeply: call depth limit of 12 reached"
        );
    }

    #[test]
    fn test_invalid_parent_message() {
        let err = EnvError::InvalidParent {
            env: EnvId::EMPTY,
            reason: ParentViolation::EmptyHasNoParent,
        };
        assert_eq!(
            err.to_string(),
            "cannot set parent of <env 0>: the empty environment has no parent"
        );
    }
}
