//! Core error types for tessera.

use thiserror::Error;

/// Result type alias using `TesseraError`.
pub type TesseraResult<T> = std::result::Result<T, TesseraError>;

/// Core error type for tessera operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TesseraError {
    /// A logical plan referenced a partition set that was not supplied.
    #[error("PartitionSetNotFound: no partition set registered under key '{key}'")]
    PartitionSetNotFound { key: String },

    /// A node, or a variant of a node, has no physical lowering.
    #[error("UnsupportedPlan: {0}")]
    UnsupportedPlan(String),

    /// Invalid value provided.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// Failure while running scheduled work.
    #[error("ExecutionError: {0}")]
    ExecutionError(String),

    /// Internal error (bug in tessera).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl TesseraError {
    /// Create a new `PartitionSetNotFound` error.
    pub fn partition_set_not_found<S: Into<String>>(key: S) -> Self {
        Self::PartitionSetNotFound { key: key.into() }
    }

    /// Create a new `UnsupportedPlan` error.
    pub fn unsupported_plan<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedPlan(msg.into())
    }

    /// Create a new `ValueError`.
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a new `ExecutionError`.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// True if a partition-set lookup failed.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::PartitionSetNotFound { .. })
    }

    /// True if the plan (or part of it) cannot be lowered.
    pub fn is_unsupported_plan(&self) -> bool {
        matches!(self, Self::UnsupportedPlan(_))
    }
}

/// Ensure a condition holds, returning an error if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::TesseraError::$variant(format!($($msg)*)));
        }
    };
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::TesseraError::InternalError($msg.to_string()));
        }
    };
}

/// Return early with an `UnsupportedPlan` error.
#[macro_export]
macro_rules! unsupported_err {
    ($($arg:tt)*) => {
        return Err($crate::TesseraError::UnsupportedPlan(format!($($arg)*)))
    };
}
