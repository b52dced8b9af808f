//! Errors shared across the relstore crates.

use std::error::Error as StdError;

#[derive(Debug, thiserror::Error)]
pub enum RelError {
    /// Relation could not be created from the given pieces, e.g. a column
    /// name/column count mismatch, or a tuple of the wrong width.
    #[error("construction: {0}")]
    Construction(String),

    /// Two relations taking part in a set operation (or join) don't agree on
    /// their schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A value of one concrete kind was used against a column of another.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("unsupported predicate type: {0}")]
    UnsupportedPredicateType(String),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("duplicate primary key value: {0}")]
    DuplicateKey(String),

    /// A column projected out of a grouping isn't constant within a group.
    #[error("column '{column}' is not constant within group {group}")]
    NonConstantGroup { column: String, group: usize },

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[source] Box<dyn StdError + Send + Sync>),

    #[error("internal: {0}")]
    Internal(String),
}

impl RelError {
    pub fn type_mismatch(expected: impl ToString, got: impl ToString) -> Self {
        RelError::TypeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    pub fn missing_column(name: impl Into<String>) -> Self {
        RelError::MissingColumn(name.into())
    }
}

pub type Result<T, E = RelError> = std::result::Result<T, E>;

#[macro_export]
macro_rules! internal {
    ($($arg:tt)*) => {
        $crate::RelError::Internal(std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! construction {
    ($($arg:tt)*) => {
        $crate::RelError::Construction(std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! schema_mismatch {
    ($($arg:tt)*) => {
        $crate::RelError::SchemaMismatch(std::format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_format_messages() {
        let err = construction!("expected {} columns, got {}", 2, 3);
        assert_eq!("construction: expected 2 columns, got 3", err.to_string());

        let err = internal!("bad state");
        assert!(matches!(err, RelError::Internal(s) if s == "bad state"));
    }

    #[test]
    fn type_mismatch_display() {
        let err = RelError::type_mismatch("Int64", "Utf8");
        assert_eq!("type mismatch: expected Int64, got Utf8", err.to_string());
    }
}
