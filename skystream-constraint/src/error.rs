//! Constraint parsing and compilation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConstraintError {
    /// Lexical or grammatical problem in a WHERE clause. The offset is a
    /// byte position into the original input.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("column {0} referenced in WHERE clause does not exist")]
    UnknownColumn(String),

    #[error("malformed numeric literal '{0}'")]
    BadNumber(String),

    #[error("malformed timestamp literal '{0}': expecting YYYY-MM-DD HH:MM:SS")]
    BadTimestamp(String),

    #[error("expected a predicate, got a value expression")]
    ExpectedPredicate,

    #[error("expected a value expression, got a predicate")]
    ExpectedValue,
}

impl ConstraintError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> ConstraintError {
        ConstraintError::Syntax {
            offset,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConstraintError>;
