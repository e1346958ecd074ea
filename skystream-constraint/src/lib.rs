//! A subset of the SQL92 WHERE clause grammar used to constrain
//! metadata table searches.
//!
//! [`ConstraintParser`] turns WHERE clause text into a
//! [`ConstraintNode`] tree. Trees compile into executable row
//! predicates ([`CompiledConstraint`]) with SQL NULL semantics, and
//! render to a canonical ASCII string for the chunk index pre-filter.
//! Notably missing from the grammar are CAST expressions, SUBSTRING and
//! TRIM support, and mathematical function calls.

pub mod ast;
pub mod compile;
pub mod error;
pub mod lex;
pub mod parse;
mod render;

pub use ast::{cvmap_to_ast, ArithOp, CmpOp, ConstraintNode};
pub use compile::CompiledConstraint;
pub use error::{ConstraintError, Result};
pub use parse::ConstraintParser;
