//! WHERE clause syntax trees.
//!
//! A [`ConstraintNode`] supports three operations: [`extract_cols`]
//! (the set of logical columns referenced), `compile` (an executable
//! predicate over rows, see [`crate::compile`]) and `render` (the
//! canonical ASCII form handed to the chunk index pre-filter, see
//! [`crate::render`]).
//!
//! [`extract_cols`]: ConstraintNode::extract_cols

use std::collections::{BTreeMap, BTreeSet};

use skystream_core::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintNode {
    /// Numeric literal, kept as its source lexeme. A lexeme containing
    /// `.`, `e` or `E` compiles to a float, anything else to an integer.
    Number(String),
    Str(String),
    /// `TIMESTAMP 'YYYY-MM-DD HH:MM:SS'`, kept as the quoted lexeme.
    Timestamp(String),
    Null,
    /// `CURRENT_TIMESTAMP`.
    Now,
    /// Reference to a logical column name.
    Column(String),
    Neg(Box<ConstraintNode>),
    Arith(ArithOp, Box<ConstraintNode>, Box<ConstraintNode>),
    Concat(Box<ConstraintNode>, Box<ConstraintNode>),
    Compare(CmpOp, Box<ConstraintNode>, Box<ConstraintNode>),
    Between {
        expr: Box<ConstraintNode>,
        negated: bool,
        low: Box<ConstraintNode>,
        high: Box<ConstraintNode>,
    },
    In {
        expr: Box<ConstraintNode>,
        negated: bool,
        list: Vec<ConstraintNode>,
    },
    Like {
        expr: Box<ConstraintNode>,
        negated: bool,
        pattern: Box<ConstraintNode>,
        escape: Option<Box<ConstraintNode>>,
    },
    IsNull {
        expr: Box<ConstraintNode>,
        negated: bool,
    },
    Not(Box<ConstraintNode>),
    And(Box<ConstraintNode>, Box<ConstraintNode>),
    Or(Box<ConstraintNode>, Box<ConstraintNode>),
}

impl ConstraintNode {
    /// Returns every logical column name referenced in this tree, in
    /// sorted order.
    pub fn extract_cols(&self) -> BTreeSet<String> {
        let mut cols = BTreeSet::new();
        self.collect_cols(&mut cols);
        cols
    }

    fn collect_cols(&self, cols: &mut BTreeSet<String>) {
        match self {
            ConstraintNode::Number(_)
            | ConstraintNode::Str(_)
            | ConstraintNode::Timestamp(_)
            | ConstraintNode::Null
            | ConstraintNode::Now => {}
            ConstraintNode::Column(name) => {
                cols.insert(name.clone());
            }
            ConstraintNode::Neg(e) | ConstraintNode::Not(e) => e.collect_cols(cols),
            ConstraintNode::Arith(_, a, b)
            | ConstraintNode::Concat(a, b)
            | ConstraintNode::Compare(_, a, b)
            | ConstraintNode::And(a, b)
            | ConstraintNode::Or(a, b) => {
                a.collect_cols(cols);
                b.collect_cols(cols);
            }
            ConstraintNode::Between {
                expr, low, high, ..
            } => {
                expr.collect_cols(cols);
                low.collect_cols(cols);
                high.collect_cols(cols);
            }
            ConstraintNode::In { expr, list, .. } => {
                expr.collect_cols(cols);
                for item in list {
                    item.collect_cols(cols);
                }
            }
            ConstraintNode::Like {
                expr,
                pattern,
                escape,
                ..
            } => {
                expr.collect_cols(cols);
                pattern.collect_cols(cols);
                if let Some(esc) = escape {
                    esc.collect_cols(cols);
                }
            }
            ConstraintNode::IsNull { expr, .. } => expr.collect_cols(cols),
        }
    }
}

/// Builds a WHERE clause tree matching the given column/value map, used
/// to turn a row id specification into a constraint. A null value maps
/// to `IS NULL`. Returns `None` for an empty map; iteration order over
/// the map keys makes the result deterministic.
pub fn cvmap_to_ast(cvmap: &BTreeMap<String, Value>) -> Option<ConstraintNode> {
    let mut ast: Option<ConstraintNode> = None;
    for (name, value) in cvmap {
        let col = Box::new(ConstraintNode::Column(name.clone()));
        let pred = match value {
            Value::Null => ConstraintNode::IsNull {
                expr: col,
                negated: false,
            },
            Value::Str(s) => ConstraintNode::Compare(
                CmpOp::Eq,
                col,
                Box::new(ConstraintNode::Str(s.clone())),
            ),
            Value::Int(i) => ConstraintNode::Compare(
                CmpOp::Eq,
                col,
                Box::new(ConstraintNode::Number(i.to_string())),
            ),
            Value::Float(f) => ConstraintNode::Compare(
                CmpOp::Eq,
                col,
                Box::new(ConstraintNode::Number(format!("{f:?}"))),
            ),
            Value::Timestamp(t) => ConstraintNode::Compare(
                CmpOp::Eq,
                col,
                Box::new(ConstraintNode::Timestamp(
                    t.format("%Y-%m-%d %H:%M:%S").to_string(),
                )),
            ),
        };
        ast = Some(match ast {
            None => pred,
            Some(rest) => ConstraintNode::And(Box::new(pred), Box::new(rest)),
        });
    }
    ast
}
