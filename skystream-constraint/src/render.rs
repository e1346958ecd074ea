//! Canonical ASCII rendering of constraint trees.
//!
//! The rendered form is what gets handed verbatim to the chunk index
//! pre-filter. Equality renders as `==`, timestamps as `DATETIME('...')`
//! and constant columns as their literal value; everything else renders
//! its physical column name.

use skystream_core::Table;

use crate::ast::{ArithOp, CmpOp, ConstraintNode};
use crate::error::{ConstraintError, Result};

impl ArithOp {
    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

impl ConstraintNode {
    pub fn render(&self, table: &Table) -> Result<String> {
        Ok(match self {
            ConstraintNode::Number(lexeme) => lexeme.clone(),
            ConstraintNode::Str(s) => format!("'{s}'"),
            ConstraintNode::Timestamp(s) => format!("DATETIME('{s}')"),
            ConstraintNode::Null => "NULL".to_owned(),
            ConstraintNode::Now => "CURRENT_TIMESTAMP".to_owned(),
            ConstraintNode::Column(name) => {
                let column = table
                    .column(name)
                    .ok_or_else(|| ConstraintError::UnknownColumn(name.clone()))?;
                match &column.constant {
                    Some(value) => value.to_string(),
                    None => column.dbname.clone(),
                }
            }
            ConstraintNode::Neg(inner) => format!("-{}", inner.render(table)?),
            ConstraintNode::Arith(op, a, b) => format!(
                "({} {} {})",
                a.render(table)?,
                op.symbol(),
                b.render(table)?
            ),
            ConstraintNode::Concat(a, b) => {
                format!("({} || {})", a.render(table)?, b.render(table)?)
            }
            ConstraintNode::Compare(op, a, b) => format!(
                "({} {} {})",
                a.render(table)?,
                op.symbol(),
                b.render(table)?
            ),
            ConstraintNode::Between {
                expr,
                negated,
                low,
                high,
            } => format!(
                "({}{} BETWEEN {} AND {})",
                expr.render(table)?,
                if *negated { " NOT" } else { "" },
                low.render(table)?,
                high.render(table)?
            ),
            ConstraintNode::In {
                expr,
                negated,
                list,
            } => {
                let items = list
                    .iter()
                    .map(|n| n.render(table))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                format!(
                    "({}{} IN ({}))",
                    expr.render(table)?,
                    if *negated { " NOT" } else { "" },
                    items
                )
            }
            ConstraintNode::Like {
                expr,
                negated,
                pattern,
                escape,
            } => {
                let esc = match escape {
                    Some(e) => format!(" ESCAPE {}", e.render(table)?),
                    None => String::new(),
                };
                format!(
                    "({}{} LIKE {}{})",
                    expr.render(table)?,
                    if *negated { " NOT" } else { "" },
                    pattern.render(table)?,
                    esc
                )
            }
            ConstraintNode::IsNull { expr, negated } => format!(
                "{} IS {}NULL",
                expr.render(table)?,
                if *negated { "NOT " } else { "" }
            ),
            ConstraintNode::Not(inner) => format!("NOT {}", inner.render(table)?),
            ConstraintNode::And(a, b) => {
                format!("({} AND {})", a.render(table)?, b.render(table)?)
            }
            ConstraintNode::Or(a, b) => {
                format!("({} OR {})", a.render(table)?, b.render(table)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use skystream_core::{Column, Value};

    use super::*;
    use crate::ast::cvmap_to_ast;
    use crate::parse::ConstraintParser;

    fn table() -> Table {
        Table::new(
            "t",
            vec![
                Column::new("a"),
                Column::new("b").dbname("b_phys"),
                Column::new("name"),
                Column::new("mission").constant(Value::Str("wise".into())),
            ],
        )
        .unwrap()
    }

    fn rendered(input: &str) -> String {
        let node = ConstraintParser::new().parse(input).unwrap();
        node.render(&table()).unwrap()
    }

    #[test]
    fn equality_renders_double_equals() {
        assert_eq!(rendered("a = 1"), "(a == 1)");
    }

    #[test]
    fn dbname_and_constant_substitution() {
        assert_eq!(rendered("b > 2 AND mission = 'wise'"), "((b_phys > 2) AND (wise == 'wise'))");
    }

    #[test]
    fn arithmetic_keeps_grouping() {
        assert_eq!(rendered("a + b * 2 < 10"), "((a + (b_phys * 2)) < 10)");
        assert_eq!(rendered("-a < 1"), "(-a < 1)");
    }

    #[test]
    fn predicate_forms() {
        assert_eq!(rendered("a NOT BETWEEN 1 AND 10"), "(a NOT BETWEEN 1 AND 10)");
        assert_eq!(rendered("a IN (1, 2)"), "(a IN (1, 2))");
        assert_eq!(rendered("a IS NOT NULL"), "a IS NOT NULL");
        assert_eq!(
            rendered("name LIKE 'w%' ESCAPE '!'"),
            "(name LIKE 'w%' ESCAPE '!')"
        );
        assert_eq!(rendered("NOT a = 1 OR b = 2"), "(NOT (a == 1) OR (b_phys == 2))");
    }

    #[test]
    fn timestamp_renders_datetime() {
        assert_eq!(
            rendered("a < TIMESTAMP '2011-02-03 04:05:06'"),
            "(a < DATETIME('2011-02-03 04:05:06'))"
        );
    }

    #[test]
    fn unknown_column_fails_render() {
        let node = ConstraintParser::new().parse("nope = 1").unwrap();
        assert!(node.render(&table()).is_err());
    }

    #[test]
    fn cvmap_renders_deterministically() {
        let mut m = BTreeMap::new();
        m.insert("a".to_owned(), Value::Int(1));
        m.insert("b".to_owned(), Value::Str("x".into()));
        let ast = cvmap_to_ast(&m).unwrap();
        let s = ast.render(&table()).unwrap();
        assert!(s.contains("a == 1"));
        assert!(s.contains("b_phys == 'x'"));
        assert!(s.contains(" AND "));
    }
}
