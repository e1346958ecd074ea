//! Compilation of constraint trees into executable row predicates.
//!
//! Column references are resolved against a table description at
//! compile time; evaluation follows SQL three-valued logic, so a
//! predicate whose value is unknown (because of NULLs) never matches.

use chrono::{NaiveDateTime, Utc};
use skystream_core::{Row, Table, Value};

use crate::ast::{ArithOp, CmpOp, ConstraintNode};
use crate::error::{ConstraintError, Result};

/// Kleene three-valued boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tri {
    True,
    False,
    Unknown,
}

impl Tri {
    fn of(b: bool) -> Tri {
        if b {
            Tri::True
        } else {
            Tri::False
        }
    }

    fn not(self) -> Tri {
        match self {
            Tri::True => Tri::False,
            Tri::False => Tri::True,
            Tri::Unknown => Tri::Unknown,
        }
    }

    fn and(self, other: Tri) -> Tri {
        match (self, other) {
            (Tri::False, _) | (_, Tri::False) => Tri::False,
            (Tri::True, Tri::True) => Tri::True,
            _ => Tri::Unknown,
        }
    }

    fn or(self, other: Tri) -> Tri {
        match (self, other) {
            (Tri::True, _) | (_, Tri::True) => Tri::True,
            (Tri::False, Tri::False) => Tri::False,
            _ => Tri::Unknown,
        }
    }
}

#[derive(Debug)]
enum Expr {
    Const(Value),
    /// Physical column name, looked up in each row.
    Col(String),
    Now,
    Neg(Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Concat(Box<Expr>, Box<Expr>),
}

#[derive(Debug)]
enum Pred {
    Cmp(CmpOp, Expr, Expr),
    Between {
        expr: Expr,
        negated: bool,
        low: Expr,
        high: Expr,
    },
    In {
        expr: Expr,
        negated: bool,
        list: Vec<Expr>,
    },
    Like {
        expr: Expr,
        negated: bool,
        pattern: Expr,
        escape: Option<Expr>,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    Not(Box<Pred>),
    And(Box<Pred>, Box<Pred>),
    Or(Box<Pred>, Box<Pred>),
}

/// An executable row predicate.
#[derive(Debug)]
pub struct CompiledConstraint {
    root: Pred,
}

impl CompiledConstraint {
    /// True iff the row definitely satisfies the constraint. Unknown
    /// (NULL-valued) results do not match.
    pub fn matches(&self, row: &Row) -> bool {
        self.root.eval(row) == Tri::True
    }
}

impl ConstraintNode {
    /// Resolves column references against `table` and produces an
    /// executable predicate.
    pub fn compile(&self, table: &Table) -> Result<CompiledConstraint> {
        Ok(CompiledConstraint {
            root: compile_pred(self, table)?,
        })
    }
}

fn compile_pred(node: &ConstraintNode, table: &Table) -> Result<Pred> {
    Ok(match node {
        ConstraintNode::Compare(op, a, b) => {
            Pred::Cmp(*op, compile_expr(a, table)?, compile_expr(b, table)?)
        }
        ConstraintNode::Between {
            expr,
            negated,
            low,
            high,
        } => Pred::Between {
            expr: compile_expr(expr, table)?,
            negated: *negated,
            low: compile_expr(low, table)?,
            high: compile_expr(high, table)?,
        },
        ConstraintNode::In {
            expr,
            negated,
            list,
        } => Pred::In {
            expr: compile_expr(expr, table)?,
            negated: *negated,
            list: list
                .iter()
                .map(|n| compile_expr(n, table))
                .collect::<Result<Vec<_>>>()?,
        },
        ConstraintNode::Like {
            expr,
            negated,
            pattern,
            escape,
        } => Pred::Like {
            expr: compile_expr(expr, table)?,
            negated: *negated,
            pattern: compile_expr(pattern, table)?,
            escape: escape
                .as_deref()
                .map(|n| compile_expr(n, table))
                .transpose()?,
        },
        ConstraintNode::IsNull { expr, negated } => Pred::IsNull {
            expr: compile_expr(expr, table)?,
            negated: *negated,
        },
        ConstraintNode::Not(inner) => Pred::Not(Box::new(compile_pred(inner, table)?)),
        ConstraintNode::And(a, b) => Pred::And(
            Box::new(compile_pred(a, table)?),
            Box::new(compile_pred(b, table)?),
        ),
        ConstraintNode::Or(a, b) => Pred::Or(
            Box::new(compile_pred(a, table)?),
            Box::new(compile_pred(b, table)?),
        ),
        _ => return Err(ConstraintError::ExpectedPredicate),
    })
}

fn compile_expr(node: &ConstraintNode, table: &Table) -> Result<Expr> {
    Ok(match node {
        ConstraintNode::Number(lexeme) => Expr::Const(parse_number(lexeme)?),
        ConstraintNode::Str(s) => Expr::Const(Value::Str(s.clone())),
        ConstraintNode::Timestamp(s) => {
            let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map_err(|_| ConstraintError::BadTimestamp(s.clone()))?;
            Expr::Const(Value::Timestamp(dt))
        }
        ConstraintNode::Null => Expr::Const(Value::Null),
        ConstraintNode::Now => Expr::Now,
        ConstraintNode::Column(name) => {
            let column = table
                .column(name)
                .ok_or_else(|| ConstraintError::UnknownColumn(name.clone()))?;
            match &column.constant {
                Some(value) => Expr::Const(value.clone()),
                None => Expr::Col(column.dbname.clone()),
            }
        }
        ConstraintNode::Neg(inner) => Expr::Neg(Box::new(compile_expr(inner, table)?)),
        ConstraintNode::Arith(op, a, b) => Expr::Arith(
            *op,
            Box::new(compile_expr(a, table)?),
            Box::new(compile_expr(b, table)?),
        ),
        ConstraintNode::Concat(a, b) => Expr::Concat(
            Box::new(compile_expr(a, table)?),
            Box::new(compile_expr(b, table)?),
        ),
        _ => return Err(ConstraintError::ExpectedValue),
    })
}

fn parse_number(lexeme: &str) -> Result<Value> {
    if lexeme.contains(['.', 'e', 'E']) {
        lexeme
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ConstraintError::BadNumber(lexeme.to_owned()))
    } else {
        lexeme
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ConstraintError::BadNumber(lexeme.to_owned()))
    }
}

impl Expr {
    fn eval(&self, row: &Row) -> Value {
        match self {
            Expr::Const(v) => v.clone(),
            Expr::Col(dbname) => row.get(dbname).cloned().unwrap_or(Value::Null),
            Expr::Now => Value::Timestamp(Utc::now().naive_utc()),
            Expr::Neg(inner) => match inner.eval(row) {
                Value::Int(i) => Value::Int(-i),
                Value::Float(f) => Value::Float(-f),
                _ => Value::Null,
            },
            Expr::Arith(op, a, b) => arith(*op, a.eval(row), b.eval(row)),
            Expr::Concat(a, b) => {
                let (a, b) = (a.eval(row), b.eval(row));
                if a.is_null() || b.is_null() {
                    Value::Null
                } else {
                    Value::Str(format!("{a}{b}"))
                }
            }
        }
    }
}

fn arith(op: ArithOp, a: Value, b: Value) -> Value {
    if let (Value::Int(x), Value::Int(y)) = (&a, &b) {
        let (x, y) = (*x, *y);
        let result = match op {
            ArithOp::Add => x.checked_add(y),
            ArithOp::Sub => x.checked_sub(y),
            ArithOp::Mul => x.checked_mul(y),
            ArithOp::Div => x.checked_div(y),
        };
        return match result {
            Some(v) => Value::Int(v),
            // Overflow falls through to floats; integer division by
            // zero yields NULL below.
            None if op != ArithOp::Div => {
                arith(op, Value::Float(x as f64), Value::Float(y as f64))
            }
            None => Value::Null,
        };
    }
    let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
        return Value::Null;
    };
    match op {
        ArithOp::Add => Value::Float(x + y),
        ArithOp::Sub => Value::Float(x - y),
        ArithOp::Mul => Value::Float(x * y),
        ArithOp::Div => {
            if y == 0.0 {
                Value::Null
            } else {
                Value::Float(x / y)
            }
        }
    }
}

/// Orders two values, promoting integers against floats and parsing
/// strings against timestamps. `None` for nulls and mismatched types.
fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    use Value::*;
    match (a, b) {
        (Null, _) | (_, Null) => None,
        (Str(x), Str(y)) => Some(x.cmp(y)),
        (Timestamp(x), Timestamp(y)) => Some(x.cmp(y)),
        (Timestamp(x), Str(y)) => NaiveDateTime::parse_from_str(y, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| x.cmp(&dt)),
        (Str(x), Timestamp(y)) => NaiveDateTime::parse_from_str(x, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.cmp(y)),
        _ => a.as_f64().zip(b.as_f64()).and_then(|(x, y)| x.partial_cmp(&y)),
    }
}

fn cmp_tri(op: CmpOp, a: &Value, b: &Value) -> Tri {
    use std::cmp::Ordering::*;
    let Some(ord) = compare(a, b) else {
        return Tri::Unknown;
    };
    Tri::of(match op {
        CmpOp::Eq => ord == Equal,
        CmpOp::Ne => ord != Equal,
        CmpOp::Lt => ord == Less,
        CmpOp::Le => ord != Greater,
        CmpOp::Gt => ord == Greater,
        CmpOp::Ge => ord != Less,
    })
}

impl Pred {
    fn eval(&self, row: &Row) -> Tri {
        match self {
            Pred::Cmp(op, a, b) => cmp_tri(*op, &a.eval(row), &b.eval(row)),
            Pred::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let v = expr.eval(row);
                let ge = cmp_tri(CmpOp::Ge, &v, &low.eval(row));
                let le = cmp_tri(CmpOp::Le, &v, &high.eval(row));
                let t = ge.and(le);
                if *negated {
                    t.not()
                } else {
                    t
                }
            }
            Pred::In {
                expr,
                negated,
                list,
            } => {
                let v = expr.eval(row);
                let mut t = Tri::False;
                for item in list {
                    t = t.or(cmp_tri(CmpOp::Eq, &v, &item.eval(row)));
                    if t == Tri::True {
                        break;
                    }
                }
                if *negated {
                    t.not()
                } else {
                    t
                }
            }
            Pred::Like {
                expr,
                negated,
                pattern,
                escape,
            } => {
                let text = expr.eval(row);
                let pat = pattern.eval(row);
                let (Some(text), Some(pat)) = (text.as_str(), pat.as_str()) else {
                    return Tri::Unknown;
                };
                let esc = match escape {
                    None => None,
                    Some(e) => {
                        let v = e.eval(row);
                        let Some(s) = v.as_str() else {
                            return Tri::Unknown;
                        };
                        let mut cs = s.chars();
                        let (Some(c), None) = (cs.next(), cs.next()) else {
                            return Tri::Unknown;
                        };
                        Some(c)
                    }
                };
                let text: Vec<char> = text.chars().collect();
                let pat: Vec<char> = pat.chars().collect();
                let t = Tri::of(like_match(&text, &pat, esc));
                if *negated {
                    t.not()
                } else {
                    t
                }
            }
            Pred::IsNull { expr, negated } => Tri::of(expr.eval(row).is_null() != *negated),
            Pred::Not(inner) => inner.eval(row).not(),
            Pred::And(a, b) => a.eval(row).and(b.eval(row)),
            Pred::Or(a, b) => a.eval(row).or(b.eval(row)),
        }
    }
}

/// SQL LIKE: `%` matches any run, `_` one character, the escape
/// character forces the next pattern character to match literally.
fn like_match(text: &[char], pat: &[char], esc: Option<char>) -> bool {
    let Some(&c) = pat.first() else {
        return text.is_empty();
    };
    if Some(c) == esc {
        let Some(&lit) = pat.get(1) else {
            return false;
        };
        return text.first() == Some(&lit) && like_match(&text[1..], &pat[2..], esc);
    }
    match c {
        '%' => like_match(text, &pat[1..], esc) || (!text.is_empty() && like_match(&text[1..], pat, esc)),
        '_' => !text.is_empty() && like_match(&text[1..], &pat[1..], esc),
        _ => text.first() == Some(&c) && like_match(&text[1..], &pat[1..], esc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ConstraintParser;
    use skystream_core::Column;

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

    fn compiled(input: &str) -> CompiledConstraint {
        let node = ConstraintParser::new().parse(input).unwrap();
        node.compile(&table()).unwrap()
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn comparisons_promote_integers() {
        let p = compiled("a < 2.5");
        assert!(p.matches(&row(&[("a", Value::Int(2))])));
        assert!(!p.matches(&row(&[("a", Value::Int(3))])));
    }

    #[test]
    fn dbname_is_used_for_lookup() {
        let p = compiled("b = 7");
        assert!(p.matches(&row(&[("b_phys", Value::Int(7))])));
        assert!(!p.matches(&row(&[("b", Value::Int(7))])));
    }

    #[test]
    fn constant_column_compiles_to_its_value() {
        let p = compiled("mission = 'wise'");
        assert!(p.matches(&row(&[])));
    }

    #[test]
    fn unknown_column_is_reported() {
        let node = ConstraintParser::new().parse("nope = 1").unwrap();
        let err = node.compile(&table()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn null_never_matches_a_comparison() {
        let p = compiled("a = 1");
        assert!(!p.matches(&row(&[("a", Value::Null)])));
        let p = compiled("a != 1");
        assert!(!p.matches(&row(&[("a", Value::Null)])));
    }

    #[test]
    fn not_of_unknown_stays_unknown() {
        let p = compiled("NOT a = 1");
        assert!(!p.matches(&row(&[("a", Value::Null)])));
        assert!(p.matches(&row(&[("a", Value::Int(2))])));
    }

    #[test]
    fn or_short_circuits_around_null() {
        let p = compiled("a = 1 OR 1 = 1");
        assert!(p.matches(&row(&[("a", Value::Null)])));
    }

    #[test]
    fn is_null_is_two_valued() {
        let p = compiled("a IS NULL");
        assert!(p.matches(&row(&[("a", Value::Null)])));
        assert!(p.matches(&row(&[])));
        assert!(!p.matches(&row(&[("a", Value::Int(0))])));
        let p = compiled("a IS NOT NULL");
        assert!(p.matches(&row(&[("a", Value::Int(0))])));
    }

    #[test]
    fn between_and_in() {
        let p = compiled("a BETWEEN 1 AND 10");
        assert!(p.matches(&row(&[("a", Value::Float(5.5))])));
        assert!(!p.matches(&row(&[("a", Value::Int(11))])));
        let p = compiled("a NOT IN (1, 2, 3)");
        assert!(p.matches(&row(&[("a", Value::Int(4))])));
        assert!(!p.matches(&row(&[("a", Value::Int(2))])));
    }

    #[test]
    fn arithmetic_in_predicates() {
        let p = compiled("a * 2 + 1 = 7");
        assert!(p.matches(&row(&[("a", Value::Int(3))])));
        let p = compiled("a / 0 IS NULL");
        assert!(p.matches(&row(&[("a", Value::Int(3))])));
    }

    #[test]
    fn like_patterns() {
        let p = compiled("name LIKE 'w%_1'");
        assert!(p.matches(&row(&[("name", Value::Str("wise_b1".into()))])));
        assert!(!p.matches(&row(&[("name", Value::Str("w1".into()))])));
        let p = compiled(r"name LIKE '100\%' ESCAPE '\\'");
        assert!(p.matches(&row(&[("name", Value::Str("100%".into()))])));
        assert!(!p.matches(&row(&[("name", Value::Str("100x".into()))])));
    }

    #[test]
    fn concat_builds_strings() {
        let p = compiled("name || '!' = 'ab!'");
        assert!(p.matches(&row(&[("name", Value::Str("ab".into()))])));
    }

    #[test]
    fn timestamp_comparison() {
        let p = compiled("a >= TIMESTAMP '2010-06-01 00:00:00'");
        let dt = NaiveDateTime::parse_from_str("2010-07-04 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert!(p.matches(&row(&[("a", Value::Timestamp(dt))])));
    }
}
