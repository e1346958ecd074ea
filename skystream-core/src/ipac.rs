//! Reading and writing fixed-width IPAC ASCII tables.
//!
//! A table file holds optional comment lines starting with `\`, then
//! 1 to 4 header lines starting with `|` (column names, types, units,
//! null representations), then fixed-width data rows whose fields are
//! aligned with the header pipe separators.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{CoreError, Result};
use crate::value::{Row, Value};

/// Column data types understood by the reader. Header type tokens are
/// matched as prefixes of the canonical names, in declaration order,
/// so `dou` selects `double` and `datetime` falls through `date` to
/// `datetime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpacType {
    Char,
    Double,
    Date,
    DateTime,
    Float,
    Long,
    Integer,
    Real,
}

const TYPE_NAMES: [(&str, IpacType); 8] = [
    ("char", IpacType::Char),
    ("double", IpacType::Double),
    ("date", IpacType::Date),
    ("datetime", IpacType::DateTime),
    ("float", IpacType::Float),
    ("long", IpacType::Long),
    ("integer", IpacType::Integer),
    ("real", IpacType::Real),
];

impl IpacType {
    fn from_token(column: &str, token: Option<&str>) -> Result<IpacType> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(IpacType::Char),
        };
        TYPE_NAMES
            .iter()
            .find(|(name, _)| name.starts_with(token))
            .map(|&(_, t)| t)
            .ok_or_else(|| CoreError::IpacType {
                column: column.to_owned(),
                datatype: token.to_owned(),
            })
    }

    fn convert(self, column: &str, v: &str) -> Result<Value> {
        match self {
            IpacType::Char | IpacType::Date => Ok(Value::Str(v.to_owned())),
            IpacType::Double | IpacType::Float | IpacType::Real => v
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| type_mismatch(column, v, "a floating point number")),
            IpacType::Long | IpacType::Integer => v
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| type_mismatch(column, v, "an integer")),
            IpacType::DateTime => parse_datetime(v)
                .map(Value::Timestamp)
                .ok_or_else(|| type_mismatch(column, v, "a datetime")),
        }
    }
}

fn type_mismatch(column: &str, value: &str, expected: &'static str) -> CoreError {
    CoreError::TypeMismatch {
        column: column.to_owned(),
        value: value.to_owned(),
        expected,
    }
}

fn parse_datetime(v: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Metadata for one column of an IPAC ASCII table.
#[derive(Debug, Clone)]
pub struct IpacColumn {
    pub name: String,
    pub dtype: IpacType,
    pub unit: Option<String>,
    pub null: Option<String>,
    begin: usize,
    end: usize,
}

impl IpacColumn {
    fn get(&self, line: &str, row: &mut Row) -> Result<()> {
        let v = if self.begin >= line.len() {
            ""
        } else {
            line.get(self.begin..self.end.min(line.len()))
                .ok_or_else(|| CoreError::IpacFormat("non-ASCII data row".to_owned()))?
                .trim()
        };
        let value = if v.is_empty() || self.null.as_deref() == Some(v) {
            Value::Null
        } else {
            self.dtype.convert(&self.name, v)?
        };
        row.insert(self.name.clone(), value);
        Ok(())
    }
}

/// A reader over the data rows of an IPAC ASCII table.
#[derive(Debug)]
pub struct IpacReader<R> {
    input: R,
    columns: Vec<IpacColumn>,
    // first data row, consumed while scanning past the header
    pending: Option<String>,
}

impl IpacReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        IpacReader::new(BufReader::new(File::open(path)?))
    }
}

impl<R: BufRead> IpacReader<R> {
    pub fn new(mut input: R) -> Result<Self> {
        let mut hdr: Vec<String> = Vec::new();
        let mut pending = None;
        loop {
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.starts_with('\\') && hdr.is_empty() {
                continue;
            }
            if trimmed.starts_with('|') {
                hdr.push(trimmed.to_owned());
                continue;
            }
            // first data row
            if !trimmed.is_empty() {
                pending = Some(trimmed.to_owned());
            }
            break;
        }
        Self::finish_header(input, hdr, pending)
    }

    fn finish_header(input: R, hdr: Vec<String>, pending: Option<String>) -> Result<Self> {
        if hdr.is_empty() || hdr.len() > 4 {
            return Err(CoreError::IpacFormat(
                "expected between 1 and 4 header lines".to_owned(),
            ));
        }
        let pipes: Vec<Vec<usize>> = hdr
            .iter()
            .map(|l| l.match_indices('|').map(|(i, _)| i).collect())
            .collect();
        let p0 = &pipes[0];
        if p0.len() < 2 || !hdr[0].ends_with('|') {
            return Err(CoreError::IpacFormat(
                "header line is missing a column delimiter".to_owned(),
            ));
        }
        if !pipes.iter().all(|p| p == p0) {
            return Err(CoreError::IpacFormat(
                "column separators in header lines are not vertically aligned".to_owned(),
            ));
        }
        let tokens = |line: &str, a: usize, b: usize| -> Option<String> {
            let t = line.get(a + 1..b)?.trim_matches(|c: char| c.is_whitespace() || c == '-');
            Some(t.to_owned())
        };
        let mut columns = Vec::with_capacity(p0.len() - 1);
        for w in p0.windows(2) {
            let (a, b) = (w[0], w[1]);
            let name = tokens(&hdr[0], a, b)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| CoreError::IpacFormat("column has no name".to_owned()))?;
            let dtype_tok = hdr.get(1).and_then(|l| tokens(l, a, b));
            let unit = hdr.get(2).and_then(|l| tokens(l, a, b)).filter(|s| !s.is_empty());
            let null = hdr.get(3).and_then(|l| tokens(l, a, b)).filter(|s| !s.is_empty());
            let dtype = IpacType::from_token(&name, dtype_tok.as_deref())?;
            columns.push(IpacColumn {
                name,
                dtype,
                unit,
                null,
                begin: a,
                end: b,
            });
        }
        Ok(IpacReader {
            input,
            columns,
            pending,
        })
    }

    pub fn columns(&self) -> &[IpacColumn] {
        &self.columns
    }

    /// Reads the next data row, keyed by column name. `Ok(None)` at
    /// end of file.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let line = match self.pending.take() {
            Some(l) => l,
            None => {
                let mut line = String::new();
                loop {
                    line.clear();
                    if self.input.read_line(&mut line)? == 0 {
                        return Ok(None);
                    }
                    if !line.trim_end_matches(['\r', '\n']).is_empty() {
                        break;
                    }
                }
                line.trim_end_matches(['\r', '\n']).to_owned()
            }
        };
        let mut row = Row::default();
        for c in &self.columns {
            c.get(&line, &mut row)?;
        }
        Ok(Some(row))
    }
}

/// Writes the single-point query-position table handed to the chunk
/// index tool.
pub fn write_pos_file(path: &Path, theta: f64, phi: f64) -> Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "|{:<24}|{:<24}|", "ra", "dec")?;
    writeln!(f, "|{:<24}|{:<24}|", "double", "double")?;
    writeln!(f, "|{:<24}|{:<24}|", "deg", "deg")?;
    writeln!(f, "|{:<24}|{:<24}|", "", "")?;
    writeln!(f, " {:<24} {:<24} ", theta, phi)?;
    Ok(())
}
