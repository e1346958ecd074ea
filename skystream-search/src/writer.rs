//! Output writer contract.
//!
//! Streaming only depends on three operations: open emits a header for
//! a column list, write emits one row (with computed position columns
//! supplied separately) and close emits any trailer. Writers append to
//! a caller-owned buffer so the stream controls batching.

use skystream_core::{Column, Row, Value};

use crate::error::Result;

pub trait TableWriter {
    fn open(&mut self, out: &mut Vec<u8>, columns: &[Column]) -> Result<()>;
    fn write(&mut self, out: &mut Vec<u8>, row: &Row, computed: &Row) -> Result<()>;
    fn close(&mut self, out: &mut Vec<u8>) -> Result<()>;
}

/// Comma separated output with a header line of column names.
#[derive(Debug, Default)]
pub struct CsvWriter {
    columns: Vec<Column>,
}

impl CsvWriter {
    pub fn new() -> CsvWriter {
        CsvWriter::default()
    }
}

fn push_field(line: &mut String, value: &str) {
    if value.contains([',', '"', '\n']) {
        line.push('"');
        line.push_str(&value.replace('"', "\"\""));
        line.push('"');
    } else {
        line.push_str(value);
    }
}

impl TableWriter for CsvWriter {
    fn open(&mut self, out: &mut Vec<u8>, columns: &[Column]) -> Result<()> {
        self.columns = columns.to_vec();
        let mut line = String::new();
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            push_field(&mut line, &c.name);
        }
        line.push('\n');
        out.extend_from_slice(line.as_bytes());
        Ok(())
    }

    fn write(&mut self, out: &mut Vec<u8>, row: &Row, computed: &Row) -> Result<()> {
        let mut line = String::new();
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            let value = if c.computed {
                computed.get(&c.name)
            } else {
                c.get(row)
            };
            match value {
                None | Some(Value::Null) => {}
                Some(v) => push_field(&mut line, &v.to_string()),
            }
        }
        line.push('\n');
        out.extend_from_slice(line.as_bytes());
        Ok(())
    }

    fn close(&mut self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_rows_and_quoting() {
        let columns = vec![Column::new("id"), Column::new("name")];
        let mut w = CsvWriter::new();
        let mut out = Vec::new();
        w.open(&mut out, &columns).unwrap();
        let row: Row = [
            ("id".to_owned(), Value::Int(7)),
            ("name".to_owned(), Value::Str("a,\"b\"".into())),
        ]
        .into_iter()
        .collect();
        w.write(&mut out, &row, &Row::default()).unwrap();
        w.close(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,name\n7,\"a,\"\"b\"\"\"\n"
        );
    }

    #[test]
    fn computed_columns_read_the_computed_row() {
        let columns = vec![Column::computed_position("ra1")];
        let mut w = CsvWriter::new();
        let mut out = Vec::new();
        w.open(&mut out, &columns).unwrap();
        let computed: Row = [("ra1".to_owned(), Value::Float(12.5))].into_iter().collect();
        w.write(&mut out, &Row::default(), &computed).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("12.5\n"));
    }

    #[test]
    fn nulls_are_empty_fields() {
        let columns = vec![Column::new("a"), Column::new("b")];
        let mut w = CsvWriter::new();
        let mut out = Vec::new();
        w.open(&mut out, &columns).unwrap();
        let row: Row = [("b".to_owned(), Value::Int(1))].into_iter().collect();
        w.write(&mut out, &row, &Row::default()).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with(",1\n"));
    }
}
