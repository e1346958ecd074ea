//! Search orchestration.
//!
//! Validates the request against the table description, assembles the
//! column projection, runs the chunk index pre-filter and hands the
//! match file to a [`ResultStream`] for exact filtering. The scratch
//! workspace holding the query point and match files lives exactly as
//! long as the stream.

use std::fs::File;
use std::io::BufReader;

use tracing::{debug, warn};

use skystream_constraint::{ConstraintNode, ConstraintParser};
use skystream_core::{ipac, Column, IpacReader, Table};

use crate::chunk_index::ChunkIndexBridge;
use crate::error::{Result, SearchError};
use crate::request::{Intersect, SearchRequest};
use crate::stream::{Mode, MostCenteredFinder, RegionTest, ResultStream};
use crate::writer::TableWriter;

pub type FileStream<'a, W> = ResultStream<'a, BufReader<File>, W>;

enum Plan {
    Region(RegionTest),
    Point,
    MostCentered,
}

/// Performs a spatial query with at most one spatial constraint
/// (a rectangular region or a point) plus an optional relational
/// constraint.
pub fn search<'a, W: TableWriter>(
    table: &'a Table,
    bridge: &ChunkIndexBridge,
    request: &SearchRequest,
    writer: W,
) -> Result<FileStream<'a, W>> {
    debug!(
        table = table.id(),
        pos = ?request.pos,
        size = ?request.size,
        intersect = request.intersect.as_str(),
        most_centered = request.most_centered,
        "search"
    );
    let columns = select_columns(table, request.columns.as_deref())?;
    let where_ast = build_where(table, request)?;

    let Some((ra, dec)) = request.pos else {
        return Err(SearchError::NoConstraint);
    };
    if table.wcs_columns().is_none() {
        return Err(SearchError::NotImageTable(table.id().to_owned()));
    }
    let (Some(corners), Some(chunk)) = (table.corners(), table.chunk_index()) else {
        return Err(SearchError::NotSpatial(table.id().to_owned()));
    };

    let dbnames = assemble_dbnames(table, &columns, request.most_centered);

    let (s1, s2) = request.size;
    let point_search = (s1 == 0.0 && s2 == 0.0) || request.intersect == Intersect::Center;
    let plan = match (point_search, request.intersect) {
        // a point never encloses an image
        (true, Intersect::Enclosed) => {
            return Ok(ResultStream::empty(table, writer, columns));
        }
        (true, _) if request.most_centered => Plan::MostCentered,
        (true, _) => Plan::Point,
        (false, Intersect::Covers) => Plan::Region(RegionTest::Covers),
        (false, Intersect::Enclosed) => Plan::Region(RegionTest::Enclosed),
        (false, _) => Plan::Region(RegionTest::Overlaps),
    };
    let mut search_rad = corners.radius;
    if !point_search {
        search_rad += (0.25 * (s1 * s1 + s2 * s2)).sqrt();
    }
    if search_rad > chunk.max_radius {
        return Err(SearchError::RegionTooLarge(chunk.max_radius - corners.radius));
    }

    // scratch workspace for the query point and match files
    let workspace = tempfile::tempdir()?;
    let pos_file = workspace.path().join("pos.tbl");
    let match_file = workspace.path().join("match.tbl");
    ipac::write_pos_file(&pos_file, ra, dec)?;
    let rendered = match &where_ast {
        Some(w) => Some(w.render(table)?),
        None => None,
    };
    let matches = bridge.query(
        chunk,
        &pos_file,
        &match_file,
        search_rad,
        &dbnames,
        rendered.as_deref(),
    )?;
    debug!(matches, "chunk index pre-filter complete");

    let reader = IpacReader::open(&match_file)?;
    let mut all_columns = input_columns(&reader);
    all_columns.extend(columns.iter().cloned());
    if matches == 0 {
        if let Err(err) = workspace.close() {
            warn!(error = %err, "failed to remove scratch directory");
        }
        return Ok(ResultStream::empty(table, writer, all_columns));
    }

    let mode = match plan {
        Plan::Region(test) => Mode::Region {
            s1,
            s2,
            test,
            region: None,
        },
        Plan::MostCentered => Mode::MostCentered {
            finder: MostCenteredFinder::new(table),
            point: (0.0, 0.0),
        },
        Plan::Point => Mode::Point { point: (0.0, 0.0) },
    };
    Ok(ResultStream::new(
        table,
        writer,
        all_columns,
        reader,
        mode,
        Some(workspace),
    ))
}

/// Resolves the caller's column selection, defaulting to the table's
/// principal columns.
fn select_columns(table: &Table, requested: Option<&[String]>) -> Result<Vec<Column>> {
    let Some(requested) = requested else {
        return Ok(table.principal_columns().cloned().collect());
    };
    let mut columns = Vec::new();
    for name in requested {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let column = table
            .column(name)
            .ok_or_else(|| SearchError::NoSuchColumn {
                column: name.to_owned(),
                table: table.id().to_owned(),
            })?;
        if !column.selectable {
            return Err(SearchError::NotSelectable {
                column: name.to_owned(),
                table: table.id().to_owned(),
            });
        }
        columns.push(column.clone());
    }
    Ok(columns)
}

/// Parses and merges the relational constraints, then checks every
/// referenced column against the table.
fn build_where(table: &Table, request: &SearchRequest) -> Result<Option<ConstraintNode>> {
    let mut where_ast = request.refby.clone();
    if let Some(text) = &request.where_clause {
        if text.trim().is_empty() {
            return Err(SearchError::EmptyWhere);
        }
        let parsed = ConstraintParser::new()
            .parse(text)
            .map_err(SearchError::InvalidWhere)?;
        where_ast = Some(match where_ast {
            None => parsed,
            Some(refby) => ConstraintNode::And(Box::new(refby), Box::new(parsed)),
        });
    }
    if let Some(w) = &where_ast {
        for name in w.extract_cols() {
            let Some(column) = table.column(&name) else {
                return Err(SearchError::NoSuchConstraintColumn {
                    column: name,
                    table: table.id().to_owned(),
                });
            };
            if !column.queryable {
                return Err(SearchError::NotQueryable {
                    column: name,
                    table: table.id().to_owned(),
                });
            }
        }
    }
    Ok(where_ast)
}

/// Physical columns to pull out of the chunk index: the selected
/// stored columns, then the WCS columns, stored corners and center,
/// and in most-centered mode the image set key columns.
fn assemble_dbnames(table: &Table, columns: &[Column], most_centered: bool) -> Vec<String> {
    let mut dbnames: Vec<String> = columns
        .iter()
        .filter(|c| !(c.computed || c.constant.is_some()))
        .map(|c| c.dbname.clone())
        .collect();
    let mut push = |dbnames: &mut Vec<String>, name: &str| {
        if let Some(c) = table.column(name) {
            if c.constant.is_none() && !dbnames.contains(&c.dbname) {
                dbnames.push(c.dbname.clone());
            }
        }
    };
    if let Some(wcs) = table.wcs_columns() {
        for name in wcs.names() {
            push(&mut dbnames, name);
        }
    }
    if let Some(corners) = table.corners() {
        if !corners.computed {
            for name in &corners.columns {
                push(&mut dbnames, name);
            }
        }
    }
    if let Some(center) = table.center() {
        if !center.computed {
            for name in &center.columns {
                push(&mut dbnames, name);
            }
        }
    }
    if most_centered {
        for name in table.image_set() {
            push(&mut dbnames, name);
        }
    }
    dbnames
}

fn input_columns<R: std::io::BufRead>(reader: &IpacReader<R>) -> Vec<Column> {
    reader
        .columns()
        .iter()
        .filter(|c| c.name.starts_with("in_"))
        .map(|c| {
            let mut col = Column::new(c.name.clone());
            if let Some(unit) = &c.unit {
                col = col.unit(unit.clone());
            }
            col
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use skystream_core::{ChunkIndexSpec, ScaleColumns, Value, WcsColumns};

    use super::*;
    use crate::writer::CsvWriter;

    fn test_table(max_radius: f64) -> Table {
        let columns = vec![
            Column::new("id").principal(),
            Column::new("secret"),
            Column::new("ctype1").constant(Value::Str("RA---TAN".into())),
            Column::new("ctype2").constant(Value::Str("DEC--TAN".into())),
            Column::new("naxis1"),
            Column::new("naxis2"),
            Column::new("crpix1"),
            Column::new("crpix2"),
            Column::new("crval1"),
            Column::new("crval2"),
            Column::new("cdelt1").constant(Value::Float(-0.001)),
            Column::new("cdelt2").constant(Value::Float(0.001)),
        ];
        let chunk = ChunkIndexSpec {
            path: PathBuf::from("/data/test/index.ci"),
            max_radius,
            columns: ["id", "crval1", "crval2", "naxis1", "naxis2", "crpix1", "crpix2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        Table::new("test.images", columns)
            .unwrap()
            .with_wcs(WcsColumns {
                ctype1: "ctype1".into(),
                ctype2: "ctype2".into(),
                naxis1: "naxis1".into(),
                naxis2: "naxis2".into(),
                crpix1: "crpix1".into(),
                crpix2: "crpix2".into(),
                crval1: "crval1".into(),
                crval2: "crval2".into(),
                scale: ScaleColumns::CdeltRot {
                    cdelt1: "cdelt1".into(),
                    cdelt2: "cdelt2".into(),
                    crota2: None,
                },
            })
            .unwrap()
            .with_corners(0.1)
            .unwrap()
            .with_center()
            .unwrap()
            .with_chunk_index(chunk)
            .unwrap()
    }

    fn drain<W: TableWriter>(mut stream: FileStream<'_, W>) -> String {
        let mut out = Vec::new();
        while let Some(batch) = stream.next_batch().unwrap() {
            out.extend_from_slice(&batch);
        }
        String::from_utf8(out).unwrap()
    }

    fn fake_assoc(dir: &Path, body: &str) -> ChunkIndexBridge {
        let script = dir.join("assoc");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        ChunkIndexBridge::with_binary(&script)
    }

    fn point_request(ra: f64, dec: f64) -> SearchRequest {
        SearchRequest {
            pos: Some((ra, dec)),
            ..SearchRequest::default()
        }
    }

    #[test]
    fn missing_pos_is_rejected() {
        let table = test_table(0.5);
        let err = search(
            &table,
            &ChunkIndexBridge::new(),
            &SearchRequest::default(),
            CsvWriter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::NoConstraint));
    }

    #[test]
    fn unknown_and_unselectable_columns_are_rejected() {
        let table = test_table(0.5);
        let mut req = point_request(10.0, 20.0);
        req.columns = Some(vec!["nope".into()]);
        let err = search(&table, &ChunkIndexBridge::new(), &req, CsvWriter::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Column nope does not exist in table test.images"
        );
        // secret is not recorded in the chunk index, so it was demoted
        req.columns = Some(vec!["secret".into()]);
        let err = search(&table, &ChunkIndexBridge::new(), &req, CsvWriter::new()).unwrap_err();
        assert!(err.to_string().contains("is not selectable"));
    }

    #[test]
    fn where_clause_validation() {
        let table = test_table(0.5);
        let mut req = point_request(10.0, 20.0);
        req.where_clause = Some("  ".into());
        let err = search(&table, &ChunkIndexBridge::new(), &req, CsvWriter::new()).unwrap_err();
        assert!(matches!(err, SearchError::EmptyWhere));

        req.where_clause = Some("id === 3".into());
        let err = search(&table, &ChunkIndexBridge::new(), &req, CsvWriter::new()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid WHERE clause:"));

        req.where_clause = Some("nope = 3".into());
        let err = search(&table, &ChunkIndexBridge::new(), &req, CsvWriter::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Table test.images does not contain a column named nope."
        );

        req.where_clause = Some("secret = 3".into());
        let err = search(&table, &ChunkIndexBridge::new(), &req, CsvWriter::new()).unwrap_err();
        assert!(err.to_string().contains("not allowed to participate"));
    }

    #[test]
    fn oversized_region_reports_the_remaining_radius() {
        let table = test_table(0.5);
        let mut req = point_request(10.0, 20.0);
        req.size = (2.0, 2.0);
        let err = search(&table, &ChunkIndexBridge::new(), &req, CsvWriter::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Search region is too large - the maximum region bounding circle radius is 0.4 deg"
        );
    }

    #[test]
    fn enclosed_by_a_point_yields_an_empty_table() {
        let table = test_table(0.5);
        let mut req = point_request(10.0, 20.0);
        req.intersect = Intersect::Enclosed;
        let stream = search(&table, &ChunkIndexBridge::new(), &req, CsvWriter::new()).unwrap();
        let text = drain(stream);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("id"));
    }

    #[test]
    fn chunk_index_error_aborts_the_search() {
        let table = test_table(0.5);
        let dir = tempfile::tempdir().unwrap();
        let bridge = fake_assoc(dir.path(), r#"echo '{"stat":"ERROR","msg":"disk full"}'"#);
        let err = search(&table, &bridge, &point_request(10.0, 20.0), CsvWriter::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn zero_matches_yield_a_header_with_input_columns() {
        let table = test_table(0.5);
        let dir = tempfile::tempdir().unwrap();
        let header = format!(
            "|{0:<20}|{1:<20}|{2:<20}|\\n|{3:<20}|{4:<20}|{4:<20}|",
            "in_row_id", "in_ra", "in_dec", "long", "double"
        );
        let body = format!(
            "printf '{header}\\n' > \"$7\"\necho '{{\"stat\":\"OK\",\"msg\":\"\",\"props\":{{\"num-recorded-matches\":0}}}}'"
        );
        let bridge = fake_assoc(dir.path(), &body);
        let stream = search(&table, &bridge, &point_request(10.0, 20.0), CsvWriter::new()).unwrap();
        let text = drain(stream);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("in_row_id,in_ra,in_dec,id"));
    }

    #[test]
    fn point_search_end_to_end() {
        let table = test_table(0.5);
        let dir = tempfile::tempdir().unwrap();
        // two candidates: "near" covers the query point, "far" does not
        let names = [
            "in_row_id", "in_ra", "in_dec", "id", "naxis1", "naxis2", "crpix1", "crpix2",
            "crval1", "crval2",
        ];
        let types = [
            "long", "double", "double", "char", "double", "double", "double", "double",
            "double", "double",
        ];
        let rows = [
            ["1", "10.0", "20.0", "near", "100", "100", "50.5", "50.5", "10.0", "20.0"],
            ["1", "10.0", "20.0", "far", "100", "100", "50.5", "50.5", "10.0", "21.0"],
        ];
        let mut content = String::new();
        for line in [&names, &types] {
            content.push('|');
            for f in line {
                content.push_str(&format!("{f:<20}|"));
            }
            content.push('\n');
        }
        for row in &rows {
            content.push(' ');
            for f in row {
                content.push_str(&format!("{f:<20} "));
            }
            content.push('\n');
        }
        let content_path = dir.path().join("content.tbl");
        std::fs::write(&content_path, content).unwrap();
        let body = format!(
            "cp {} \"$7\"\necho '{{\"stat\":\"OK\",\"msg\":\"\",\"props\":{{\"num-recorded-matches\":2}}}}'",
            content_path.display()
        );
        let bridge = fake_assoc(dir.path(), &body);
        let stream = search(&table, &bridge, &point_request(10.0, 20.0), CsvWriter::new()).unwrap();
        let text = drain(stream);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "output was: {text}");
        assert!(lines[1].contains("near"));
    }
}
