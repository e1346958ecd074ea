//! Batched result streaming.
//!
//! A [`ResultStream`] pulls candidate rows from the chunk index match
//! file, applies the exact spatial test for the requested mode and
//! hands accepted rows to the writer. Output is produced as a finite
//! sequence of byte batches, flushed every 1024 accepted rows, so
//! memory stays bounded regardless of result size. The scratch
//! workspace is removed when the stream is exhausted and, via the temp
//! directory guard, when the stream is dropped early.

use std::io::BufRead;

use tempfile::TempDir;
use tracing::warn;

use skystream_core::{Column, IpacReader, Row, Table, TanWcs, Value};
use skystream_geom::SphericalConvexPolygon;

use crate::error::{Result, SearchError};
use crate::region::{corners_to_polygon, make_rectangle};
use crate::writer::TableWriter;

// operate on 1024 rows at a time
const MASK: u64 = 1024 - 1;

/// Exact spatial test applied to candidate footprints in region mode.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RegionTest {
    Overlaps,
    Covers,
    Enclosed,
}

#[derive(Debug)]
pub(crate) enum Mode {
    Region {
        s1: f64,
        s2: f64,
        test: RegionTest,
        region: Option<SphericalConvexPolygon>,
    },
    Point {
        point: (f64, f64),
    },
    MostCentered {
        finder: MostCenteredFinder,
        point: (f64, f64),
    },
}

#[derive(Debug)]
enum State {
    Header,
    Rows,
    Done,
}

#[derive(Debug)]
pub struct ResultStream<'a, R, W> {
    table: &'a Table,
    writer: W,
    columns: Vec<Column>,
    reader: Option<IpacReader<R>>,
    mode: Mode,
    workspace: Option<TempDir>,
    state: State,
    in_row_id: Option<Value>,
    n_rows: u64,
    buf: Vec<u8>,
}

impl<'a, R: BufRead, W: TableWriter> ResultStream<'a, R, W> {
    pub(crate) fn new(
        table: &'a Table,
        writer: W,
        columns: Vec<Column>,
        reader: IpacReader<R>,
        mode: Mode,
        workspace: Option<TempDir>,
    ) -> Self {
        ResultStream {
            table,
            writer,
            columns,
            reader: Some(reader),
            mode,
            workspace,
            state: State::Header,
            in_row_id: None,
            n_rows: 0,
            buf: Vec::new(),
        }
    }

    /// A stream carrying only a header, for searches known up front to
    /// have no matches.
    pub(crate) fn empty(table: &'a Table, writer: W, columns: Vec<Column>) -> Self {
        ResultStream {
            table,
            writer,
            columns,
            reader: None,
            mode: Mode::Point { point: (0.0, 0.0) },
            workspace: None,
            state: State::Header,
            in_row_id: None,
            n_rows: 0,
            buf: Vec::new(),
        }
    }

    /// Produces the next output batch, or `None` once the stream is
    /// exhausted. The first batch is the writer's header.
    pub fn next_batch(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match self.state {
                State::Header => {
                    self.writer.open(&mut self.buf, &self.columns)?;
                    self.state = State::Rows;
                    if !self.buf.is_empty() {
                        return Ok(Some(std::mem::take(&mut self.buf)));
                    }
                }
                State::Rows => return self.pump(),
                State::Done => return Ok(None),
            }
        }
    }

    /// Reads rows until a batch boundary or the end of input.
    fn pump(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            let next = match self.reader.as_mut() {
                Some(reader) => reader.next_row()?,
                None => None,
            };
            let Some(row) = next else {
                return self.finish();
            };
            if let Some(batch) = self.accept(row)? {
                return Ok(Some(batch));
            }
        }
    }

    /// Applies the mode's spatial test to one candidate row. Returns a
    /// batch when the row filled it.
    fn accept(&mut self, row: Row) -> Result<Option<Vec<u8>>> {
        let id = row.get("in_row_id").cloned().unwrap_or(Value::Null);
        let new_point = self.in_row_id.as_ref() != Some(&id);
        // A full batch from a most-centered flush is returned only
        // after the row that triggered it has been recorded.
        let mut pending = None;
        if new_point {
            pending = self.roll_over(&row, id)?;
        }
        match &mut self.mode {
            Mode::Region { test, region, .. } => {
                let Some(region) = region else {
                    return Err(SearchError::MatchFile("missing query region".to_owned()));
                };
                let computed = self.table.compute_row(&row, None)?;
                let poly = candidate_polygon(self.table, &row, &computed)?;
                let ok = match test {
                    RegionTest::Overlaps => poly.intersects_polygon(region),
                    RegionTest::Covers => poly.contains_polygon(region),
                    RegionTest::Enclosed => region.contains_polygon(&poly),
                };
                if !ok {
                    return Ok(pending);
                }
                self.n_rows += 1;
                self.writer.write(&mut self.buf, &row, &computed)?;
            }
            Mode::Point { point } => {
                let wcs = self.table.make_wcs(&row)?;
                let computed = self.table.compute_row(&row, Some(&wcs))?;
                let Ok((x, y)) = wcs.sky_to_pixel(point.0, point.1) else {
                    return Ok(pending);
                };
                if !wcs.interior(x, y) {
                    return Ok(pending);
                }
                self.n_rows += 1;
                self.writer.write(&mut self.buf, &row, &computed)?;
            }
            Mode::MostCentered { finder, point } => {
                finder.add(self.table, row, *point)?;
                return Ok(pending);
            }
        }
        if pending.is_some() {
            return Ok(pending);
        }
        if self.n_rows & MASK == 0 && !self.buf.is_empty() {
            return Ok(Some(std::mem::take(&mut self.buf)));
        }
        Ok(None)
    }

    /// Handles a change of query point: rebuilds the region or point
    /// from the `in_` columns and, in most-centered mode, flushes the
    /// finished groups.
    fn roll_over(&mut self, row: &Row, id: Value) -> Result<Option<Vec<u8>>> {
        self.in_row_id = Some(id);
        let theta = in_f64(row, "in_ra")?;
        let phi = in_f64(row, "in_dec")?;
        match &mut self.mode {
            Mode::Region { s1, s2, region, .. } => {
                *region = Some(make_rectangle(theta, phi, *s1, *s2)?);
                Ok(None)
            }
            Mode::Point { point } => {
                *point = (theta, phi);
                Ok(None)
            }
            Mode::MostCentered { finder, point } => {
                *point = (theta, phi);
                let nw = finder.flush(self.table, &mut self.writer, &mut self.buf)?;
                let boundary = (self.n_rows & MASK) + nw > MASK && !self.buf.is_empty();
                self.n_rows += nw;
                if boundary {
                    Ok(Some(std::mem::take(&mut self.buf)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// End of input: flush pending state, close the writer and remove
    /// the scratch workspace.
    fn finish(&mut self) -> Result<Option<Vec<u8>>> {
        if let Mode::MostCentered { finder, .. } = &mut self.mode {
            let nw = finder.flush(self.table, &mut self.writer, &mut self.buf)?;
            self.n_rows += nw;
        }
        self.writer.close(&mut self.buf)?;
        self.reader = None;
        self.state = State::Done;
        if let Some(workspace) = self.workspace.take() {
            if let Err(err) = workspace.close() {
                warn!(error = %err, "failed to remove scratch directory");
            }
        }
        if self.buf.is_empty() {
            Ok(None)
        } else {
            Ok(Some(std::mem::take(&mut self.buf)))
        }
    }

    /// Rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.n_rows
    }
}

fn in_f64(row: &Row, name: &str) -> Result<f64> {
    row.get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| SearchError::MatchFile(format!("missing or non-numeric {name} column")))
}

/// Builds a candidate's footprint polygon from its corner columns,
/// reading stored corners from the row and computed corners from the
/// computed row.
fn candidate_polygon(
    table: &Table,
    row: &Row,
    computed: &Row,
) -> Result<SphericalConvexPolygon> {
    let corners = table
        .corners()
        .ok_or_else(|| SearchError::NotSpatial(table.id().to_owned()))?;
    let mut pairs = [(0.0, 0.0); 4];
    for i in 0..4 {
        let (ra_name, dec_name) = (&corners.columns[2 * i], &corners.columns[2 * i + 1]);
        pairs[i] = if corners.computed {
            (
                computed_f64(computed, ra_name)?,
                computed_f64(computed, dec_name)?,
            )
        } else {
            (
                table.f64_value(row, ra_name)?,
                table.f64_value(row, dec_name)?,
            )
        };
    }
    corners_to_polygon(pairs)
}

fn computed_f64(computed: &Row, name: &str) -> Result<f64> {
    computed
        .get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| SearchError::MatchFile(format!("missing computed column {name}")))
}

/// Retains, per image set, the most centered candidate: the row whose
/// query point lies deepest inside the image in pixel space. Rows
/// where the point falls outside the image are skipped. Ties keep the
/// first row encountered.
#[derive(Debug)]
pub(crate) struct MostCenteredFinder {
    /// Physical names of the image set key columns; empty means all
    /// rows form one group.
    image_set: Vec<String>,
    groups: Vec<Group>,
}

#[derive(Debug)]
struct Group {
    key: Vec<Value>,
    row: Row,
    wcs: TanWcs,
    edge_dist: f64,
}

impl MostCenteredFinder {
    pub(crate) fn new(table: &Table) -> MostCenteredFinder {
        let image_set = table
            .image_set()
            .iter()
            .filter_map(|name| table.column(name))
            .map(|c| c.dbname.clone())
            .collect();
        MostCenteredFinder {
            image_set,
            groups: Vec::new(),
        }
    }

    fn add(&mut self, table: &Table, row: Row, point: (f64, f64)) -> Result<()> {
        let wcs = table.make_wcs(&row)?;
        let Ok((x, y)) = wcs.sky_to_pixel(point.0, point.1) else {
            return Ok(());
        };
        let Some(edge_dist) = wcs.edge_distance(x, y) else {
            return Ok(());
        };
        let key: Vec<Value> = self
            .image_set
            .iter()
            .map(|name| row.get(name).cloned().unwrap_or(Value::Null))
            .collect();
        match self.groups.iter_mut().find(|g| g.key == key) {
            Some(group) => {
                if edge_dist > group.edge_dist {
                    group.row = row;
                    group.wcs = wcs;
                    group.edge_dist = edge_dist;
                }
            }
            None => self.groups.push(Group {
                key,
                row,
                wcs,
                edge_dist,
            }),
        }
        Ok(())
    }

    fn flush<W: TableWriter>(
        &mut self,
        table: &Table,
        writer: &mut W,
        out: &mut Vec<u8>,
    ) -> Result<u64> {
        let mut n = 0;
        for group in self.groups.drain(..) {
            let computed = table.compute_row(&group.row, Some(&group.wcs))?;
            writer.write(out, &group.row, &computed)?;
            n += 1;
        }
        Ok(n)
    }
}
