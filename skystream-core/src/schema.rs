//! Immutable descriptions of image metadata tables.
//!
//! A `Table` records the logical columns of a catalog table along with
//! the declarations that drive spatial search: the chunk index backing
//! the table, the image corner and center columns (stored in the table
//! or computed through the per-row astrometric transform), the WCS
//! parameter columns, and the image-set grouping columns.

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::error::{CoreError, Result};
use crate::value::{Row, Value};
use crate::wcs::{ScaleColumns, TanWcs, WcsColumns};

const CORNER_NAMES: [&str; 8] = ["ra1", "dec1", "ra2", "dec2", "ra3", "dec3", "ra4", "dec4"];
const CENTER_NAMES: [&str; 2] = ["ra", "dec"];

/// A logical column in a table.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub dbname: String,
    pub selectable: bool,
    pub principal: bool,
    pub queryable: bool,
    pub nullable: bool,
    pub computed: bool,
    pub constant: Option<Value>,
    pub unit: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Column {
        let name = name.into();
        Column {
            dbname: name.clone(),
            name,
            selectable: true,
            principal: false,
            queryable: true,
            nullable: false,
            computed: false,
            constant: None,
            unit: None,
        }
    }

    pub fn dbname(mut self, dbname: impl Into<String>) -> Column {
        self.dbname = dbname.into();
        self
    }

    pub fn principal(mut self) -> Column {
        self.principal = true;
        self
    }

    pub fn unselectable(mut self) -> Column {
        self.selectable = false;
        self.queryable = false;
        self
    }

    pub fn unqueryable(mut self) -> Column {
        self.queryable = false;
        self
    }

    pub fn nullable(mut self) -> Column {
        self.nullable = true;
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Column {
        self.unit = Some(unit.into());
        self
    }

    /// Marks the column constant. Constant columns are neither
    /// selectable nor queryable and are resolved without a row.
    pub fn constant(mut self, value: Value) -> Column {
        self.constant = Some(value);
        self.selectable = false;
        self.queryable = false;
        self
    }

    /// A synthetic corner or center column whose value is computed from
    /// the row's astrometric transform rather than stored.
    pub fn computed_position(name: &str) -> Column {
        let mut c = Column::new(name);
        c.computed = true;
        c.principal = true;
        c.queryable = false;
        c.unit = Some("deg".to_owned());
        c
    }

    /// The value of this column for the given row: the constant value
    /// for constant columns, the row value keyed by database name
    /// otherwise.
    pub fn get<'a>(&'a self, row: &'a Row) -> Option<&'a Value> {
        match &self.constant {
            Some(v) => Some(v),
            None => row.get(&self.dbname),
        }
    }
}

/// Location and limits of the chunk index file backing a table.
#[derive(Debug, Clone)]
pub struct ChunkIndexSpec {
    pub path: PathBuf,
    /// Maximum search radius (deg) the index supports.
    pub max_radius: f64,
    /// Database column names recorded in the index. The first column
    /// is the row id, followed by the two position columns.
    pub columns: Vec<String>,
}

/// The corner columns of an image metadata table, stored or computed.
#[derive(Debug, Clone)]
pub struct CornersSpec {
    /// Bounding circle radius (deg) for images in the table.
    pub radius: f64,
    pub computed: bool,
    /// Logical names of the 8 corner columns, longitude first.
    pub columns: [String; 8],
}

/// The image center columns, stored or computed.
#[derive(Debug, Clone)]
pub struct CenterSpec {
    pub computed: bool,
    pub columns: [String; 2],
}

/// An immutable description of an image metadata table.
#[derive(Debug, Clone)]
pub struct Table {
    id: String,
    columns: Vec<Column>,
    by_name: FxHashMap<String, usize>,
    by_dbname: FxHashMap<String, usize>,
    chunk_index: Option<ChunkIndexSpec>,
    corners: Option<CornersSpec>,
    center: Option<CenterSpec>,
    image_set: Vec<String>,
    wcs: Option<WcsColumns>,
}

impl Table {
    pub fn new(id: impl Into<String>, columns: Vec<Column>) -> Result<Table> {
        let id = id.into();
        let mut by_name = FxHashMap::default();
        let mut by_dbname = FxHashMap::default();
        for (i, c) in columns.iter().enumerate() {
            if (c.queryable || c.principal) && !c.selectable {
                return Err(CoreError::BadConstant(c.name.clone()));
            }
            if by_name.insert(c.name.clone(), i).is_some() {
                return Err(CoreError::DuplicateColumn(c.name.clone()));
            }
            if c.constant.is_none() && by_dbname.insert(c.dbname.clone(), i).is_some() {
                return Err(CoreError::DuplicateColumn(c.dbname.clone()));
            }
        }
        Ok(Table {
            id,
            columns,
            by_name,
            by_dbname,
            chunk_index: None,
            corners: None,
            center: None,
            image_set: Vec::new(),
            wcs: None,
        })
    }

    /// Attaches the chunk index backing this table. Stored columns not
    /// recorded in the index become unselectable, since their values
    /// cannot appear in candidate files.
    pub fn with_chunk_index(mut self, spec: ChunkIndexSpec) -> Result<Table> {
        if spec.columns.len() < 3 {
            return Err(CoreError::MissingColumn(
                "chunk index row id / position columns".to_owned(),
            ));
        }
        for name in &spec.columns[..3] {
            if !self.by_dbname.contains_key(name) {
                return Err(CoreError::MissingColumn(name.clone()));
            }
        }
        for c in &mut self.columns {
            if c.constant.is_none() && !c.computed && !spec.columns.contains(&c.dbname) {
                c.selectable = false;
                c.queryable = false;
            }
        }
        self.chunk_index = Some(spec);
        Ok(self)
    }

    /// Declares the image corner columns with the default logical
    /// names. Corners are stored when all 8 columns exist, computed
    /// when none do; anything in between is a configuration error.
    pub fn with_corners(self, radius: f64) -> Result<Table> {
        self.with_named_corners(radius, CORNER_NAMES)
    }

    pub fn with_named_corners(mut self, radius: f64, names: [&str; 8]) -> Result<Table> {
        let present = names.iter().filter(|n| self.by_name.contains_key(**n)).count();
        let computed = match present {
            8 => false,
            0 => true,
            _ => return Err(CoreError::MixedComputedColumns(self.id.clone(), "corner")),
        };
        if computed {
            for name in &names {
                self.push_column(Column::computed_position(name))?;
            }
        }
        self.corners = Some(CornersSpec {
            radius,
            computed,
            columns: names.map(str::to_owned),
        });
        Ok(self)
    }

    pub fn with_center(self) -> Result<Table> {
        self.with_named_center(CENTER_NAMES)
    }

    pub fn with_named_center(mut self, names: [&str; 2]) -> Result<Table> {
        let present = names.iter().filter(|n| self.by_name.contains_key(**n)).count();
        let computed = match present {
            2 => false,
            0 => true,
            _ => return Err(CoreError::MixedComputedColumns(self.id.clone(), "center")),
        };
        if computed {
            for name in &names {
                self.push_column(Column::computed_position(name))?;
            }
        }
        self.center = Some(CenterSpec {
            computed,
            columns: names.map(str::to_owned),
        });
        Ok(self)
    }

    pub fn with_wcs(mut self, wcs: WcsColumns) -> Result<Table> {
        for name in wcs.names() {
            if !self.by_name.contains_key(name) {
                return Err(CoreError::MissingColumn(name.to_owned()));
            }
        }
        self.wcs = Some(wcs);
        Ok(self)
    }

    pub fn with_image_set(mut self, names: &[&str]) -> Result<Table> {
        for name in names {
            if !self.by_name.contains_key(*name) {
                return Err(CoreError::MissingColumn((*name).to_owned()));
            }
        }
        self.image_set = names.iter().map(|n| (*n).to_owned()).collect();
        Ok(self)
    }

    fn push_column(&mut self, c: Column) -> Result<()> {
        if self.by_name.contains_key(&c.name) {
            return Err(CoreError::DuplicateColumn(c.name.clone()));
        }
        self.by_name.insert(c.name.clone(), self.columns.len());
        self.columns.push(c);
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    pub fn column_by_dbname(&self, dbname: &str) -> Option<&Column> {
        self.by_dbname.get(dbname).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn principal_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.principal)
    }

    pub fn chunk_index(&self) -> Option<&ChunkIndexSpec> {
        self.chunk_index.as_ref()
    }

    pub fn corners(&self) -> Option<&CornersSpec> {
        self.corners.as_ref()
    }

    pub fn center(&self) -> Option<&CenterSpec> {
        self.center.as_ref()
    }

    pub fn image_set(&self) -> &[String] {
        &self.image_set
    }

    pub fn wcs_columns(&self) -> Option<&WcsColumns> {
        self.wcs.as_ref()
    }

    /// Resolves a logical column for the given row, honoring constant
    /// columns.
    pub fn value<'a>(&'a self, row: &'a Row, name: &str) -> Result<&'a Value> {
        let col = self
            .column(name)
            .ok_or_else(|| CoreError::MissingColumn(name.to_owned()))?;
        col.get(row)
            .ok_or_else(|| CoreError::MissingValue(name.to_owned()))
    }

    pub fn f64_value(&self, row: &Row, name: &str) -> Result<f64> {
        self.value(row, name)?.require_f64(name)
    }

    fn str_value(&self, row: &Row, name: &str) -> Result<String> {
        Ok(self.value(row, name)?.to_string())
    }

    /// Builds the TAN transform for a table row from the declared WCS
    /// parameter columns.
    pub fn make_wcs(&self, row: &Row) -> Result<TanWcs> {
        let w = self
            .wcs
            .as_ref()
            .ok_or_else(|| CoreError::MissingColumn("wcs columns".to_owned()))?;
        for ctype in [&w.ctype1, &w.ctype2] {
            let v = self.str_value(row, ctype)?;
            if !v.ends_with("TAN") {
                return Err(CoreError::UnsupportedProjection(v));
            }
        }
        let scale = match &w.scale {
            ScaleColumns::Cd {
                cd1_1,
                cd1_2,
                cd2_1,
                cd2_2,
            } => crate::wcs::Scale::Cd {
                cd1_1: self.f64_value(row, cd1_1)?,
                cd1_2: self.f64_value(row, cd1_2)?,
                cd2_1: self.f64_value(row, cd2_1)?,
                cd2_2: self.f64_value(row, cd2_2)?,
            },
            ScaleColumns::CdeltPc {
                cdelt1,
                cdelt2,
                pc1_1,
                pc1_2,
                pc2_1,
                pc2_2,
            } => crate::wcs::Scale::CdeltPc {
                cdelt1: self.f64_value(row, cdelt1)?,
                cdelt2: self.f64_value(row, cdelt2)?,
                pc1_1: self.f64_value(row, pc1_1)?,
                pc1_2: self.f64_value(row, pc1_2)?,
                pc2_1: self.f64_value(row, pc2_1)?,
                pc2_2: self.f64_value(row, pc2_2)?,
            },
            ScaleColumns::CdeltRot { cdelt1, cdelt2, crota2 } => crate::wcs::Scale::CdeltRot {
                cdelt1: self.f64_value(row, cdelt1)?,
                cdelt2: self.f64_value(row, cdelt2)?,
                crota2: match crota2 {
                    Some(c) => self.f64_value(row, c)?,
                    None => 0.0,
                },
            },
        };
        TanWcs::new(
            (self.f64_value(row, &w.crval1)?, self.f64_value(row, &w.crval2)?),
            (self.f64_value(row, &w.crpix1)?, self.f64_value(row, &w.crpix2)?),
            scale,
            (self.f64_value(row, &w.naxis1)?, self.f64_value(row, &w.naxis2)?),
        )
    }

    /// Computes the values of computed corner and center columns for a
    /// row, reusing an already constructed transform when available.
    /// Returns an empty row when nothing is computed.
    pub fn compute_row(&self, row: &Row, wcs: Option<&TanWcs>) -> Result<Row> {
        let mut out = Row::default();
        let needs_corners = self.corners.as_ref().is_some_and(|c| c.computed);
        let needs_center = self.center.as_ref().is_some_and(|c| c.computed);
        if !needs_corners && !needs_center {
            return Ok(out);
        }
        let own;
        let wcs = match wcs {
            Some(w) => w,
            None => {
                own = self.make_wcs(row)?;
                &own
            }
        };
        if needs_corners {
            // corners spec is present here
            if let Some(c) = &self.corners {
                let sky = wcs.corners();
                for (i, (theta, phi)) in sky.iter().enumerate() {
                    out.insert(c.columns[2 * i].clone(), Value::Float(*theta));
                    out.insert(c.columns[2 * i + 1].clone(), Value::Float(*phi));
                }
            }
        }
        if needs_center {
            if let Some(c) = &self.center {
                let (theta, phi) = wcs.center_sky();
                out.insert(c.columns[0].clone(), Value::Float(theta));
                out.insert(c.columns[1].clone(), Value::Float(phi));
            }
        }
        Ok(out)
    }
}
