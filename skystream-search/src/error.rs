//! Search request errors.
//!
//! Validation errors carry the message text reported to the caller;
//! chunk index failures surface the external tool's own message and are
//! never retried.

use thiserror::Error;

use skystream_constraint::ConstraintError;
use skystream_core::CoreError;
use skystream_geom::GeomError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidPos(String),

    #[error("{0}")]
    InvalidSize(String),

    #[error("INTERSECT must be one of COVERS, ENCLOSED, CENTER, OVERLAPS")]
    InvalidIntersect,

    #[error("Column {column} does not exist in table {table}")]
    NoSuchColumn { column: String, table: String },

    #[error("Column {column} in table {table} is not selectable")]
    NotSelectable { column: String, table: String },

    #[error("Table {table} does not contain a column named {column}.")]
    NoSuchConstraintColumn { column: String, table: String },

    #[error("Column {column} in table {table} is not allowed to participate in constraints")]
    NotQueryable { column: String, table: String },

    #[error("Empty WHERE clause")]
    EmptyWhere,

    #[error("Invalid WHERE clause: {0}")]
    InvalidWhere(ConstraintError),

    #[error("No spatial constraint (POS) specified")]
    NoConstraint,

    #[error("Table {0} is not an image metadata table and cannot be queried directly")]
    NotImageTable(String),

    #[error("Table {0} cannot be queried spatially: missing corners and/or chunk index")]
    NotSpatial(String),

    #[error("Search region is too large - the maximum region bounding circle radius is {0} deg")]
    RegionTooLarge(f64),

    #[error("POS/SIZE do not describe a usable search region")]
    DegenerateRegion,

    /// The external tool reported a non-OK status.
    #[error("{0}")]
    ChunkIndex(String),

    #[error("chunk index produced unparseable output: {0}")]
    ChunkIndexOutput(String),

    #[error("malformed match file: {0}")]
    MatchFile(String),

    #[error(transparent)]
    Geom(#[from] GeomError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
