//! Error types shared by the schema, table and astrometry modules.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Column lookup by logical or database name failed.
    #[error("column {0} does not exist")]
    MissingColumn(String),

    /// Two columns share a logical or database name.
    #[error("duplicate definition for column {0}")]
    DuplicateColumn(String),

    /// A column is declared constant but has no constant value, or is
    /// both constant and selectable/queryable.
    #[error("column {0} has an inconsistent constant declaration")]
    BadConstant(String),

    /// A row is missing a value required for a computation.
    #[error("row has no value for column {0}")]
    MissingValue(String),

    /// A value could not be interpreted as the required type.
    #[error("value {value:?} of column {column} is not {expected}")]
    TypeMismatch {
        column: String,
        value: String,
        expected: &'static str,
    },

    /// Corner or center columns are partially stored, partially absent.
    #[error("table {0}: all {1} columns must be stored or computed")]
    MixedComputedColumns(String, &'static str),

    /// A WCS column set names a projection other than gnomonic.
    #[error("unsupported projection {0}, only TAN is handled")]
    UnsupportedProjection(String),

    /// Sky position lies on or behind the tangent plane horizon.
    #[error("sky position ({0}, {1}) is off-scale for the image transform")]
    OffScale(f64, f64),

    /// The linear part of an astrometric transform is not invertible.
    #[error("astrometric scale matrix is singular")]
    SingularScale,

    /// Structural problem in an IPAC ASCII table file.
    #[error("malformed IPAC ASCII table: {0}")]
    IpacFormat(String),

    /// Unrecognized column type name in an IPAC ASCII table header.
    #[error("unsupported data type {datatype} for IPAC column {column}")]
    IpacType { column: String, datatype: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
