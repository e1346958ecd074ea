//! Shared foundation for the sky-coverage search service: table and
//! column descriptions, typed row values, fixed-width IPAC ASCII table
//! io and per-row TAN astrometric transforms.

pub mod error;
pub mod ipac;
pub mod schema;
pub mod value;
pub mod wcs;

pub use error::{CoreError, Result};
pub use ipac::{IpacColumn, IpacReader, IpacType};
pub use schema::{CenterSpec, ChunkIndexSpec, Column, CornersSpec, Table};
pub use value::{Row, Value};
pub use wcs::{Scale, ScaleColumns, TanWcs, WcsColumns};
