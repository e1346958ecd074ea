//! Spatial and relational queries over image metadata tables.
//!
//! A search takes a query position, an optional rectangular region
//! size, an intersection mode and an optional WHERE clause. Candidate
//! rows come from an external chunk index (a conservative superset of
//! the answer) and are filtered exactly against the image footprints
//! before being written out in batches.

pub mod chunk_index;
pub mod error;
pub mod region;
pub mod request;
pub mod search;
pub mod stream;
pub mod writer;

pub use chunk_index::ChunkIndexBridge;
pub use error::{Result, SearchError};
pub use region::{corners_to_polygon, make_rectangle};
pub use request::{parse_pos, parse_size, Intersect, SearchRequest};
pub use search::{search, FileStream};
pub use stream::ResultStream;
pub use writer::{CsvWriter, TableWriter};
