//! Error types for the spherical geometry kernel.

use thiserror::Error;

/// Geometry errors.
///
/// Geometric rejection (non-hemispherical vertex sets, degenerate vertices,
/// failed convexity) is always an explicit typed failure with a
/// human-readable reason, never a silent approximation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// Latitude angle outside [-90, 90] degrees.
    #[error("latitude angle {0} is out of range [-90, 90] deg")]
    LatitudeOutOfRange(f64),

    /// Attempt to normalize a zero-magnitude 3-vector.
    #[error("cannot normalize a 3-vector with zero magnitude")]
    ZeroVector,

    /// Box constructed with min latitude above max latitude.
    #[error("latitude angle minimum {min} is greater than maximum {max}")]
    BoxLatitudeOrder { min: f64, max: f64 },

    /// Box constructed with an invalid longitude range.
    #[error("longitude angle minimum {min} is greater than maximum {max}")]
    BoxLongitudeOrder { min: f64, max: f64 },

    /// Circle radius outside [0, 180] degrees.
    #[error("circle radius {0} is negative or greater than 180 deg")]
    RadiusOutOfRange(f64),

    /// Polygon with fewer than 3 vertices.
    #[error("spherical polygon must contain at least 3 vertices")]
    TooFewVertices,

    /// Vertex and edge lists of different lengths.
    #[error("number of edges does not match number of vertices")]
    EdgeCountMismatch,

    /// Vertex list failed the convexity test.
    #[error("polygon vertices are not convex: {0}")]
    NotConvex(#[from] ConvexityError),
}

/// Reasons a vertex list fails the convexity test.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvexityError {
    /// Fewer than 3 vertices.
    #[error("3 or more vertices must be specified")]
    TooFewVertices,

    /// No plane strictly separates the origin from all vertices.
    #[error("vertices are not hemispherical")]
    NotHemispherical,

    /// Consecutive vertices are identical or nearly so.
    #[error("vertex list contains near-duplicate or degenerate vertices")]
    DegenerateVertices,

    /// Vertices wind around the centroid in both directions.
    #[error("vertices wind around the centroid in both clockwise and counter-clockwise order")]
    MixedWinding,

    /// The centroid is not strictly inside every edge.
    #[error("centroid of vertices is not conclusively inside all edges")]
    CentroidOutsideEdge,

    /// The centroid nearly coincides with a vertex.
    #[error("centroid of vertices is too close to a vertex")]
    CentroidNearVertex,

    /// Total winding angle is not one full revolution.
    #[error("vertices do not wind around the centroid exactly once")]
    IncompleteWinding,
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;
