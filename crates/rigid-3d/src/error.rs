/// An error type for the geometry primitives.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Error when a point set has no points.
    #[error("Point set is empty")]
    EmptyPointSet,

    /// Error when the points are not three dimensional.
    #[error("Points must be 3-dimensional, got {0} columns")]
    InvalidDimension(usize),

    /// Error when a flat buffer cannot be split into rows.
    #[error("Buffer of length {len} is not a multiple of {ncols} columns")]
    InvalidBufferLength {
        /// Length of the flat buffer.
        len: usize,
        /// Requested number of columns.
        ncols: usize,
    },

    /// Error when a face references a vertex that does not exist.
    #[error("Face {face} references vertex {index} but the point set has {num_points} points")]
    FaceIndexOutOfBounds {
        /// Position of the offending face.
        face: usize,
        /// Offending vertex index.
        index: usize,
        /// Number of points in the set.
        num_points: usize,
    },

    /// Error when a point index does not exist in the set.
    #[error("Point index {index} is out of bounds for a set of {num_points} points")]
    IndexOutOfBounds {
        /// Offending point index.
        index: usize,
        /// Number of points in the set.
        num_points: usize,
    },

    /// Error when two point buffers are expected to have the same length.
    #[error("Mismatched number of points: {0} vs {1}")]
    MismatchedLength(usize, usize),

    /// Error when a rotation axis has zero length.
    #[error("Cannot compute rotation matrix from a zero vector")]
    ZeroAxis,
}
