#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the geometry primitives.
pub mod error;

/// Linear algebra utilities.
pub mod linalg;

/// Point set container.
pub mod pointset;

/// 3D transforms algorithms.
pub mod transforms;

pub use error::GeometryError;
pub use pointset::PointSet;
pub use transforms::RigidTransform;
