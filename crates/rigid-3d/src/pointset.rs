use crate::{error::GeometryError, transforms::RigidTransform};

/// An ordered, non-empty set of 3D points with optional triangle faces.
///
/// The order of the points defines their identity: indices returned by
/// correspondence searches and face vertex indices refer to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    // The points of the set.
    points: Vec<[f64; 3]>,
    // Triangle faces as vertex indices into `points`.
    faces: Option<Vec<[usize; 3]>>,
}

impl PointSet {
    /// Create a new point set from points and optional triangle faces.
    ///
    /// Fails if there are no points or a face references a missing vertex.
    pub fn new(
        points: Vec<[f64; 3]>,
        faces: Option<Vec<[usize; 3]>>,
    ) -> Result<Self, GeometryError> {
        if points.is_empty() {
            return Err(GeometryError::EmptyPointSet);
        }

        if let Some(faces) = &faces {
            for (face_idx, face) in faces.iter().enumerate() {
                if let Some(&index) = face.iter().find(|&&i| i >= points.len()) {
                    return Err(GeometryError::FaceIndexOutOfBounds {
                        face: face_idx,
                        index,
                        num_points: points.len(),
                    });
                }
            }
        }

        Ok(Self { points, faces })
    }

    /// Create a point set from a row major buffer with `ncols` values per point.
    ///
    /// Only `ncols == 3` is accepted.
    pub fn from_flat(data: &[f64], ncols: usize) -> Result<Self, GeometryError> {
        if ncols != 3 {
            return Err(GeometryError::InvalidDimension(ncols));
        }
        if data.len() % ncols != 0 {
            return Err(GeometryError::InvalidBufferLength {
                len: data.len(),
                ncols,
            });
        }

        let points = data
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect::<Vec<_>>();

        Self::new(points, None)
    }

    /// Create a point set from rows of arbitrary length; every row must have 3 values.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, GeometryError> {
        let points = rows
            .iter()
            .map(|row| match row.as_slice() {
                [x, y, z] => Ok([*x, *y, *z]),
                _ => Err(GeometryError::InvalidDimension(row.len())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(points, None)
    }

    /// Get the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, a point set holds at least one point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the triangle faces, if any.
    pub fn faces(&self) -> Option<&[[usize; 3]]> {
        self.faces.as_deref()
    }

    /// Return a new set with every point mapped through `transform`.
    ///
    /// Faces are carried over unchanged.
    pub fn transformed(&self, transform: &RigidTransform) -> Result<Self, GeometryError> {
        let mut points = vec![[0.0; 3]; self.points.len()];
        transform.apply(&self.points, &mut points)?;
        Ok(Self {
            points,
            faces: self.faces.clone(),
        })
    }

    /// Gather the points at `indices`, in that order.
    ///
    /// Fails on the first index that is not smaller than `len()`.
    pub fn select(&self, indices: &[usize]) -> Result<Vec<[f64; 3]>, GeometryError> {
        indices
            .iter()
            .map(|&index| {
                self.points
                    .get(index)
                    .copied()
                    .ok_or(GeometryError::IndexOutOfBounds {
                        index,
                        num_points: self.points.len(),
                    })
            })
            .collect()
    }

    /// Get the minimum bound of the point set.
    pub fn min_bound(&self) -> [f64; 3] {
        self.points.iter().skip(1).fold(self.points[0], |a, b| {
            [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])]
        })
    }

    /// Get the maximum bound of the point set.
    pub fn max_bound(&self) -> [f64; 3] {
        self.points.iter().skip(1).fold(self.points[0], |a, b| {
            [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])]
        })
    }
}
