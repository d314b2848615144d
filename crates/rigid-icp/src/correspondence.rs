use rayon::prelude::*;
use rigid_3d::{linalg, GeometryError, PointSet};

use crate::IcpError;

/// Nearest neighbor correspondences from a source set into a target set.
///
/// Entry `i` of both vectors belongs to source point `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondences {
    /// Index of the matched target point for every source point.
    pub indices: Vec<usize>,
    /// Euclidean distance to the matched target point for every source point.
    pub distances: Vec<f64>,
}

impl Correspondences {
    /// Number of source points.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if there are no correspondences.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Mean of the match distances, zero when empty.
    pub fn mean_distance(&self) -> f64 {
        if self.distances.is_empty() {
            return 0.0;
        }
        self.distances.iter().sum::<f64>() / self.distances.len() as f64
    }
}

/// Finds for every source point its closest target point.
///
/// Implementations must be deterministic: the same inputs give the same
/// indices and distances, and ties resolve to the lowest target index.
pub trait NearestNeighborMatcher {
    /// Match every point of `source` against `target`.
    fn find_nearest(&self, source: &PointSet, target: &PointSet) -> Correspondences;
}

/// Exhaustive O(N*M) nearest neighbor search.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceMatcher {
    /// Split the source points across the rayon thread pool.
    pub parallel: bool,
}

impl Default for BruteForceMatcher {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl BruteForceMatcher {
    /// A matcher that scans on the calling thread only.
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    fn search(&self, source: &[[f64; 3]], target: &[[f64; 3]]) -> Correspondences {
        let matches = if self.parallel {
            source
                .par_iter()
                .map(|p| nearest_one(p, target))
                .collect::<Vec<_>>()
        } else {
            source
                .iter()
                .map(|p| nearest_one(p, target))
                .collect::<Vec<_>>()
        };

        let (indices, distances) = matches
            .into_iter()
            .map(|(idx, dist_sq)| (idx, dist_sq.sqrt()))
            .unzip();

        Correspondences { indices, distances }
    }
}

impl NearestNeighborMatcher for BruteForceMatcher {
    fn find_nearest(&self, source: &PointSet, target: &PointSet) -> Correspondences {
        self.search(source.points(), target.points())
    }
}

// index and squared distance of the closest target point, first minimum wins
fn nearest_one(query: &[f64; 3], target: &[[f64; 3]]) -> (usize, f64) {
    let mut best = (0, linalg::squared_distance(query, &target[0]));
    for (j, p) in target.iter().enumerate().skip(1) {
        let d = linalg::squared_distance(query, p);
        if d < best.1 {
            best = (j, d);
        }
    }
    best
}

/// Find the nearest target point of every source point by brute force.
///
/// # Arguments
///
/// * `source` - Points to be matched.
/// * `target` - Candidate points.
///
/// # Returns
///
/// The correspondences, or an error if either slice is empty.
pub fn find_correspondences(
    source: &[[f64; 3]],
    target: &[[f64; 3]],
) -> Result<Correspondences, IcpError> {
    if source.is_empty() || target.is_empty() {
        return Err(GeometryError::EmptyPointSet.into());
    }
    Ok(BruteForceMatcher::default().search(source, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_random_points(num_points: usize) -> Vec<[f64; 3]> {
        (0..num_points)
            .map(|_| {
                [
                    rand::random::<f64>(),
                    rand::random::<f64>(),
                    rand::random::<f64>(),
                ]
            })
            .collect()
    }

    #[test]
    fn test_find_correspondences() -> Result<(), IcpError> {
        let points_src = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ];
        let points_dst = vec![[1.0, 0.0, 0.0], [1.0, 1.0, 0.0]];

        let res = find_correspondences(&points_src, &points_dst)?;

        assert_eq!(res.len(), 4);
        assert_eq!(res.indices, vec![0, 0, 1, 1]);
        assert_eq!(res.distances, vec![1.0, 0.0, 1.0, 0.0]);
        assert_eq!(res.mean_distance(), 0.5);

        Ok(())
    }

    #[test]
    fn test_find_correspondences_empty() {
        let points = vec![[0.0, 0.0, 0.0]];
        assert_eq!(
            find_correspondences(&[], &points),
            Err(IcpError::InvalidInput(GeometryError::EmptyPointSet))
        );
        assert_eq!(
            find_correspondences(&points, &[]),
            Err(IcpError::InvalidInput(GeometryError::EmptyPointSet))
        );
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() -> Result<(), Box<dyn std::error::Error>> {
        let source = PointSet::new(vec![[0.0, 0.0, 0.0], [0.0, 5.0, 0.0]], None)?;
        let target = PointSet::new(
            vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            None,
        )?;

        for matcher in [BruteForceMatcher::sequential(), BruteForceMatcher::default()] {
            let res = matcher.find_nearest(&source, &target);
            assert_eq!(res.indices[0], 0);
            assert_eq!(res.distances[0], 1.0);
        }

        // same candidates in another order, the first one listed still wins
        let target = PointSet::new(
            vec![[0.0, 0.0, 1.0], [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            None,
        )?;
        let res = BruteForceMatcher::default().find_nearest(&source, &target);
        assert_eq!(res.indices[0], 0);

        Ok(())
    }

    #[test]
    fn test_matcher_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let source = PointSet::new(create_random_points(200), None)?;
        let target = PointSet::new(create_random_points(150), None)?;

        let parallel = BruteForceMatcher::default();
        let sequential = BruteForceMatcher::sequential();

        let first = parallel.find_nearest(&source, &target);
        let second = parallel.find_nearest(&source, &target);
        let third = sequential.find_nearest(&source, &target);

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert!(first.distances.iter().all(|d| *d >= 0.0));
        assert!(first.indices.iter().all(|i| *i < target.len()));

        Ok(())
    }

    #[test]
    fn test_matcher_identical_sets() -> Result<(), Box<dyn std::error::Error>> {
        let points = create_random_points(50);
        let set = PointSet::new(points, None)?;
        let res = BruteForceMatcher::default().find_nearest(&set, &set);

        assert_eq!(res.indices, (0..50).collect::<Vec<_>>());
        assert_eq!(res.mean_distance(), 0.0);
        Ok(())
    }
}
