use rigid_3d::{PointSet, RigidTransform};

use crate::{IcpConvergenceCriteria, IcpEngine, IcpError};

/// Result of the ICP algorithm.
///
/// The transformation is from the source to the target frame.
#[derive(Debug, Clone, PartialEq)]
pub struct IcpResult {
    /// Estimated rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// Estimated translation vector.
    pub translation: [f64; 3],
    /// The total number of iterations performed.
    pub num_iterations: usize,
    /// Mean correspondence distance of the last iteration.
    pub error: f64,
    /// Whether the last iteration met the convergence criteria.
    pub converged: bool,
}

/// Iterative Closest Point (ICP) algorithm using point to point distance, run to the end.
///
/// # Arguments
///
/// * `source` - Source point set.
/// * `target` - Target point set.
/// * `initial` - Initial guess of the transform from the source to the target frame.
/// * `criteria` - Convergence criteria.
///
/// # Returns
///
/// * `result` - Result of the ICP algorithm containing the rotation, translation, and number of iterations.
pub fn icp_vanilla(
    source: &PointSet,
    target: &PointSet,
    initial: &RigidTransform,
    criteria: IcpConvergenceCriteria,
) -> Result<IcpResult, IcpError> {
    let engine = IcpEngine::new(source, target, criteria)?.with_initial_transform(initial)?;

    let mut result = IcpResult {
        rotation: initial.rotation,
        translation: initial.translation,
        num_iterations: 0,
        error: f64::INFINITY,
        converged: false,
    };

    for state in engine {
        let state = state?;
        result.rotation = state.transform.rotation;
        result.translation = state.transform.translation;
        result.num_iterations = state.iteration;
        result.error = state.error;
        result.converged = state.converged;
    }

    Ok(result)
}
