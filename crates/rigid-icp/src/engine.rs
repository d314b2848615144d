use std::iter::FusedIterator;

use rigid_3d::{PointSet, RigidTransform};
use serde::{Deserialize, Serialize};

use crate::{
    correspondence::{BruteForceMatcher, NearestNeighborMatcher},
    fit::{fit_transformation, NumericDegeneracy},
    IcpError,
};

/// Structure to define the ICP parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcpConvergenceCriteria {
    /// Maximum number of iterations to perform.
    pub max_iterations: usize,
    /// Convergence tolerance as the difference in mean error between two consecutive iterations.
    pub tolerance: f64,
}

impl Default for IcpConvergenceCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
        }
    }
}

impl IcpConvergenceCriteria {
    /// Check that the iteration budget and the tolerance are positive.
    pub fn validate(&self) -> Result<(), IcpError> {
        if self.max_iterations == 0 {
            return Err(IcpError::InvalidCriteria(
                "max_iterations must be positive".to_string(),
            ));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(IcpError::InvalidCriteria(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Snapshot emitted after every ICP iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationState {
    /// 1-based iteration index.
    pub iteration: usize,
    /// Source points after applying this iteration's transform.
    pub transformed: PointSet,
    /// Mean nearest neighbor distance measured before this iteration's correction.
    pub error: f64,
    /// Whether this iteration met the convergence criteria.
    pub converged: bool,
    /// Transform estimated in this iteration.
    pub delta: RigidTransform,
    /// Transform from the original source to `transformed`.
    pub transform: RigidTransform,
    /// Advisory flag when this iteration's rotation was not unique.
    pub degeneracy: Option<NumericDegeneracy>,
}

/// Why the engine stopped producing iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The error change dropped below the tolerance.
    Converged,
    /// The iteration budget was spent without converging.
    MaxIterExhausted,
    /// An iteration returned an error.
    Failed,
}

/// Outcome of [`IcpEngine::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum IcpStep {
    /// A new iteration was performed.
    Iteration(Box<IterationState>),
    /// No more iterations will be produced.
    Finished(Termination),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EngineState {
    Running {
        iteration: usize,
        previous_error: f64,
    },
    Finished {
        termination: Termination,
        iterations: usize,
    },
}

/// Iterative Closest Point (ICP) using point to point distance, one iteration at a time.
///
/// Every call to [`IcpEngine::step`] matches the current source against the
/// target, fits the incremental rigid transform, applies it and reports the
/// result. The engine also implements [`Iterator`], so the whole registration
/// is a finite, lazy sequence of [`IterationState`].
///
/// Example:
///
/// ```
/// use rigid_3d::PointSet;
/// use rigid_icp::{IcpConvergenceCriteria, IcpEngine};
///
/// let source = PointSet::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]], None)?;
/// let target = source.clone();
///
/// let engine = IcpEngine::new(&source, &target, IcpConvergenceCriteria::default())?;
/// for state in engine {
///     let state = state?;
///     println!("iteration {} error {}", state.iteration, state.error);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct IcpEngine<M = BruteForceMatcher> {
    source: PointSet,
    target: PointSet,
    criteria: IcpConvergenceCriteria,
    matcher: M,
    transform: RigidTransform,
    state: EngineState,
}

impl IcpEngine<BruteForceMatcher> {
    /// Create an engine with the brute force matcher.
    ///
    /// # Arguments
    ///
    /// * `source` - Source point set, copied into the engine.
    /// * `target` - Target point set, copied into the engine.
    /// * `criteria` - Convergence criteria.
    pub fn new(
        source: &PointSet,
        target: &PointSet,
        criteria: IcpConvergenceCriteria,
    ) -> Result<Self, IcpError> {
        Self::with_matcher(source, target, criteria, BruteForceMatcher::default())
    }
}

impl<M: NearestNeighborMatcher> IcpEngine<M> {
    /// Create an engine with a custom nearest neighbor matcher.
    pub fn with_matcher(
        source: &PointSet,
        target: &PointSet,
        criteria: IcpConvergenceCriteria,
        matcher: M,
    ) -> Result<Self, IcpError> {
        criteria.validate()?;

        Ok(Self {
            source: source.clone(),
            target: target.clone(),
            criteria,
            matcher,
            transform: RigidTransform::identity(),
            state: EngineState::Running {
                iteration: 0,
                previous_error: f64::INFINITY,
            },
        })
    }

    /// Pre-align the working source with an initial guess.
    ///
    /// The guess is the transform from the source to the target frame and is
    /// included in every reported cumulative transform.
    pub fn with_initial_transform(mut self, initial: &RigidTransform) -> Result<Self, IcpError> {
        self.source = self.source.transformed(initial)?;
        self.transform = self.transform.then(initial);
        Ok(self)
    }

    /// The convergence criteria.
    pub fn criteria(&self) -> &IcpConvergenceCriteria {
        &self.criteria
    }

    /// The working source points.
    pub fn source(&self) -> &PointSet {
        &self.source
    }

    /// The fixed target points.
    pub fn target(&self) -> &PointSet {
        &self.target
    }

    /// Transform from the original source to the working source.
    pub fn transform(&self) -> &RigidTransform {
        &self.transform
    }

    /// Number of iterations performed so far.
    pub fn iterations(&self) -> usize {
        match self.state {
            EngineState::Running { iteration, .. } => iteration,
            EngineState::Finished { iterations, .. } => iterations,
        }
    }

    /// Why the engine stopped, `None` while it is still running.
    pub fn termination(&self) -> Option<Termination> {
        match self.state {
            EngineState::Running { .. } => None,
            EngineState::Finished { termination, .. } => Some(termination),
        }
    }

    /// Perform one iteration, or report that the registration is over.
    pub fn step(&mut self) -> Result<IcpStep, IcpError> {
        let (iteration, previous_error) = match self.state {
            EngineState::Running {
                iteration,
                previous_error,
            } => (iteration + 1, previous_error),
            EngineState::Finished { termination, .. } => {
                return Ok(IcpStep::Finished(termination))
            }
        };

        match self.iterate(iteration, previous_error) {
            Ok(state) => Ok(IcpStep::Iteration(Box::new(state))),
            Err(err) => {
                self.state = EngineState::Finished {
                    termination: Termination::Failed,
                    iterations: iteration - 1,
                };
                Err(err)
            }
        }
    }

    fn iterate(&mut self, iteration: usize, previous_error: f64) -> Result<IterationState, IcpError> {
        log::debug!("Iteration: {}", iteration);
        let now = std::time::Instant::now();

        // find closest points between current source and target
        let correspondences = self.matcher.find_nearest(&self.source, &self.target);
        let points_in_dst = self.target.select(&correspondences.indices)?;

        // compute transformation between current source and closest points
        let alignment = fit_transformation(self.source.points(), &points_in_dst)?;
        if let Some(degeneracy) = alignment.degeneracy {
            log::warn!("Iteration {}: {}", iteration, degeneracy);
        }

        let transformed = self.source.transformed(&alignment.transform)?;
        self.transform = self.transform.then(&alignment.transform);

        // error of the matching step, before this iteration's correction
        let error = correspondences.mean_distance();
        let tolerance = self.criteria.tolerance;
        let converged = (previous_error - error).abs() < tolerance || error < tolerance;

        self.source = transformed.clone();
        self.state = if converged {
            log::debug!("ICP converged in {} iterations with error {}", iteration, error);
            EngineState::Finished {
                termination: Termination::Converged,
                iterations: iteration,
            }
        } else if iteration >= self.criteria.max_iterations {
            log::warn!(
                "ICP did not converge in {} iterations, last error {}",
                iteration,
                error
            );
            EngineState::Finished {
                termination: Termination::MaxIterExhausted,
                iterations: iteration,
            }
        } else {
            EngineState::Running {
                iteration,
                previous_error: error,
            }
        };

        log::debug!("error: {} elapsed: {:?}", error, now.elapsed());

        Ok(IterationState {
            iteration,
            transformed,
            error,
            converged,
            delta: alignment.transform,
            transform: self.transform,
            degeneracy: alignment.degeneracy,
        })
    }
}

impl<M: NearestNeighborMatcher> Iterator for IcpEngine<M> {
    type Item = Result<IterationState, IcpError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(IcpStep::Iteration(state)) => Some(Ok(*state)),
            Ok(IcpStep::Finished(_)) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<M: NearestNeighborMatcher> FusedIterator for IcpEngine<M> {}
