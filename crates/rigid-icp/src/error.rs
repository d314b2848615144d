use rigid_3d::GeometryError;

/// An error type for the registration module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IcpError {
    /// Error when the input point sets are empty, not 3D or not paired.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] GeometryError),

    /// Error when the convergence criteria cannot be satisfied.
    #[error("Invalid convergence criteria: {0}")]
    InvalidCriteria(String),
}
