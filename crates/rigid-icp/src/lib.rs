#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod correspondence;
pub use correspondence::*;

mod engine;
pub use engine::*;

mod error;
pub use error::IcpError;

mod fit;
pub use fit::{fit_transformation, Alignment, NumericDegeneracy};

mod icp_vanilla;
pub use icp_vanilla::*;
