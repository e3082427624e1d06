#![doc = include_str!("../README.md")]

pub mod collapse;
pub mod diagnostics;
pub mod error;
pub mod fit;
pub mod moments;
pub mod state;

// --- High-level re-exports -------------------------------------------------

// Main entry points: driver + free function.
pub use crate::collapse::{collapse_center, CenterCollapser, CollapseParams, StepOutcome};
pub use crate::error::CollapseError;
pub use crate::fit::MixtureFit;
pub use crate::state::MixtureState;

// Diagnostics returned by the driver.
pub use crate::diagnostics::{CollapseReport, CollapseTrace, MergeStep};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```
/// use center_collapse::prelude::*;
/// use nalgebra::{DMatrix, DVector};
///
/// let fit = MixtureFit::new(
///     DVector::from_vec(vec![-0.05, 0.02, 0.4]),
///     DMatrix::from_element(5, 3, 1.0 / 3.0),
///     DVector::from_element(3, 0.01),
/// );
/// let state = collapse_center(fit, 0.6).unwrap();
/// assert!(state.pro[state.center] >= 0.6 || state.ngroups == 1);
/// ```
pub mod prelude {
    pub use crate::{
        collapse_center, CenterCollapser, CollapseError, CollapseParams, MixtureFit, MixtureState,
    };
}
