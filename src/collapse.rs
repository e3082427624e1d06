//! Merge loop collapsing near-zero components into the central cluster.
//!
//! Overview
//! - Ranks the current components by ascending absolute mean.
//! - While the closest-to-zero component holds less than the required share
//!   of the total mass, pools it with its nearest-in-rank neighbour. The
//!   lower-indexed slot of the pair survives; the higher-indexed slot is
//!   dropped and every co-indexed structure reindexes together.
//! - Halts when the share is reached or a single component remains, so the
//!   loop runs at most `ngroups - 1` iterations.
//!
//! Typical usage:
//! ```
//! use center_collapse::{CenterCollapser, CollapseParams, MixtureFit};
//! use nalgebra::{DMatrix, DVector};
//!
//! let mu = DVector::from_vec(vec![-0.1, 0.02, 0.3]);
//! let z = DMatrix::from_element(6, 3, 1.0 / 3.0);
//! let sigmasq = DVector::from_element(3, 0.05);
//! let fit = MixtureFit::new(mu, z, sigmasq);
//!
//! let collapser = CenterCollapser::new(CollapseParams { min_center: 0.5 });
//! let report = collapser.collapse_with_diagnostics(fit).unwrap();
//! println!(
//!     "center mass {:.3} after {} merges",
//!     report.state.pro[report.state.center],
//!     report.trace.merges.len()
//! );
//! ```

use crate::diagnostics::{CollapseReport, CollapseTrace, MergeStep};
use crate::error::CollapseError;
use crate::fit::MixtureFit;
use crate::state::MixtureState;

use log::debug;
use nalgebra::DVector;
use serde::Deserialize;
use std::time::Instant;

/// Combined mixing proportions at or below this are refused as degenerate.
const MASS_EPS: f64 = 1e-12;

/// Parameters steering the collapse loop.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CollapseParams {
    /// Minimum share of the total mass the central cluster must hold before
    /// merging stops. Must lie in [0, 1].
    pub min_center: f64,
}

impl Default for CollapseParams {
    fn default() -> Self {
        Self { min_center: 0.4 }
    }
}

/// What a single selector pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The pair `(survivor, removed)` was pooled into `survivor`.
    Merged { survivor: usize, removed: usize },
    /// The closest-to-zero component already holds the required share; no
    /// merge was performed.
    CenterSatisfied { center: usize },
}

/// Current component slots ordered by ascending absolute mean; ties keep
/// ascending slot order.
pub fn rank_by_abs_mean(mu: &DVector<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..mu.len()).collect();
    order.sort_by(|&a, &b| {
        mu[a].abs()
            .partial_cmp(&mu[b].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Run one selector pass over `state`.
///
/// Requires `state.ngroups > 1`; the driver checks this before calling. On a
/// merge the lower-indexed of the two lowest-ranked components survives.
/// Slot order, not rank order, picks the survivor, so the surviving component
/// is not necessarily the one with the smaller absolute mean.
pub fn merge_step(
    state: &mut MixtureState,
    min_center: f64,
) -> Result<StepOutcome, CollapseError> {
    debug_assert!(state.ngroups > 1);
    let order = rank_by_abs_mean(&state.mu);
    let candidate = order[0];
    if state.pro[candidate] >= min_center {
        state.center = candidate;
        return Ok(StepOutcome::CenterSatisfied { center: candidate });
    }
    let survivor = order[0].min(order[1]);
    let removed = order[0].max(order[1]);
    if state.pro[survivor] + state.pro[removed] <= MASS_EPS {
        return Err(CollapseError::DegenerateMass { survivor, removed });
    }
    state.merge_pair(survivor, removed);
    Ok(StepOutcome::Merged { survivor, removed })
}

/// Loop phase of the termination check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Running,
    Halted,
}

/// Driver owning the collapse parameters.
///
/// Mirrors the usual pipeline shape: [`collapse`](Self::collapse) returns
/// only the final state, [`collapse_with_diagnostics`](Self::collapse_with_diagnostics)
/// additionally reports the merge trace with timing.
pub struct CenterCollapser {
    params: CollapseParams,
}

impl CenterCollapser {
    /// Create a driver with the supplied parameters.
    pub fn new(params: CollapseParams) -> Self {
        Self { params }
    }

    /// Collapse a fit and return the final state.
    pub fn collapse(&self, fit: MixtureFit) -> Result<MixtureState, CollapseError> {
        self.collapse_with_diagnostics(fit).map(|report| report.state)
    }

    /// Collapse a fit and return the final state together with the merge
    /// trace.
    pub fn collapse_with_diagnostics(
        &self,
        fit: MixtureFit,
    ) -> Result<CollapseReport, CollapseError> {
        let min_center = self.params.min_center;
        if !(0.0..=1.0).contains(&min_center) {
            return Err(CollapseError::InvalidThreshold { value: min_center });
        }

        let total_start = Instant::now();
        let mut state = MixtureState::from_fit(fit)?;
        debug!(
            "CenterCollapser::collapse start ngroups={} center={} min_center={}",
            state.ngroups, state.center, min_center
        );

        let mut trace = CollapseTrace {
            initial_ngroups: state.ngroups,
            merges: Vec::new(),
            total_ms: 0.0,
        };
        let mut phase = Phase::Running;
        while phase == Phase::Running {
            if state.ngroups == 1 {
                phase = Phase::Halted;
                continue;
            }
            match merge_step(&mut state, min_center)? {
                StepOutcome::Merged { survivor, removed } => {
                    debug!(
                        "merge {}: slots {} + {} -> {} mass={:.4} ngroups={}",
                        trace.merges.len(),
                        survivor,
                        removed,
                        survivor,
                        state.pro[survivor],
                        state.ngroups
                    );
                    trace.merges.push(MergeStep {
                        iteration: trace.merges.len(),
                        survivor,
                        removed,
                        pooled_mean: state.mu[survivor],
                        pooled_variance: state.sigmasq[survivor],
                        pooled_mass: state.pro[survivor],
                        ngroups_after: state.ngroups,
                    });
                }
                StepOutcome::CenterSatisfied { center } => {
                    debug!(
                        "center {} holds {:.4} >= {}; halting",
                        center, state.pro[center], min_center
                    );
                    phase = Phase::Halted;
                }
            }
        }
        trace.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "CenterCollapser::collapse done ngroups={} center={} merges={} in {:.3} ms",
            state.ngroups,
            state.center,
            trace.merges.len(),
            trace.total_ms
        );
        Ok(CollapseReport { state, trace })
    }
}

/// Collapse `fit` until its central cluster holds at least `min_center` of
/// the total mass, or a single component remains.
pub fn collapse_center(
    fit: MixtureFit,
    min_center: f64,
) -> Result<MixtureState, CollapseError> {
    CenterCollapser::new(CollapseParams { min_center }).collapse(fit)
}
