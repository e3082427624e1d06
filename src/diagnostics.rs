//! Merge-trace diagnostics returned alongside the collapsed state.
//!
//! `CollapseReport` is the entry point returned by
//! [`CenterCollapser::collapse_with_diagnostics`](crate::CenterCollapser::collapse_with_diagnostics),
//! bundling the final [`MixtureState`] with a `CollapseTrace` describing every
//! merge the loop executed.

use crate::state::MixtureState;
use serde::{Deserialize, Serialize};

/// One pooling step performed by the collapse loop.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStep {
    /// 0-based position of this merge in the run.
    pub iteration: usize,
    /// Slot that absorbed the pair.
    pub survivor: usize,
    /// Slot dropped by the merge (index before reindexing).
    pub removed: usize,
    pub pooled_mean: f64,
    pub pooled_variance: f64,
    pub pooled_mass: f64,
    pub ngroups_after: usize,
}

/// Aggregated trace of a collapse run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapseTrace {
    pub initial_ngroups: usize,
    pub merges: Vec<MergeStep>,
    pub total_ms: f64,
}

/// Collapsed state together with the trace of merges that produced it.
#[derive(Clone, Debug, Serialize)]
pub struct CollapseReport {
    pub state: MixtureState,
    pub trace: CollapseTrace,
}
