//! Input record describing a fitted one-dimensional Gaussian mixture.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Mixture fit as delivered by an upstream EM run.
///
/// `pro` and `groups` may be omitted: a missing `pro` is materialized as the
/// uniform distribution and a missing `groups` as the identity partition when
/// the working state is built. `groups` carries the membership of original
/// components in current components, so a fit that already went through a
/// collapse can be fed back in with its accumulated partition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MixtureFit {
    /// Component means.
    pub mu: DVector<f64>,
    /// Mixing proportions; uniform when omitted.
    #[serde(default)]
    pub pro: Option<DVector<f64>>,
    /// Posterior responsibilities, one row per observation, one column per
    /// component.
    pub z: DMatrix<f64>,
    /// 0/1 membership of original components (columns) in current components
    /// (rows); identity when omitted.
    #[serde(default)]
    pub groups: Option<DMatrix<u8>>,
    /// Declared component count; every other dimension is checked against it.
    pub ngroups: usize,
    /// Component variances.
    pub sigmasq: DVector<f64>,
}

impl MixtureFit {
    /// Build a fit record from the mandatory pieces, deriving `ngroups` from
    /// `mu` and leaving `pro`/`groups` to their defaults.
    pub fn new(mu: DVector<f64>, z: DMatrix<f64>, sigmasq: DVector<f64>) -> Self {
        let ngroups = mu.len();
        Self {
            mu,
            pro: None,
            z,
            groups: None,
            ngroups,
            sigmasq,
        }
    }

    /// Supply explicit mixing proportions.
    pub fn with_pro(mut self, pro: DVector<f64>) -> Self {
        self.pro = Some(pro);
        self
    }

    /// Supply a membership partition carried over from an earlier collapse.
    pub fn with_groups(mut self, groups: DMatrix<u8>) -> Self {
        self.groups = Some(groups);
        self
    }
}
