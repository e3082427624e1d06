//! Working mixture state mutated in place by successive merges.

use crate::error::CollapseError;
use crate::fit::MixtureFit;
use crate::moments::{pooled_mean, pooled_variance};

use log::warn;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Mutable mixture record threaded through the merge loop.
///
/// The five sequence/matrix fields are co-indexed by current component slot
/// (0-based): `mu`, `pro`, `sigmasq`, the columns of `z` and the rows of
/// `groups` all refer to the same component at the same index and shrink
/// together when a merge drops a slot. Columns of `groups` stay fixed at the
/// original component count and record which original components each current
/// component has absorbed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MixtureState {
    pub mu: DVector<f64>,
    pub pro: DVector<f64>,
    pub z: DMatrix<f64>,
    pub groups: DMatrix<u8>,
    pub ngroups: usize,
    pub sigmasq: DVector<f64>,
    /// Slot of the component whose mean is closest to zero (0-based).
    pub center: usize,
}

impl MixtureState {
    /// Build the working state from an upstream fit.
    ///
    /// Consumes the fit, materializes the optional fields (uniform `pro`,
    /// identity `groups`), checks every dimension against `ngroups` and
    /// locates the initial center component. Ties on |mean| go to the lowest
    /// slot.
    pub fn from_fit(fit: MixtureFit) -> Result<Self, CollapseError> {
        let MixtureFit {
            mu,
            pro,
            z,
            groups,
            ngroups,
            sigmasq,
        } = fit;
        if ngroups == 0 {
            return Err(CollapseError::DimensionMismatch {
                field: "ngroups",
                expected: 1,
                found: 0,
            });
        }
        check_len("mu", mu.len(), ngroups)?;
        check_len("sigmasq", sigmasq.len(), ngroups)?;
        check_len("z columns", z.ncols(), ngroups)?;
        let pro = match pro {
            Some(p) => {
                check_len("pro", p.len(), ngroups)?;
                p
            }
            None => DVector::from_element(ngroups, 1.0 / ngroups as f64),
        };
        let groups = match groups {
            Some(g) => {
                check_len("groups rows", g.nrows(), ngroups)?;
                g
            }
            None => DMatrix::identity(ngroups, ngroups),
        };
        let center = closest_to_zero(&mu);
        Ok(Self {
            mu,
            pro,
            z,
            groups,
            ngroups,
            sigmasq,
            center,
        })
    }

    /// Pool components `gl` and `gr` (`gl < gr`) into slot `gl` and drop slot
    /// `gr`, shifting every higher slot down by one across all five
    /// co-indexed structures in the same step.
    pub(crate) fn merge_pair(&mut self, gl: usize, gr: usize) {
        debug_assert!(gl < gr && gr < self.ngroups);

        let mass = self.pro[gl] + self.pro[gr];
        let mean = pooled_mean(self.mu[gl], self.pro[gl], self.mu[gr], self.pro[gr]);
        let mut var = pooled_variance(
            self.mu[gl],
            self.sigmasq[gl],
            self.pro[gl],
            self.mu[gr],
            self.sigmasq[gr],
            self.pro[gr],
        );
        if var < 0.0 {
            // Cancellation in the second-moment difference can land a hair
            // below zero when both variances are tiny.
            warn!("MixtureState::merge_pair pooled variance {var:.3e} clamped to 0");
            var = 0.0;
        }

        let pooled_z = self.z.column(gl) + self.z.column(gr);
        self.z.set_column(gl, &pooled_z);
        let pooled_members = self
            .groups
            .row(gl)
            .zip_map(&self.groups.row(gr), |a, b| a | b);
        self.groups.set_row(gl, &pooled_members);

        self.mu[gl] = mean;
        self.sigmasq[gl] = var;
        self.pro[gl] = mass;

        let z = std::mem::replace(&mut self.z, DMatrix::zeros(0, 0));
        self.z = z.remove_column(gr);
        let groups = std::mem::replace(&mut self.groups, DMatrix::zeros(0, 0));
        self.groups = groups.remove_row(gr);
        let mu = std::mem::replace(&mut self.mu, DVector::zeros(0));
        self.mu = mu.remove_row(gr);
        let pro = std::mem::replace(&mut self.pro, DVector::zeros(0));
        self.pro = pro.remove_row(gr);
        let sigmasq = std::mem::replace(&mut self.sigmasq, DVector::zeros(0));
        self.sigmasq = sigmasq.remove_row(gr);

        self.ngroups -= 1;
        self.center = gl;
    }

    /// Total mixing mass across current components.
    pub fn total_mass(&self) -> f64 {
        self.pro.sum()
    }

    /// Original component indices absorbed by current component `k`.
    pub fn members_of(&self, k: usize) -> Vec<usize> {
        self.groups
            .row(k)
            .iter()
            .enumerate()
            .filter_map(|(i0, &m)| (m != 0).then_some(i0))
            .collect()
    }

    /// Hard cluster label per observation: the component with the largest
    /// responsibility, earliest slot on ties.
    pub fn hard_labels(&self) -> Vec<usize> {
        (0..self.z.nrows())
            .map(|i| {
                let row = self.z.row(i);
                let mut best = 0;
                for k in 1..row.ncols() {
                    if row[k] > row[best] {
                        best = k;
                    }
                }
                best
            })
            .collect()
    }
}

fn check_len(field: &'static str, found: usize, expected: usize) -> Result<(), CollapseError> {
    if found == expected {
        Ok(())
    } else {
        Err(CollapseError::DimensionMismatch {
            field,
            expected,
            found,
        })
    }
}

/// Slot of the component with smallest absolute mean, first slot on ties.
pub(crate) fn closest_to_zero(mu: &DVector<f64>) -> usize {
    let mut best = 0;
    for (k, m) in mu.iter().enumerate().skip(1) {
        if m.abs() < mu[best].abs() {
            best = k;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_component_fit() -> MixtureFit {
        let mu = DVector::from_vec(vec![-0.4, 0.05, 0.6]);
        let z = DMatrix::from_row_slice(2, 3, &[0.2, 0.5, 0.3, 0.1, 0.8, 0.1]);
        let sigmasq = DVector::from_element(3, 0.02);
        MixtureFit::new(mu, z, sigmasq)
    }

    #[test]
    fn defaults_are_uniform_pro_and_identity_groups() {
        let state = MixtureState::from_fit(three_component_fit()).expect("consistent fit");
        assert_eq!(state.ngroups, 3);
        assert_eq!(state.center, 1);
        for k in 0..3 {
            assert!((state.pro[k] - 1.0 / 3.0).abs() < 1e-15);
            assert_eq!(state.members_of(k), vec![k]);
        }
    }

    #[test]
    fn center_tie_goes_to_lowest_slot() {
        let mu = DVector::from_vec(vec![0.5, -0.5, 1.0]);
        let z = DMatrix::from_element(1, 3, 1.0 / 3.0);
        let sigmasq = DVector::from_element(3, 0.1);
        let state = MixtureState::from_fit(MixtureFit::new(mu, z, sigmasq)).unwrap();
        assert_eq!(state.center, 0);
    }

    #[test]
    fn rejects_inconsistent_dimensions() {
        let fit = three_component_fit().with_pro(DVector::from_element(2, 0.5));
        assert!(matches!(
            MixtureState::from_fit(fit),
            Err(CollapseError::DimensionMismatch { field: "pro", .. })
        ));

        let mut fit = three_component_fit();
        fit.ngroups = 4;
        assert!(matches!(
            MixtureState::from_fit(fit),
            Err(CollapseError::DimensionMismatch { field: "mu", .. })
        ));
    }

    #[test]
    fn rejects_empty_mixture() {
        let fit = MixtureFit::new(
            DVector::zeros(0),
            DMatrix::zeros(2, 0),
            DVector::zeros(0),
        );
        assert!(matches!(
            MixtureState::from_fit(fit),
            Err(CollapseError::DimensionMismatch { field: "ngroups", .. })
        ));
    }

    #[test]
    fn merge_pair_reindexes_all_structures_together() {
        let mut state = MixtureState::from_fit(three_component_fit()).unwrap();
        state.merge_pair(0, 1);

        assert_eq!(state.ngroups, 2);
        assert_eq!(state.mu.len(), 2);
        assert_eq!(state.pro.len(), 2);
        assert_eq!(state.sigmasq.len(), 2);
        assert_eq!(state.z.ncols(), 2);
        assert_eq!(state.groups.nrows(), 2);
        assert_eq!(state.groups.ncols(), 3);
        assert_eq!(state.center, 0);

        // Slot 0 absorbed original components 0 and 1; old slot 2 shifted
        // down to slot 1.
        assert_eq!(state.members_of(0), vec![0, 1]);
        assert_eq!(state.members_of(1), vec![2]);
        assert!((state.mu[1] - 0.6).abs() < 1e-15);

        // Responsibility columns summed, rows still sum to 1.
        assert!((state.z[(0, 0)] - 0.7).abs() < 1e-15);
        assert!((state.z[(1, 0)] - 0.9).abs() < 1e-15);
        for i in 0..2 {
            let row_sum: f64 = state.z.row(i).iter().sum();
            assert!((row_sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn merge_pair_pools_mass_and_moments() {
        let mu = DVector::from_vec(vec![-1.0, 1.0]);
        let z = DMatrix::from_element(1, 2, 0.5);
        let sigmasq = DVector::from_vec(vec![0.0, 0.0]);
        let fit = MixtureFit::new(mu, z, sigmasq).with_pro(DVector::from_vec(vec![0.5, 0.5]));
        let mut state = MixtureState::from_fit(fit).unwrap();
        state.merge_pair(0, 1);

        assert_eq!(state.ngroups, 1);
        assert!((state.pro[0] - 1.0).abs() < 1e-15);
        assert!(state.mu[0].abs() < 1e-15);
        // Point masses at -1 and 1 with equal weight pool to unit variance.
        assert!((state.sigmasq[0] - 1.0).abs() < 1e-12);
        assert!((state.total_mass() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hard_labels_pick_largest_responsibility() {
        let state = MixtureState::from_fit(three_component_fit()).unwrap();
        assert_eq!(state.hard_labels(), vec![1, 1]);
    }
}
