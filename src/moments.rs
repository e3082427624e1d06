//! Closed-form moment pooling for pairs of mixture components.

/// Mass-weighted mean of two components.
///
/// The caller guarantees `pro_l + pro_r > 0`.
#[inline]
pub fn pooled_mean(mu_l: f64, pro_l: f64, mu_r: f64, pro_r: f64) -> f64 {
    (mu_l * pro_l + mu_r * pro_r) / (pro_l + pro_r)
}

/// Variance of the two-component sub-mixture: the mass-weighted second
/// moment about zero minus the squared pooled mean.
#[inline]
pub fn pooled_variance(
    mu_l: f64,
    var_l: f64,
    pro_l: f64,
    mu_r: f64,
    var_r: f64,
    pro_r: f64,
) -> f64 {
    let mean = pooled_mean(mu_l, pro_l, mu_r, pro_r);
    (pro_l * (var_l + mu_l * mu_l) + pro_r * (var_r + mu_r * mu_r)) / (pro_l + pro_r)
        - mean * mean
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn mean_weights_by_mass() {
        assert!(approx_eq(pooled_mean(1.0, 0.3, -2.0, 0.1), 0.25));
        assert!(approx_eq(pooled_mean(0.5, 0.2, 0.5, 0.6), 0.5));
    }

    #[test]
    fn point_masses_pool_to_spread_variance() {
        // Two point masses at 0 and 2 with equal weight: mean 1, variance 1.
        assert!(approx_eq(pooled_variance(0.0, 0.0, 0.5, 2.0, 0.0, 0.5), 1.0));
    }

    #[test]
    fn coincident_components_keep_their_variance() {
        assert!(approx_eq(
            pooled_variance(0.7, 0.04, 0.3, 0.7, 0.04, 0.5),
            0.04
        ));
    }

    #[test]
    fn matches_hand_computed_near_zero_pair() {
        let mean = pooled_mean(-0.02205, 0.2, 0.03059, 0.2);
        assert!(approx_eq(mean, 0.00427));
        let var = pooled_variance(-0.02205, 0.01, 0.2, 0.03059, 0.01, 0.2);
        assert!((var - 0.0106927424).abs() < 1e-9);
    }
}
