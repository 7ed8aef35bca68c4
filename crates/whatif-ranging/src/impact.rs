/// Change in the optimal objective caused by a right-hand-side perturbation
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitImpact {
    pub delta_z: f64,
    pub z_new: f64,
}

/// Shadow-price extrapolation of the objective.
///
/// Shadow prices only hold inside the feasible ranging region, so a non-viable
/// perturbation returns the baseline objective untouched. Lengths are expected to
/// match; extra entries in either slice are ignored.
pub fn impact(shadow_prices: &[f64], delta: &[f64], z0: f64, viable: bool) -> ProfitImpact {
    if !viable {
        return ProfitImpact { delta_z: 0.0, z_new: z0 };
    }
    let delta_z: f64 = shadow_prices.iter().zip(delta).map(|(y, d)| y * d).sum();
    ProfitImpact {
        delta_z,
        z_new: z0 + delta_z,
    }
}
