/// One `coef·Δj` term with an explicit sign. Coefficients below `zero_tolerance` print as `+0.00`.
pub fn format_term(coefficient: f64, index: usize, zero_tolerance: f64) -> String {
    if coefficient.abs() < zero_tolerance {
        format!("{:+.2}·Δ{}", 0.0, index)
    } else {
        let sign = if coefficient >= 0.0 { '+' } else { '-' };
        format!("{} {:.2}·Δ{}", sign, coefficient.abs(), index)
    }
}

/// Render `Σ coef_j·Δj + constant ≥ 0` with 1-based perturbation indices
pub fn format_condition(coefficients: &[f64], constant: f64, zero_tolerance: f64) -> String {
    let terms: Vec<String> = coefficients
        .iter()
        .enumerate()
        .map(|(j, &coef)| format_term(coef, j + 1, zero_tolerance))
        .collect();
    let sign = if constant < 0.0 && constant.abs() >= zero_tolerance { '-' } else { '+' };
    let constant = if constant.abs() < zero_tolerance { 0.0 } else { constant.abs() };
    format!("{} {} {:.2} ≥ 0", terms.join(" "), sign, constant)
}
