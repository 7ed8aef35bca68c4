use whatif_solver::{Constraint, ConstraintOp, LpProblem};

/// Residual of one constraint at `x`: slack for `<=`, surplus for `>=`, `b - A·x` for `=`
pub fn residual(constraint: &Constraint, x: &[f64]) -> f64 {
    let lhs = constraint.lhs(x);
    match constraint.op {
        ConstraintOp::Le | ConstraintOp::Eq => constraint.rhs - lhs,
        ConstraintOp::Ge => lhs - constraint.rhs,
    }
}

/// Tableau row values for a point: the decision variables followed by one residual per constraint
pub fn augment(problem: &LpProblem, x: &[f64]) -> Vec<f64> {
    x.iter()
        .copied()
        .chain(problem.constraints.iter().map(|c| residual(c, x)))
        .collect()
}
