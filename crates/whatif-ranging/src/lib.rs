/*!
Right-hand-side what-if analysis for optimal linear programs.

Given an optimal solution, decide whether changing several constraint limits at once
keeps the optimal basis feasible, and if it does, how much the objective moves.

The solver is treated as an oracle ([`LpOracle`]). Instead of reading the basis inverse
off a final tableau, each constraint's right-hand side is raised by one unit and the
problem re-solved; the change in the augmented optimum (decision variables followed by
constraint residuals against the original limits) is that constraint's sensitivity
column. Those columns turn any perturbation `Δ` into one linear inequality per
constraint row. When they all hold, shadow prices price the change.

# Example

```
use whatif_ranging::Session;
use whatif_solver::{ConstraintOp, LpProblem, Solver};

// Maximize 12x1 + 60x2 subject to 2x1 + x2 <= 250 and x1 + x2 <= 180
let problem = LpProblem::from_parts(
    vec![12.0, 60.0],
    vec![vec![2.0, 1.0], vec![1.0, 1.0]],
    vec![250.0, 180.0],
    vec![ConstraintOp::Le, ConstraintOp::Le],
    false,
)
.unwrap();

let solver = Solver::new();
let session = Session::solve(&solver, &problem).unwrap();

// 50 more units of the first resource
let result = session.run(&solver, &[50.0, 0.0]).unwrap();
assert!(result.viable);
assert_eq!(result.impact.unwrap().z_new, 10800.0);
```

The method assumes each unit perturbation keeps the optimal basis. When a perturbed
optimum lands on a different set of non-zero variables a warning is logged and the
constraint is listed in [`RangingResult::basis_shifts`].
*/

mod analyze;
mod augment;
mod error;
mod estimate;
mod format;
mod impact;
mod oracle;
mod session;

pub use analyze::{FEASIBILITY_TOLERANCE, Feasibility, RangingCondition, Tolerances, Verdict, ZERO_TOLERANCE, analyze};
pub use augment::{augment, residual};
pub use error::RangingError;
pub use estimate::{Estimator, SensitivityColumns};
pub use format::{format_condition, format_term};
pub use impact::{ProfitImpact, impact};
pub use oracle::{FnOracle, LpOracle};
pub use session::{RangingResult, Session};
