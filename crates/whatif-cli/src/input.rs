use std::path::Path;

use serde::Deserialize;
use whatif_solver::{ConstraintOp, LpProblem, ProblemError};

/// Problem file layout:
///
/// ```json
/// {
///   "objective": [12, 60],
///   "constraints": [
///     { "name": "wood", "coefficients": [2, 1], "op": "<=", "rhs": 250 },
///     { "coefficients": [1, 1], "op": "<=", "rhs": 180 }
///   ]
/// }
/// ```
///
/// `variables` and constraint names are optional; `minimize` defaults to false.
#[derive(Debug, Deserialize)]
pub struct ProblemFile {
    #[serde(default)]
    pub variables: Vec<String>,
    pub objective: Vec<f64>,
    #[serde(default)]
    pub minimize: bool,
    pub constraints: Vec<ConstraintSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ConstraintSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

impl ProblemFile {
    pub fn parse(source: &str) -> Result<Self, String> {
        serde_json::from_str(source).map_err(|e| format!("Invalid problem file: {}", e))
    }

    pub fn into_problem(self) -> Result<LpProblem, ProblemError> {
        let variables = if self.variables.is_empty() {
            (1..=self.objective.len()).map(|j| format!("x{}", j)).collect()
        } else {
            self.variables
        };

        let mut problem = LpProblem::new(variables);
        problem.set_objective(self.objective, self.minimize);
        for (i, c) in self.constraints.into_iter().enumerate() {
            let name = c.name.unwrap_or_else(|| format!("R{}", i + 1));
            problem.add_constraint(name, c.coefficients, c.op, c.rhs);
        }
        problem.validate()?;
        Ok(problem)
    }
}

pub fn load_problem(path: &Path) -> Result<LpProblem, String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("Error reading file: {}", e))?;
    ProblemFile::parse(&source)?
        .into_problem()
        .map_err(|e| format!("Invalid problem: {}", e))
}
