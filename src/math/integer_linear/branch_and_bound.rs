use crate::error::Result;
use crate::math::integer_linear::{ILPSolution, ILPSolver, IntegerLinearProgram};
use crate::math::optimization::simplex::{minimize, LinearProgram};
use crate::math::optimization::{OptimizationConfig, SolveStatus};

/// Depth-first branch and bound over LP relaxations solved by the simplex.
pub struct BranchAndBoundSolver {
    max_nodes: usize,
    tolerance: f64,
    config: OptimizationConfig<f64>,
}

impl BranchAndBoundSolver {
    pub fn new(max_nodes: usize, tolerance: f64, config: OptimizationConfig<f64>) -> Self {
        Self {
            max_nodes,
            tolerance,
            config,
        }
    }

    fn is_integer(&self, value: f64) -> bool {
        (value - value.round()).abs() < self.tolerance
    }

    fn branch(
        &self,
        program: &LinearProgram<f64>,
        var_idx: usize,
        value: f64,
    ) -> (LinearProgram<f64>, LinearProgram<f64>) {
        let mut lower_branch = program.clone();
        let mut upper_branch = program.clone();

        // x_i <= floor(value)
        let mut lower_constraint = vec![0.0; program.objective.len()];
        lower_constraint[var_idx] = 1.0;
        lower_branch.constraints.push(lower_constraint);
        lower_branch.rhs.push(value.floor());

        // x_i >= ceil(value), stored as -x_i <= -ceil(value)
        let mut upper_constraint = vec![0.0; program.objective.len()];
        upper_constraint[var_idx] = -1.0;
        upper_branch.constraints.push(upper_constraint);
        upper_branch.rhs.push(-value.ceil());

        (lower_branch, upper_branch)
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new(10_000, 1e-6, OptimizationConfig::default())
    }
}

impl ILPSolver for BranchAndBoundSolver {
    fn solve(&self, problem: &IntegerLinearProgram) -> Result<ILPSolution> {
        let mut best: Option<(Vec<f64>, f64)> = None;
        let mut nodes = vec![problem.program.clone()];
        let mut iterations = 0;
        let mut root_status = None;

        while let Some(current) = nodes.pop() {
            if iterations >= self.max_nodes {
                nodes.push(current);
                break;
            }
            iterations += 1;

            let relaxation = minimize(&current, &self.config);
            if root_status.is_none() {
                root_status = Some(relaxation.status);
            }
            if relaxation.status != SolveStatus::Optimal {
                continue;
            }

            // Prune nodes that cannot improve on the incumbent
            if let Some((_, best_value)) = &best {
                if relaxation.optimal_value >= *best_value - self.tolerance {
                    continue;
                }
            }

            let fractional = problem
                .integer_vars
                .iter()
                .map(|&i| (i, relaxation.optimal_point[i]))
                .find(|&(_, value)| !self.is_integer(value));

            match fractional {
                None => best = Some((relaxation.optimal_point, relaxation.optimal_value)),
                Some((var_idx, value)) => {
                    let (lower, upper) = self.branch(&current, var_idx, value);
                    nodes.push(upper);
                    nodes.push(lower);
                }
            }
        }

        log::debug!(
            "branch and bound explored {} nodes, {} left open",
            iterations,
            nodes.len()
        );

        let exhausted = nodes.is_empty();
        Ok(match best {
            Some((mut values, objective_value)) => {
                for &i in &problem.integer_vars {
                    values[i] = values[i].round();
                }
                ILPSolution {
                    values,
                    objective_value,
                    status: if exhausted {
                        SolveStatus::Optimal
                    } else {
                        SolveStatus::MaxIterationsReached
                    },
                    nodes: iterations,
                }
            }
            None => ILPSolution {
                values: Vec::new(),
                objective_value: f64::NAN,
                status: match root_status {
                    Some(SolveStatus::Unbounded) => SolveStatus::Unbounded,
                    _ if !exhausted => SolveStatus::MaxIterationsReached,
                    _ => SolveStatus::Infeasible,
                },
                nodes: iterations,
            },
        })
    }
}
