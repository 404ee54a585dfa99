//! The MILP oracle boundary and the built-in solver.
//!
//! The core only ever talks to a [`MilpOracle`]: add binary variables, add
//! sparse `<=` constraint blocks, set a linear minimization objective,
//! optimize. Anything that speaks this interface can be slotted in; the
//! bundled [`BranchBoundSolver`] is an exact implicit-enumeration solver
//! good for small and mid-size instances and for testing the model without
//! a commercial solver.

use log::{debug, info};

use crate::error::{Result, SolverError};
use crate::opt::ilp::IlpModel;
use crate::opt::sparse::{hstack, CscMatrix};

/// A contiguous block of variables returned by [`MilpOracle::add_binary_vars`].
#[derive(Debug, Clone, Copy)]
pub struct VarBlock {
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct MilpOutcome {
    pub status: SolveStatus,
    pub objective: f64,
    pub values: Vec<f64>,
}

/// Minimal interface of a mixed-integer solver, blocking call-and-return.
pub trait MilpOracle {
    fn add_binary_vars(&mut self, n: usize) -> VarBlock;
    /// Append rows `A x <= rhs`; `matrix.ncols` must not exceed the number
    /// of variables added so far.
    fn add_sparse_le_constraints(&mut self, matrix: &CscMatrix, rhs: &[f64]);
    /// Linear objective, minimization sense.
    fn set_objective(&mut self, linear: &[f64]);
    fn optimize(&mut self) -> MilpOutcome;
}

const DEFAULT_NODE_LIMIT: u64 = 10_000_000;
const EPS: f64 = 1e-6;

/// Exact 0/1 solver by depth-first implicit enumeration.
///
/// Branches on variables in index order, cheapest objective value first,
/// pruning a branch when some row cannot be satisfied by any completion or
/// when the objective lower bound cannot beat the incumbent. The node
/// budget stands in for a wall-clock limit; exhausting it reports
/// [`SolveStatus::TimedOut`]. One-shot: build, load, optimize once.
pub struct BranchBoundSolver {
    num_vars: usize,
    rows: Vec<Row>,
    objective: Vec<f64>,
    node_limit: u64,
}

struct Row {
    terms: Vec<(usize, f64)>,
    rhs: f64,
}

impl Default for BranchBoundSolver {
    fn default() -> Self {
        BranchBoundSolver::new()
    }
}

impl BranchBoundSolver {
    pub fn new() -> Self {
        BranchBoundSolver { num_vars: 0, rows: Vec::new(), objective: Vec::new(), node_limit: DEFAULT_NODE_LIMIT }
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = limit;
        self
    }
}

impl MilpOracle for BranchBoundSolver {
    fn add_binary_vars(&mut self, n: usize) -> VarBlock {
        let block = VarBlock { start: self.num_vars, len: n };
        self.num_vars += n;
        block
    }

    fn add_sparse_le_constraints(&mut self, matrix: &CscMatrix, rhs: &[f64]) {
        debug_assert!(matrix.ncols <= self.num_vars);
        debug_assert_eq!(matrix.nrows, rhs.len());
        let base = self.rows.len();
        self.rows
            .extend(rhs.iter().map(|&rhs| Row { terms: Vec::new(), rhs }));
        for col in 0..matrix.ncols {
            for (row, value) in matrix.column(col) {
                self.rows[base + row].terms.push((col, value));
            }
        }
    }

    fn set_objective(&mut self, linear: &[f64]) {
        self.objective = linear.to_vec();
    }

    fn optimize(&mut self) -> MilpOutcome {
        let n = self.num_vars;
        self.objective.resize(n, 0.0);

        // Rows touched by each variable, for incremental bound updates.
        let mut var_rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for (r, row) in self.rows.iter().enumerate() {
            for &(col, value) in &row.terms {
                var_rows[col].push((r, value));
            }
        }

        // lhs_min[r]: smallest LHS any completion of the current partial
        // assignment can reach. Starts with every variable free.
        let mut lhs_min: Vec<f64> = self
            .rows
            .iter()
            .map(|row| row.terms.iter().map(|&(_, v)| v.min(0.0)).sum())
            .collect();
        if lhs_min
            .iter()
            .zip(&self.rows)
            .any(|(&lhs, row)| lhs > row.rhs + EPS)
        {
            return MilpOutcome { status: SolveStatus::Infeasible, objective: f64::NAN, values: Vec::new() };
        }

        // Objective lower bound of the current partial assignment.
        let mut bound: f64 = self.objective.iter().map(|&c| c.min(0.0)).sum();

        let preferred = |var: usize| if self.objective[var] < 0.0 { 1u8 } else { 0u8 };

        let mut stack: Vec<u8> = Vec::with_capacity(n);
        let mut best: Option<(f64, Vec<u8>)> = None;
        let mut nodes: u64 = 0;
        let mut timed_out = false;
        let mut pending: Option<u8> = if n == 0 { None } else { Some(preferred(0)) };

        if n == 0 {
            best = Some((0.0, Vec::new()));
        }

        loop {
            match pending {
                Some(value) => {
                    let var = stack.len();
                    nodes += 1;
                    if nodes > self.node_limit {
                        timed_out = true;
                        break;
                    }

                    // Tentatively assign and check the touched rows plus the bound.
                    let coef = self.objective[var];
                    bound += coef * value as f64 - coef.min(0.0);
                    let mut feasible = true;
                    for &(row, row_value) in &var_rows[var] {
                        lhs_min[row] += row_value * value as f64 - row_value.min(0.0);
                        if lhs_min[row] > self.rows[row].rhs + EPS {
                            feasible = false;
                        }
                    }
                    let promising = match &best {
                        Some((incumbent, _)) => bound < incumbent - EPS,
                        None => true,
                    };

                    if feasible && promising {
                        stack.push(value);
                        if stack.len() == n {
                            debug!("incumbent {bound} after {nodes} nodes");
                            best = Some((bound, stack.clone()));
                            pending = None;
                        } else {
                            pending = Some(preferred(stack.len()));
                        }
                    } else {
                        // Undo and fall through to the sibling value, if any.
                        bound -= coef * value as f64 - coef.min(0.0);
                        for &(row, row_value) in &var_rows[var] {
                            lhs_min[row] -= row_value * value as f64 - row_value.min(0.0);
                        }
                        pending = if value == preferred(var) { Some(1 - value) } else { None };
                    }
                }
                None => {
                    // Backtrack: undo the deepest assignment.
                    let Some(value) = stack.pop() else { break };
                    let var = stack.len();
                    let coef = self.objective[var];
                    bound -= coef * value as f64 - coef.min(0.0);
                    for &(row, row_value) in &var_rows[var] {
                        lhs_min[row] -= row_value * value as f64 - row_value.min(0.0);
                    }
                    pending = if value == preferred(var) { Some(1 - value) } else { None };
                }
            }
        }

        match best {
            _ if timed_out => {
                MilpOutcome { status: SolveStatus::TimedOut, objective: f64::NAN, values: Vec::new() }
            }
            Some((objective, values)) => {
                info!("optimal objective {objective} after {nodes} nodes");
                MilpOutcome {
                    status: SolveStatus::Optimal,
                    objective,
                    values: values.into_iter().map(f64::from).collect(),
                }
            }
            None => MilpOutcome { status: SolveStatus::Infeasible, objective: f64::NAN, values: Vec::new() },
        }
    }
}

/// The solver's answer translated back into tree terms.
#[derive(Debug, Clone)]
pub struct TurnSolution {
    /// Turn flag per internal vertex, indexed by internal total_index.
    pub turns: Vec<bool>,
    pub objective: f64,
}

/// Load the assembled model into the oracle, run it, and read back the turn
/// flags (rounded from possibly slightly fractional values).
pub fn solve_model(model: &IlpModel, oracle: &mut dyn MilpOracle) -> Result<TurnSolution> {
    let layout = model.var_layout();
    let vertex_block = oracle.add_binary_vars(layout.num_vertices);
    oracle.add_binary_vars(model.classes.intersecting.len()); // case picks
    oracle.add_binary_vars(model.classes.fixed.len()); // fixed slacks
    oracle.add_binary_vars(model.classes.intersecting.len()); // intersecting slacks
    oracle.add_binary_vars(model.classes.horizontal.len()); // horizontal slacks

    if !model.classes.fixed.is_empty() {
        let matrix = hstack(
            model.fixed_rhs.len(),
            layout.total,
            &[(0, &model.fixed_vertices), (layout.fixed_slack_offset, &model.fixed_slacks)],
        );
        oracle.add_sparse_le_constraints(&matrix, &model.fixed_rhs);
    }
    if !model.classes.intersecting.is_empty() {
        let matrix = hstack(
            model.intersecting_rhs.len(),
            layout.total,
            &[
                (0, &model.intersecting_vertices),
                (layout.case_offset, &model.intersecting_cases),
                (layout.intersecting_slack_offset, &model.intersecting_slacks),
            ],
        );
        oracle.add_sparse_le_constraints(&matrix, &model.intersecting_rhs);
    }
    if !model.classes.horizontal.is_empty() {
        let matrix = hstack(
            model.horizontal_rhs.len(),
            layout.total,
            &[(0, &model.horizontal_vertices), (layout.horizontal_slack_offset, &model.horizontal_slacks)],
        );
        oracle.add_sparse_le_constraints(&matrix, &model.horizontal_rhs);
    }

    oracle.set_objective(&model.objective());
    let outcome = oracle.optimize();
    match outcome.status {
        SolveStatus::Optimal => Ok(TurnSolution {
            turns: outcome.values[vertex_block.start..vertex_block.start + vertex_block.len]
                .iter()
                .map(|&v| v > 0.5)
                .collect(),
            objective: outcome.objective,
        }),
        SolveStatus::Infeasible => Err(SolverError::Infeasible.into()),
        SolveStatus::Unbounded => Err(SolverError::Unbounded.into()),
        SolveStatus::TimedOut => Err(SolverError::Timeout.into()),
    }
}
