use std::path::PathBuf;

use clap::Args;

use geophylo::error::{Error, Result};
use geophylo::model::instance::{Instance, SolveOptions};
use geophylo::opt::solver::BranchBoundSolver;

use crate::output::write_output;

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Path to an instance JSON file produced by `parse`.
    pub instance: PathBuf,

    /// Output JSON to a file (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Leader type: s (straight) or po (orthogonal).
    #[arg(short = 'l', long = "ltype", default_value = "s")]
    pub ltype: String,

    /// Minimum gap between the horizontal runs of po leaders.
    #[arg(short = 'g', long = "pogap", default_value_t = 0.0)]
    pub pogap: f64,

    /// Node budget for the built-in solver.
    #[arg(long)]
    pub node_limit: Option<u64>,
}

pub fn run(args: OptimizeArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.instance).map_err(|e| Error::InputParse {
        input: "instance file",
        message: format!("{}: {e}", args.instance.display()),
    })?;
    let instance: Instance = serde_json::from_str(&raw).map_err(|e| Error::InputParse {
        input: "instance",
        message: e.to_string(),
    })?;

    let options = SolveOptions { leader_type: args.ltype.parse()?, po_gap: args.pogap };

    let mut solver = BranchBoundSolver::new();
    if let Some(limit) = args.node_limit {
        solver = solver.with_node_limit(limit);
    }
    let solution = geophylo::solve_instance(&instance, &options, &mut solver)?;

    let json = serde_json::to_string(&solution)
        .map_err(|e| Error::Internal(format!("solution serialization failed: {e}")))?;
    write_output(&json, args.output.as_deref())
}
