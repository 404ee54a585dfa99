//! Convenience re-exports for the most commonly used types.
//!
//! ```rust
//! use geophylo::prelude::*;
//! ```

// ── Errors ───────────────────────────────────────────────────────────────────
pub use crate::error::{Error, Result, SolverError};

// ── Input parsing ────────────────────────────────────────────────────────────
pub use crate::input::geo::{csv_to_feature_collection, instance_from_features, mercator};
pub use crate::input::newick::{parse_newick, ParsedTree};

// ── Model ────────────────────────────────────────────────────────────────────
pub use crate::model::instance::{Instance, LeaderType, SitePos, SolveOptions, Solution, TreeNode};
pub use crate::model::tree::{GeoTree, Point, VertexIndex, VertexKind};

// ── Optimization ─────────────────────────────────────────────────────────────
pub use crate::opt::geometry::{count_leader_crossings, top_line_intersect};
pub use crate::opt::ilp::{classify_pairs, IlpModel, PairClasses};
pub use crate::opt::layout::{null_solution, realize};
pub use crate::opt::solver::{
    solve_model, BranchBoundSolver, MilpOracle, MilpOutcome, SolveStatus, TurnSolution, VarBlock,
};
pub use crate::opt::sparse::{CscMatrix, TripletMatrix};

// ── One-shot helpers ─────────────────────────────────────────────────────────
pub use crate::{build_instance, preview_solution, solve_instance};
