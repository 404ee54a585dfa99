//! Crossing-minimal layout of a phylogenetic tree drawn next to a map.
//!
//! Each tree leaf is connected to its geographic site by a leader line; the
//! library decides, per internal vertex, whether to swap the two subtrees so
//! that the leaders cross as few times as possible.
//!
//! # Pipeline
//!
//! ```text
//! Newick + GeoJSON/CSV  →  Instance  →  GeoTree  →  IlpModel  →  MilpOracle  →  Solution
//! ```
//!
//! 1. Parse the tree with [`input::newick::parse_newick`] and the sites with
//!    [`input::geo`], then bind them into an [`model::Instance`], or do both
//!    in one step with [`build_instance`].
//! 2. Build the solve model ([`model::GeoTree`]) and the 0/1 program
//!    ([`opt::IlpModel`]).
//! 3. Hand the program to a [`opt::MilpOracle`] (the bundled
//!    [`opt::BranchBoundSolver`], or any external MILP solver behind the same
//!    trait) and realize the turn vector into a [`model::Solution`], or do
//!    all of it with [`solve_instance`].
//!
//! # Example
//!
//! ```rust
//! use geophylo::prelude::*;
//!
//! let geo = serde_json::json!({
//!     "type": "FeatureCollection",
//!     "features": [
//!         { "type": "Feature", "geometry": { "type": "Point", "coordinates": [0.0, 10.0] } },
//!         { "type": "Feature", "geometry": { "type": "Point", "coordinates": [10.0, 10.0] } },
//!     ],
//! });
//! let instance = geophylo::build_instance("(A,B);", "two taxa", &geo, 0.2, "").unwrap();
//!
//! let mut solver = BranchBoundSolver::new();
//! let solution = geophylo::solve_instance(&instance, &SolveOptions::default(), &mut solver).unwrap();
//! assert_eq!(solution.num_intersections, 0);
//! ```
//!
//! The solve is single-threaded and owns its model exclusively; run several
//! solves in parallel by giving each its own instance and oracle.

pub mod error;
pub mod input;
pub mod model;
pub mod opt;
pub mod prelude;

pub use error::{Error, Result};

use model::instance::{Instance, Solution, SolveOptions};
use model::tree::GeoTree;
use opt::ilp::IlpModel;
use opt::solver::MilpOracle;

/// Parse a Newick string and a GeoJSON FeatureCollection value, bind leaves
/// to sites, and assemble the instance record in one call.
///
/// With an empty `connect_by` the i-th leaf takes the i-th feature;
/// otherwise leaves are matched to features by the named property.
/// `rel_padding` is the padding fraction around the site bounding box and
/// must lie in `[0, 1]`.
pub fn build_instance(
    newick: &str,
    title: &str,
    geo: &serde_json::Value,
    rel_padding: f64,
    connect_by: &str,
) -> Result<Instance> {
    let parsed = input::newick::parse_newick(newick, title)?;
    input::geo::instance_from_features(&parsed, geo, rel_padding, connect_by)
}

/// Run the whole optimization for one instance: build the tree model and the
/// 0/1 program, solve it with `oracle`, and realize the layout.
pub fn solve_instance(
    instance: &Instance,
    options: &SolveOptions,
    oracle: &mut dyn MilpOracle,
) -> Result<Solution> {
    let tree = GeoTree::from_instance(instance, options)?;
    let model = IlpModel::build(&tree)?;
    let turns = opt::solver::solve_model(&model, oracle)?;
    Ok(opt::layout::realize(&tree, &turns.turns, turns.objective))
}

/// The all-zero-turns preview solution for an instance.
pub fn preview_solution(instance: &Instance, options: &SolveOptions) -> Result<Solution> {
    let tree = GeoTree::from_instance(instance, options)?;
    Ok(opt::layout::null_solution(&tree))
}
