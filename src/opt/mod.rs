pub mod geometry;
pub mod ilp;
pub mod layout;
pub mod solver;
pub mod sparse;

pub use geometry::{count_leader_crossings, top_line_intersect};
pub use ilp::{classify_pairs, HorizontalPair, IlpModel, PairClasses, SitePair, VarLayout};
pub use layout::{null_solution, realize};
pub use solver::{solve_model, BranchBoundSolver, MilpOracle, MilpOutcome, SolveStatus, TurnSolution, VarBlock};
pub use sparse::{hstack, CscMatrix, TripletMatrix};
