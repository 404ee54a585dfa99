//! Assembly of the crossing-minimization 0/1 program.
//!
//! Every unordered pair of distinct sites falls into one of three classes:
//!
//! * **horizontal** (`po` leaders only): the sites are closer in y than the
//!   configured gap, so their horizontal runs share a corridor and must be
//!   strictly ordered left to right;
//! * **intersecting**: the line through the sites crosses the top line
//!   strictly between the first and last slot, so whether the leaders cross
//!   depends on which side the lower site's leaf ends up on; a per-pair
//!   binary case variable picks the side;
//! * **fixed**: the crossing lies at or beyond the ends of the top line and
//!   the conflict-free left-right order is decided by topology alone.
//!
//! Each pair contributes rows that force the conflict-free order, plus one
//! slack variable that lets the solver give up on the pair at a cost of one.
//! Minimizing the slack sum therefore minimizes the number of crossing
//! leader pairs. Case variables use big-M, slack variables big-N = 2M, so an
//! active slack dominates every other term in its rows.
//!
//! Rows are collected as triplets and compressed to CSC per class, keeping
//! the assembly linear in the O(|L|^2) row count but sparse in nonzeros.
//! Pairs of coincident sites are dropped up front; their leaders are
//! translates of each other and contribute no crossing either way.

use log::{debug, info};

use crate::error::Result;
use crate::model::instance::LeaderType;
use crate::model::tree::GeoTree;
use crate::opt::geometry::top_line_intersect;
use crate::opt::sparse::{CscMatrix, TripletMatrix};

/// A site pair routed through the top-line intersection predicate.
#[derive(Debug, Clone, Copy)]
pub struct SitePair {
    pub site1: usize,
    pub site2: usize,
    /// Top-line crossing position scaled to `[0, |L|-1]` (sentinels outside).
    pub intersect_index: f64,
    pub site1_lower: bool,
}

/// A `po` pair sharing a horizontal corridor.
#[derive(Debug, Clone, Copy)]
pub struct HorizontalPair {
    pub site1: usize,
    pub site2: usize,
    pub site1_left: bool,
}

/// The three disjoint pair classes of one instance.
#[derive(Debug, Default)]
pub struct PairClasses {
    pub fixed: Vec<SitePair>,
    pub intersecting: Vec<SitePair>,
    pub horizontal: Vec<HorizontalPair>,
    /// Coincident-position pairs dropped from the model.
    pub dropped: usize,
}

/// Partition all site pairs `(i, j)`, `i < j`, into the three classes.
pub fn classify_pairs(tree: &GeoTree) -> PairClasses {
    let sites = tree.sites();
    let n = tree.num_leaves();
    let mut classes = PairClasses::default();

    for i in 0..sites.len() {
        for j in i + 1..sites.len() {
            let p1 = sites[i].pos;
            let p2 = sites[j].pos;
            if p1 == p2 {
                classes.dropped += 1;
                continue;
            }
            if tree.leader_type() == LeaderType::Orthogonal && (p1.y - p2.y).abs() < tree.po_gap() {
                classes.horizontal.push(HorizontalPair { site1: i, site2: j, site1_left: p1.x < p2.x });
                continue;
            }
            let (intersect_index, site1_lower) = top_line_intersect(tree, p1, p2);
            let pair = SitePair { site1: i, site2: j, intersect_index, site1_lower };
            if intersect_index > 0.0 && intersect_index < (n - 1) as f64 {
                classes.intersecting.push(pair);
            } else {
                classes.fixed.push(pair);
            }
        }
    }

    info!(
        "classified {} site pairs: {} fixed, {} intersecting, {} horizontal, {} dropped",
        classes.fixed.len() + classes.intersecting.len() + classes.horizontal.len() + classes.dropped,
        classes.fixed.len(),
        classes.intersecting.len(),
        classes.horizontal.len(),
        classes.dropped
    );
    classes
}

/// Offsets of the variable blocks in the oracle's variable space.
///
/// Order: vertex turn flags, case picks, then the fixed / intersecting /
/// horizontal slack blocks.
#[derive(Debug, Clone, Copy)]
pub struct VarLayout {
    pub num_vertices: usize,
    pub case_offset: usize,
    pub fixed_slack_offset: usize,
    pub intersecting_slack_offset: usize,
    pub horizontal_slack_offset: usize,
    pub total: usize,
}

/// The assembled program: per-class constraint blocks over the turn
/// variables, plus the case and slack blocks big-M-coupled to them.
#[derive(Debug)]
pub struct IlpModel {
    pub classes: PairClasses,
    pub num_vertex_vars: usize,

    /// One row per fixed pair over the turn variables.
    pub fixed_vertices: CscMatrix,
    pub fixed_slacks: CscMatrix,
    pub fixed_rhs: Vec<f64>,

    /// Four rows per intersecting pair (two per case).
    pub intersecting_vertices: CscMatrix,
    pub intersecting_cases: CscMatrix,
    pub intersecting_slacks: CscMatrix,
    pub intersecting_rhs: Vec<f64>,

    /// Three rows per horizontal pair.
    pub horizontal_vertices: CscMatrix,
    pub horizontal_slacks: CscMatrix,
    pub horizontal_rhs: Vec<f64>,

    pub big_m: f64,
    pub big_n: f64,
}

impl IlpModel {
    pub fn build(tree: &GeoTree) -> Result<IlpModel> {
        let classes = classify_pairs(tree);
        IlpModel::from_classes(tree, classes)
    }

    pub fn from_classes(tree: &GeoTree, classes: PairClasses) -> Result<IlpModel> {
        let num_vertices = tree.num_internals();
        let big_m = tree.num_leaves() as f64;
        let big_n = 2.0 * big_m;
        // Worst-case nonzeros per pair row: one coefficient per tree level.
        let height = tree
            .leaves()
            .iter()
            .map(|&leaf| tree.vertex(leaf).header.ancestors.len())
            .max()
            .unwrap_or(0);

        // ── Fixed pairs ───────────────────────────────────────────────────────
        let n_fixed = classes.fixed.len();
        let mut fixed_vertices = TripletMatrix::with_capacity(n_fixed, num_vertices, n_fixed);
        let mut fixed_slacks = TripletMatrix::with_capacity(n_fixed, n_fixed, n_fixed);
        let mut fixed_rhs = Vec::with_capacity(n_fixed);

        for (row, pair) in classes.fixed.iter().enumerate() {
            let leaf1 = tree.leaf_of_site(pair.site1)?;
            let leaf2 = tree.leaf_of_site(pair.site2)?;
            let (lca, leaf1_left) = tree.lowest_common_ancestor(leaf1, leaf2)?;

            // A negative index means the crossing passed the top line on the
            // left; reversing the pair direction reverses both flags, so the
            // required order falls out of their agreement.
            let site1_left = (pair.intersect_index > 0.0) == pair.site1_lower;
            let column = tree.vertex(lca).header.total_index;
            if leaf1_left == site1_left {
                fixed_vertices.push(row, column, 1.0);
                fixed_rhs.push(0.0);
            } else {
                fixed_vertices.push(row, column, -1.0);
                fixed_rhs.push(-1.0);
            }
            fixed_slacks.push(row, row, -1.0);
        }

        // ── Intersecting pairs ────────────────────────────────────────────────
        let n_inter = classes.intersecting.len();
        let mut intersecting_vertices =
            TripletMatrix::with_capacity(4 * n_inter, num_vertices, n_inter * (2 * height + 2));
        let mut intersecting_cases = TripletMatrix::with_capacity(4 * n_inter, n_inter, 4 * n_inter);
        let mut intersecting_slacks = TripletMatrix::with_capacity(4 * n_inter, n_inter, 4 * n_inter);
        let mut intersecting_rhs = Vec::with_capacity(4 * n_inter);

        for (pair_index, pair) in classes.intersecting.iter().enumerate() {
            let (lower_site, upper_site) = if pair.site1_lower {
                (pair.site1, pair.site2)
            } else {
                (pair.site2, pair.site1)
            };
            let lower_leaf = tree.leaf_of_site(lower_site)?;
            let upper_leaf = tree.leaf_of_site(upper_site)?;
            let (lca, lower_left) = tree.lowest_common_ancestor(lower_leaf, upper_leaf)?;
            let lca_column = tree.vertex(lca).header.total_index;

            let coef = tree.parent_coef(lower_leaf);
            let offset = tree.initial_offset(lower_leaf) as f64;
            let intersect = pair.intersect_index;
            let base = 4 * pair_index;

            for row in [base, base + 1] {
                intersecting_cases.push(row, pair_index, -big_m);
            }
            for row in [base + 2, base + 3] {
                intersecting_cases.push(row, pair_index, big_m);
            }
            for row in base..base + 4 {
                intersecting_slacks.push(row, pair_index, -big_n);
            }

            // Case 0: the lower site passes the upper one on the left.
            // Its leaf must sit left of the crossing and left of the upper leaf.
            for &(column, value) in &coef {
                intersecting_vertices.push(base, column, value);
            }
            intersecting_rhs.push(intersect - offset);

            if lower_left {
                intersecting_vertices.push(base + 1, lca_column, 1.0);
                intersecting_rhs.push(0.0);
            } else {
                intersecting_vertices.push(base + 1, lca_column, -1.0);
                intersecting_rhs.push(-1.0);
            }

            // Case 1: mirrored, with the big-M shifted into the right-hand side.
            for &(column, value) in &coef {
                intersecting_vertices.push(base + 2, column, -value);
            }
            intersecting_rhs.push(-intersect + offset + big_m);

            if lower_left {
                intersecting_vertices.push(base + 3, lca_column, -1.0);
                intersecting_rhs.push(-1.0 + big_m);
            } else {
                intersecting_vertices.push(base + 3, lca_column, 1.0);
                intersecting_rhs.push(big_m);
            }
        }

        // ── Horizontal pairs ──────────────────────────────────────────────────
        let n_horizontal = classes.horizontal.len();
        let mut horizontal_vertices =
            TripletMatrix::with_capacity(3 * n_horizontal, num_vertices, n_horizontal * (2 * height + 1));
        let mut horizontal_slacks =
            TripletMatrix::with_capacity(3 * n_horizontal, n_horizontal, 3 * n_horizontal);
        let mut horizontal_rhs = Vec::with_capacity(3 * n_horizontal);

        for (pair_index, pair) in classes.horizontal.iter().enumerate() {
            let (left_site, right_site) = if pair.site1_left {
                (pair.site1, pair.site2)
            } else {
                (pair.site2, pair.site1)
            };
            let left_leaf = tree.leaf_of_site(left_site)?;
            let right_leaf = tree.leaf_of_site(right_site)?;
            let (lca, left_left) = tree.lowest_common_ancestor(left_leaf, right_leaf)?;
            let lca_column = tree.vertex(lca).header.total_index;
            let base = 3 * pair_index;

            for row in base..base + 3 {
                horizontal_slacks.push(row, pair_index, -big_n);
            }

            // Left leaf left of the right site's drop position.
            let right_index = tree.top_line_index_of_x(tree.sites()[right_site].pos.x);
            for &(column, value) in &tree.parent_coef(left_leaf) {
                horizontal_vertices.push(base, column, value);
            }
            horizontal_rhs.push(right_index - tree.initial_offset(left_leaf) as f64);

            // Right leaf right of the left site's drop position.
            let left_index = tree.top_line_index_of_x(tree.sites()[left_site].pos.x);
            for &(column, value) in &tree.parent_coef(right_leaf) {
                horizontal_vertices.push(base + 1, column, -value);
            }
            horizontal_rhs.push(-left_index + tree.initial_offset(right_leaf) as f64);

            // Left leaf left of the right leaf.
            if left_left {
                horizontal_vertices.push(base + 2, lca_column, 1.0);
                horizontal_rhs.push(0.0);
            } else {
                horizontal_vertices.push(base + 2, lca_column, -1.0);
                horizontal_rhs.push(-1.0);
            }
        }

        debug!(
            "assembled {} constraint rows over {} turn variables ({} nonzeros)",
            n_fixed + 4 * n_inter + 3 * n_horizontal,
            num_vertices,
            fixed_vertices.nnz() + intersecting_vertices.nnz() + horizontal_vertices.nnz()
        );

        Ok(IlpModel {
            classes,
            num_vertex_vars: num_vertices,
            fixed_vertices: fixed_vertices.to_csc(),
            fixed_slacks: fixed_slacks.to_csc(),
            fixed_rhs,
            intersecting_vertices: intersecting_vertices.to_csc(),
            intersecting_cases: intersecting_cases.to_csc(),
            intersecting_slacks: intersecting_slacks.to_csc(),
            intersecting_rhs,
            horizontal_vertices: horizontal_vertices.to_csc(),
            horizontal_slacks: horizontal_slacks.to_csc(),
            horizontal_rhs,
            big_m,
            big_n,
        })
    }

    /// Variable block layout for the oracle.
    pub fn var_layout(&self) -> VarLayout {
        let num_vertices = self.num_vertex_vars;
        let case_offset = num_vertices;
        let fixed_slack_offset = case_offset + self.classes.intersecting.len();
        let intersecting_slack_offset = fixed_slack_offset + self.classes.fixed.len();
        let horizontal_slack_offset = intersecting_slack_offset + self.classes.intersecting.len();
        let total = horizontal_slack_offset + self.classes.horizontal.len();
        VarLayout {
            num_vertices,
            case_offset,
            fixed_slack_offset,
            intersecting_slack_offset,
            horizontal_slack_offset,
            total,
        }
    }

    /// Objective vector: one per slack variable, zero elsewhere.
    pub fn objective(&self) -> Vec<f64> {
        let layout = self.var_layout();
        let mut objective = vec![0.0; layout.total];
        for value in &mut objective[layout.fixed_slack_offset..] {
            *value = 1.0;
        }
        objective
    }
}
