//! Turn vector in, solution record out.

use std::collections::BTreeMap;

use crate::model::instance::Solution;
use crate::model::tree::GeoTree;

/// Realize the layout for a turn vector: final slot per leaf, turn flag per
/// internal vertex, and the crossing count reported by the solver.
///
/// For any turn vector the slots are a permutation of `0..|L|`; with no
/// turns they reproduce the input leaf order.
pub fn realize(tree: &GeoTree, turns: &[bool], objective: f64) -> Solution {
    let mut leaf_pos = BTreeMap::new();
    for &leaf in tree.leaves() {
        let id = tree.vertex(leaf).header.id.to_string();
        leaf_pos.insert(id, tree.order_index_after_turns(leaf, turns));
    }

    let mut should_rotate = BTreeMap::new();
    for (index, &internal) in tree.internals().iter().enumerate() {
        let id = tree.vertex(internal).header.id.to_string();
        should_rotate.insert(id, turns[index]);
    }

    Solution {
        num_intersections: objective.round() as i64,
        leaf_pos,
        should_rotate,
        l_type: tree.leader_type(),
    }
}

/// The all-zero turn vector for preview rendering, before any solve has
/// run. The crossing count is the `-1` sentinel.
pub fn null_solution(tree: &GeoTree) -> Solution {
    let turns = vec![false; tree.num_internals()];
    let mut solution = realize(tree, &turns, 0.0);
    solution.num_intersections = -1;
    solution
}
