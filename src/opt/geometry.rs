//! Geometric predicates behind pair classification and verification.
//!
//! Everything here is pure: given two site positions and the model's fixed
//! top line, compute where the line through the sites crosses the top line
//! and which site is the lower one. The crossing recount at the bottom is
//! the independent ground truth used to check a realized layout against the
//! solver's objective.

use crate::model::instance::LeaderType;
use crate::model::tree::{GeoTree, Point};

/// Where the line through `p1` and `p2` crosses the top line.
///
/// The returned index is scaled to `[0, |L|-1]` along the top line, and the
/// flag says whether `p1` is the lower of the two sites. A pair parallel to
/// the top line gets a sentinel index: `|L|+1` when `p1` is to the left,
/// `-1` when it is to the right, i.e. the crossing sits at infinity on that
/// side. Under `po` leaders the index is replaced by the top-line position
/// of the upper site's x, which preserves the left-right semantics for
/// orthogonal corridors.
pub fn top_line_intersect(tree: &GeoTree, p1: Point, p2: Point) -> (f64, bool) {
    let (start, end) = tree.top_line();
    let n = tree.num_leaves() as f64;

    let denom = (start.y - end.y) * (p1.x - p2.x) - (p1.y - p2.y) * (start.x - end.x);
    if denom == 0.0 {
        // Parallel to the top line; only the left-right order remains.
        return if (p2.x - p1.x) * (end.x - start.x) > 0.0 {
            (n + 1.0, true)
        } else {
            (-1.0, true)
        };
    }

    let t = ((p1.y - p2.y) * (p1.x - start.x) - (p1.y - start.y) * (p1.x - p2.x)) / denom;

    // Whether the direction vector from p1 to p2 is traversed positively
    // toward the intersection decides which site is lower.
    let site1_lower = if p2.x - p1.x == 0.0 {
        (start.y - p1.y + t * (end.y - start.y)) / (p2.y - p1.y) > 0.0
    } else {
        (start.x - p1.x + t * (end.x - start.x)) / (p2.x - p1.x) > 0.0
    };

    match tree.leader_type() {
        LeaderType::Straight => (t * (n - 1.0), site1_lower),
        LeaderType::Orthogonal => {
            let x = if site1_lower { p2.x } else { p1.x };
            (tree.top_line_index_of_x(x), site1_lower)
        }
    }
}

/// Count pairwise leader crossings of a realized layout.
///
/// `slots_by_site[i]` is the slot of the leaf bound to site `i`. This is an
/// independent O(n^2) geometric scan; the solver's objective must match it.
pub fn count_leader_crossings(tree: &GeoTree, slots_by_site: &[usize]) -> usize {
    let sites = tree.sites();
    let mut crossings = 0;
    for i in 0..sites.len() {
        for j in i + 1..sites.len() {
            let a = leader(tree, sites[i].pos, slots_by_site[i]);
            let b = leader(tree, sites[j].pos, slots_by_site[j]);
            if leaders_cross(&a, &b) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// The segments of one leader, site end first.
fn leader(tree: &GeoTree, site: Point, slot: usize) -> Vec<(Point, Point)> {
    let top = Point { x: tree.slot_x(slot), y: tree.top_line().0.y };
    match tree.leader_type() {
        LeaderType::Straight => vec![(site, top)],
        LeaderType::Orthogonal => {
            // Horizontal run from the site, then the vertical drop to the slot.
            let bend = Point { x: top.x, y: site.y };
            vec![(site, bend), (bend, top)]
        }
    }
}

fn leaders_cross(a: &[(Point, Point)], b: &[(Point, Point)]) -> bool {
    a.iter()
        .any(|sa| b.iter().any(|sb| segments_cross(sa.0, sa.1, sb.0, sb.1)))
}

/// Strict proper intersection; touching endpoints and collinear overlap do
/// not count as a crossing.
fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = orientation(a1, a2, b1);
    let d2 = orientation(a1, a2, b2);
    let d3 = orientation(b1, b2, a1);
    let d4 = orientation(b1, b2, a2);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
