use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use geophylo::input::newick::parse_newick;
use geophylo::model::instance::{Instance, SitePos, SolveOptions};
use geophylo::model::tree::GeoTree;

/// Build an instance record directly from drawing-box site coordinates.
fn instance(newick: &str, sites: &[(f64, f64)], map_width: f64, map_height: f64) -> Instance {
    let parsed = parse_newick(newick, "test").unwrap();
    Instance {
        title: "test".to_string(),
        tree: parsed.tree,
        sites: sites.iter().map(|&(x, y)| SitePos { x, y }).collect(),
        num_leaves: parsed.num_leaves,
        max_cum_branch_length: parsed.max_cum_branch_length,
        mercator_min_x: 0.0,
        mercator_min_y: 0.0,
        mercator_max_x: map_width,
        mercator_max_y: map_height,
        left_coord: 0.0,
        top_coord: 0.0,
        map_width,
        map_height,
    }
}

fn tree(newick: &str, sites: &[(f64, f64)]) -> GeoTree {
    GeoTree::from_instance(&instance(newick, sites, 100.0, 100.0), &SolveOptions::default()).unwrap()
}

fn spread_sites(n: usize) -> Vec<(f64, f64)> {
    (0..n).map(|i| (10.0 + 10.0 * i as f64, 20.0 + 7.0 * ((i * 13) % 5) as f64)).collect()
}

/// Every internal subtree width is the sum of its children's widths.
#[test]
fn test_subtree_widths() {
    let tree = tree("(((A,B),(C,D)),(E,F));", &spread_sites(6));
    assert_eq!(tree.subtree_width(tree.root()), 6);
    for &internal in tree.internals() {
        let (left, right) = tree.vertex(internal).children().unwrap();
        assert_eq!(
            tree.subtree_width(internal),
            tree.subtree_width(left) + tree.subtree_width(right)
        );
    }
    assert_eq!(tree.num_internals(), 5);
    assert_eq!(tree.num_leaves(), 6);
}

/// Ancestor lists run from the immediate parent up to the root, with the
/// left-subtree flag per entry.
#[test]
fn test_ancestor_lists() {
    let tree = tree("((A,B),C);", &spread_sites(3));
    let leaves = tree.leaves();

    let a = &tree.vertex(leaves[0]).header.ancestors;
    assert_eq!(a.len(), 2);
    assert_eq!(tree.vertex(a[0].0).header.total_index, 1, "immediate parent first");
    assert!(a[0].1, "A is the left child");
    assert_eq!(tree.vertex(a[1].0).header.total_index, 0, "root last");
    assert!(a[1].1, "A sits in the root's left subtree");

    let b = &tree.vertex(leaves[1]).header.ancestors;
    assert!(!b[0].1);
    assert!(b[1].1);

    let c = &tree.vertex(leaves[2]).header.ancestors;
    assert_eq!(c.len(), 1);
    assert!(!c[0].1);
}

/// Hand-checked parent coefficients and initial offsets for ((A,B),C).
#[test]
fn test_leaf_order_coordinates() {
    let tree = tree("((A,B),C);", &spread_sites(3));
    let leaves = tree.leaves();

    assert_eq!(tree.parent_coef(leaves[0]), vec![(1, 1.0), (0, 1.0)]);
    assert_eq!(tree.parent_coef(leaves[1]), vec![(1, -1.0), (0, 1.0)]);
    assert_eq!(tree.parent_coef(leaves[2]), vec![(0, -2.0)]);

    assert_eq!(tree.initial_offset(leaves[0]), 0);
    assert_eq!(tree.initial_offset(leaves[1]), 1);
    assert_eq!(tree.initial_offset(leaves[2]), 2);
}

/// With no turns, every leaf keeps its input order.
#[test]
fn test_zero_turns_is_identity() {
    let tree = tree("(((A,B),C),(D,(E,F)));", &spread_sites(6));
    let turns = vec![false; tree.num_internals()];
    for (index, &leaf) in tree.leaves().iter().enumerate() {
        assert_eq!(tree.order_index_after_turns(leaf, &turns), index);
    }
}

/// Any turn vector permutes the leaves onto 0..n without collisions.
#[test]
fn test_order_is_a_bijection() {
    let tree = tree("(((A,B),C),((D,E),(F,(G,H))));", &spread_sites(8));
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let turns: Vec<bool> = (0..tree.num_internals()).map(|_| rng.random_bool(0.5)).collect();
        let mut seen = vec![false; tree.num_leaves()];
        for &leaf in tree.leaves() {
            let slot = tree.order_index_after_turns(leaf, &turns);
            assert!(!seen[slot], "slot {slot} assigned twice under {turns:?}");
            seen[slot] = true;
        }
    }
}

/// Turning a single vertex flips exactly the leaf pairs whose LCA it is.
#[test]
fn test_single_turn_flips_only_its_pairs() {
    let tree = tree("(((A,B),C),(D,E));", &spread_sites(5));
    let none = vec![false; tree.num_internals()];

    for flipped in 0..tree.num_internals() {
        let mut turns = none.clone();
        turns[flipped] = true;

        for (i, &a) in tree.leaves().iter().enumerate() {
            for &b in &tree.leaves()[i + 1..] {
                let before = tree.order_index_after_turns(a, &none) < tree.order_index_after_turns(b, &none);
                let after = tree.order_index_after_turns(a, &turns) < tree.order_index_after_turns(b, &turns);
                let (lca, _) = tree.lowest_common_ancestor(a, b).unwrap();
                let lca_flipped = tree.vertex(lca).header.total_index == flipped;
                assert_eq!(before != after, lca_flipped, "pair flip must match LCA turn");
            }
        }
    }
}

/// Leaf/site count mismatches in the instance record are rejected.
#[test]
fn test_leaf_site_mismatch_rejected() {
    let result = GeoTree::from_instance(
        &instance("((A,B),C);", &spread_sites(2), 100.0, 100.0),
        &SolveOptions::default(),
    );
    assert!(result.is_err());
}

/// No site may be bound by two leaves, even if the instance JSON claims so.
#[test]
fn test_duplicate_site_binding_rejected() {
    let raw = serde_json::json!({
        "title": "dup",
        "tree": {
            "leaf": false, "id": 2, "cum_branch_length": null,
            "left": { "leaf": true, "id": 0, "cum_branch_length": null, "label": "A", "site_id": 0 },
            "right": { "leaf": true, "id": 1, "cum_branch_length": null, "label": "B", "site_id": 0 },
        },
        "sites": [ { "x": 1.0, "y": 2.0 }, { "x": 3.0, "y": 4.0 } ],
        "num_leaves": 2,
        "maxCumBranchLength": null,
        "mercator_min_x": 0.0, "mercator_min_y": 0.0,
        "mercator_max_x": 10.0, "mercator_max_y": 10.0,
        "left_coord": 0.0, "top_coord": 0.0,
        "map_width": 10.0, "map_height": 10.0,
    });
    let parsed: Instance = serde_json::from_value(raw).unwrap();
    let err = GeoTree::from_instance(&parsed, &SolveOptions::default()).unwrap_err();
    assert!(err.to_string().contains("two leaves"), "got: {err}");
}
