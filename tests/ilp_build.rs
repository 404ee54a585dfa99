use geophylo::input::newick::parse_newick;
use geophylo::model::instance::{Instance, LeaderType, SitePos, SolveOptions};
use geophylo::model::tree::GeoTree;
use geophylo::opt::ilp::{classify_pairs, IlpModel};

fn instance(newick: &str, sites: &[(f64, f64)], map_width: f64) -> Instance {
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
        mercator_max_y: map_width,
        left_coord: 0.0,
        top_coord: 0.0,
        map_width,
        map_height: map_width,
    }
}

fn tree_with(newick: &str, sites: &[(f64, f64)], map_width: f64, options: SolveOptions) -> GeoTree {
    GeoTree::from_instance(&instance(newick, sites, map_width), &options).unwrap()
}

/// ((A,B),C) with A and B level and C near the line: (A,B) is fixed, the
/// pairs through C cross the top line strictly inside and are intersecting.
#[test]
fn test_classification() {
    let tree = tree_with(
        "((A,B),C);",
        &[(20.0, 5.0), (0.0, 5.0), (10.0, 0.0)],
        30.0,
        SolveOptions::default(),
    );
    let classes = classify_pairs(&tree);
    assert_eq!(classes.fixed.len(), 1);
    assert_eq!(classes.intersecting.len(), 2);
    assert_eq!(classes.horizontal.len(), 0);
    assert_eq!(classes.dropped, 0);

    // A is right of B and parallel to the top line: the at-infinity sentinel.
    let fixed = &classes.fixed[0];
    assert_eq!((fixed.site1, fixed.site2), (0, 1));
    assert_eq!(fixed.intersect_index, -1.0);
    assert!(fixed.site1_lower);

    // Both pairs through C cross at top-line index 1/3.
    for pair in &classes.intersecting {
        assert_eq!(pair.site2, 2);
        assert!((pair.intersect_index - 1.0 / 3.0).abs() < 1e-9, "got {}", pair.intersect_index);
        assert!(pair.site1_lower);
    }
}

#[test]
fn test_coincident_pairs_dropped() {
    let tree = tree_with(
        "(A,B);",
        &[(5.0, 5.0), (5.0, 5.0)],
        10.0,
        SolveOptions::default(),
    );
    let classes = classify_pairs(&tree);
    assert_eq!(classes.dropped, 1);
    assert_eq!(classes.fixed.len() + classes.intersecting.len() + classes.horizontal.len(), 0);

    let model = IlpModel::build(&tree).unwrap();
    assert_eq!(model.fixed_rhs.len(), 0);
    assert_eq!(model.var_layout().total, model.num_vertex_vars);
}

/// Under po, pairs closer in y than the gap go to the horizontal class.
#[test]
fn test_horizontal_classification() {
    let tree = tree_with(
        "((A,B),(C,D));",
        &[(10.0, 0.0), (0.0, 0.01), (5.0, 5.0), (15.0, 5.0)],
        20.0,
        SolveOptions { leader_type: LeaderType::Orthogonal, po_gap: 0.5 },
    );
    let classes = classify_pairs(&tree);
    assert_eq!(classes.horizontal.len(), 2, "(A,B) and (C,D) share corridors");
    assert_eq!(classes.fixed.len() + classes.intersecting.len(), 4);

    let ab = &classes.horizontal[0];
    assert_eq!((ab.site1, ab.site2), (0, 1));
    assert!(!ab.site1_left, "B at x=0 is left of A at x=10");

    let cd = &classes.horizontal[1];
    assert_eq!((cd.site1, cd.site2), (2, 3));
    assert!(cd.site1_left);
}

/// Hand-checked matrix content for the S2-style instance.
#[test]
fn test_fixed_constraint_rows() {
    let tree = tree_with(
        "((A,B),C);",
        &[(20.0, 5.0), (0.0, 5.0), (10.0, 0.0)],
        30.0,
        SolveOptions::default(),
    );
    let model = IlpModel::build(&tree).unwrap();

    assert_eq!(model.num_vertex_vars, 2);
    assert_eq!(model.big_m, 3.0);
    assert_eq!(model.big_n, 6.0);

    // One fixed pair, out of order: -v[(A,B)] - x_f <= -1.
    assert_eq!(model.fixed_rhs, vec![-1.0]);
    let column: Vec<(usize, f64)> = model.fixed_vertices.column(1).collect();
    assert_eq!(column, vec![(0, -1.0)], "the (A,B) vertex has internal index 1");
    assert_eq!(model.fixed_vertices.column(0).count(), 0, "the root is not involved");
    let slack: Vec<(usize, f64)> = model.fixed_slacks.column(0).collect();
    assert_eq!(slack, vec![(0, -1.0)]);

    // Two intersecting pairs: four rows each, big-M on the case variable
    // (negative for the left case rows, positive for the right case rows)
    // and -big-N on every slack entry.
    assert_eq!(model.intersecting_rhs.len(), 8);
    for pair in 0..2 {
        let case_column: Vec<(usize, f64)> = model.intersecting_cases.column(pair).collect();
        assert_eq!(
            case_column,
            vec![
                (4 * pair, -3.0),
                (4 * pair + 1, -3.0),
                (4 * pair + 2, 3.0),
                (4 * pair + 3, 3.0),
            ]
        );
        let slack_column: Vec<(usize, f64)> = model.intersecting_slacks.column(pair).collect();
        assert!(slack_column.iter().all(|&(_, v)| v == -6.0));
        assert_eq!(slack_column.len(), 4);
    }
}

/// The objective is exactly one per slack variable.
#[test]
fn test_objective_and_layout() {
    let tree = tree_with(
        "((A,B),C);",
        &[(20.0, 5.0), (0.0, 5.0), (10.0, 0.0)],
        30.0,
        SolveOptions::default(),
    );
    let model = IlpModel::build(&tree).unwrap();
    let layout = model.var_layout();

    // 2 turn vars, 2 case vars, 1 + 2 + 0 slacks.
    assert_eq!(layout.num_vertices, 2);
    assert_eq!(layout.case_offset, 2);
    assert_eq!(layout.fixed_slack_offset, 4);
    assert_eq!(layout.intersecting_slack_offset, 5);
    assert_eq!(layout.horizontal_slack_offset, 7);
    assert_eq!(layout.total, 7);

    let objective = model.objective();
    assert_eq!(objective, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
}

/// The intersecting rows encode "lower leaf left of the crossing" with the
/// lower leaf's parent coefficients.
#[test]
fn test_intersecting_rows_use_lower_leaf() {
    let tree = tree_with(
        "((A,B),C);",
        &[(20.0, 5.0), (0.0, 5.0), (10.0, 0.0)],
        30.0,
        SolveOptions::default(),
    );
    let model = IlpModel::build(&tree).unwrap();

    // Pair 0 is (A, C) with A lower: coef(A) = [+1 on (A,B), +1 on root],
    // offset 0, so row 0 reads v0 + v1 - 3 case - 6 slack <= 1/3.
    assert!((model.intersecting_rhs[0] - 1.0 / 3.0).abs() < 1e-9);
    let root_column: Vec<(usize, f64)> = model.intersecting_vertices.column(0).collect();
    assert!(root_column.contains(&(0, 1.0)), "row 0 has +1 on the root: {root_column:?}");

    // Pair 1 is (B, C) with B lower: offset 1, so row 4 reads
    // -v1 + v0 - 3 case - 6 slack <= 1/3 - 1.
    assert!((model.intersecting_rhs[4] - (1.0 / 3.0 - 1.0)).abs() < 1e-9);
    let ab_column: Vec<(usize, f64)> = model.intersecting_vertices.column(1).collect();
    assert!(ab_column.contains(&(4, -1.0)), "row 4 has -1 on the (A,B) vertex: {ab_column:?}");
}
