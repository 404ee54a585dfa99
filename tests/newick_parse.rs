use geophylo::error::Error;
use geophylo::input::newick::parse_newick;
use geophylo::model::instance::TreeNode;

/// Ids follow the post-order scheme: fresh id per leaf, right.id + 1 for an
/// internal vertex.
#[test]
fn test_id_scheme() {
    let parsed = parse_newick("((A:1,B:2):1,C:3);", "t").unwrap();
    assert_eq!(parsed.num_leaves, 3);
    assert_eq!(parsed.names_order, vec!["A", "B", "C"]);

    let root = &parsed.tree;
    assert!(!root.leaf);
    let left = root.left.as_deref().unwrap();
    let right = root.right.as_deref().unwrap();

    assert_eq!(left.left.as_deref().unwrap().id, 0, "first leaf takes id 0");
    assert_eq!(left.right.as_deref().unwrap().id, 1);
    assert_eq!(left.id, 2, "internal id = right child id + 1");
    assert_eq!(right.id, 3);
    assert_eq!(root.id, 4);

    assert_eq!(left.left.as_deref().unwrap().site_id, Some(0));
    assert_eq!(left.right.as_deref().unwrap().site_id, Some(1));
    assert_eq!(right.site_id, Some(2));
}

/// A missing branch length is +infinity; the root of a plain Newick string
/// has none, so every cumulative length is infinite.
#[test]
fn test_missing_branch_lengths_are_infinite() {
    let parsed = parse_newick("((A:1,B:2):1,C:3);", "t").unwrap();
    assert!(parsed.max_cum_branch_length.is_infinite());
    assert!(parsed.tree.cum_branch_length.is_infinite());
}

/// With a root length the cumulative lengths are finite sums from the root.
#[test]
fn test_cumulative_branch_lengths() {
    let parsed = parse_newick("((A:1,B:2):1,C:3):0;", "t").unwrap();
    let root = &parsed.tree;
    assert_eq!(root.cum_branch_length, 0.0);

    let left = root.left.as_deref().unwrap();
    assert_eq!(left.cum_branch_length, 1.0);
    assert_eq!(left.left.as_deref().unwrap().cum_branch_length, 2.0);
    assert_eq!(left.right.as_deref().unwrap().cum_branch_length, 3.0);
    assert_eq!(root.right.as_deref().unwrap().cum_branch_length, 3.0);
    assert_eq!(parsed.max_cum_branch_length, 3.0);
}

#[test]
fn test_non_binary_rejected() {
    let err = parse_newick("(A,B,C);", "t").unwrap_err();
    assert!(matches!(err, Error::InputParse { .. }), "got {err:?}");
    assert!(err.to_string().contains("3 children"), "got: {err}");

    let err = parse_newick("(A);", "t").unwrap_err();
    assert!(err.to_string().contains("1 children"), "got: {err}");
}

#[test]
fn test_malformed_input_rejected() {
    assert!(parse_newick("", "t").is_err());
    assert!(parse_newick("((A,B);", "t").is_err(), "unbalanced parenthesis");
    assert!(parse_newick("(A,B); trailing", "t").is_err());
    assert!(parse_newick("(A:x,B);", "t").is_err(), "bad branch length");
}

/// Internal labels and support values are tolerated and dropped.
#[test]
fn test_internal_labels_ignored() {
    let parsed = parse_newick("((A:1,B:2)95:1,C:3);", "t").unwrap();
    assert_eq!(parsed.num_leaves, 3);
    assert_eq!(parsed.names_order, vec!["A", "B", "C"]);
}

/// Topology survives a Newick -> tree -> Newick round trip.
#[test]
fn test_newick_round_trip() {
    let parsed = parse_newick("((A:1,B:2):1,C:3);", "t").unwrap();
    assert_eq!(parsed.tree.to_newick(), "((A,B),C);");

    let bigger = parse_newick("(((X,Y),(V,W)),(P,Q));", "t").unwrap();
    assert_eq!(bigger.tree.to_newick(), "(((X,Y),(V,W)),(P,Q));");
}

/// The instance tree serializes with infinite lengths as null and reads back.
#[test]
fn test_tree_json_round_trip() {
    let parsed = parse_newick("((A:1,B:2):1,C:3);", "t").unwrap();
    let json = serde_json::to_string(&parsed.tree).unwrap();
    assert!(json.contains("\"cum_branch_length\":null"), "infinite length must encode as null");

    let back: TreeNode = serde_json::from_str(&json).unwrap();
    assert!(back.cum_branch_length.is_infinite());
    assert_eq!(back.to_newick(), "((A,B),C);");
}
