use geophylo::error::Error;
use geophylo::input::geo::instance_from_features;
use geophylo::input::newick::parse_newick;

fn named_feature(name: &str, lon: f64, lat: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [lon, lat] },
        "properties": { "name": name },
    })
}

fn collection(features: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({ "type": "FeatureCollection", "features": features })
}

/// Keyed binding: features listed in a different order than the leaves are
/// matched by the `name` property, and sites come out in leaf order.
#[test]
fn test_keyed_binding() {
    let parsed = parse_newick("((alpha,beta),gamma);", "t").unwrap();
    let geo = collection(vec![
        named_feature("gamma", 0.0, 0.0),
        named_feature("alpha", 1.0, 0.0),
        named_feature("beta", 2.0, 0.0),
    ]);
    let instance = instance_from_features(&parsed, &geo, 0.1, "name").unwrap();

    // sites[i] belongs to the i-th leaf; the draw transform preserves x order.
    assert_eq!(instance.sites.len(), 3);
    assert!(instance.sites[0].x < instance.sites[1].x, "alpha west of beta");
    assert!(instance.sites[2].x < instance.sites[0].x, "gamma west of alpha");
}

/// A leaf with no matching feature fails, naming the leaf.
#[test]
fn test_keyed_binding_missing_leaf() {
    let parsed = parse_newick("((alpha,beta),gamma);", "t").unwrap();
    let geo = collection(vec![
        named_feature("gamma", 0.0, 0.0),
        named_feature("alpha", 1.0, 0.0),
    ]);
    let err = instance_from_features(&parsed, &geo, 0.1, "name").unwrap_err();
    assert!(matches!(err, Error::BindingMismatch(_)), "got {err:?}");
    assert!(err.to_string().contains("beta"), "the message must name the leaf: {err}");
}

/// Matching is on string properties only; a leaf whose property exists under
/// a different key still fails.
#[test]
fn test_keyed_binding_wrong_key() {
    let parsed = parse_newick("(alpha,beta);", "t").unwrap();
    let geo = collection(vec![
        named_feature("alpha", 0.0, 0.0),
        named_feature("beta", 1.0, 0.0),
    ]);
    let err = instance_from_features(&parsed, &geo, 0.1, "label").unwrap_err();
    assert!(matches!(err, Error::BindingMismatch(_)), "got {err:?}");
}

/// Ordered binding uses exactly the first |leaves| features.
#[test]
fn test_ordered_binding_ignores_extras() {
    let parsed = parse_newick("(A,B);", "t").unwrap();
    let geo = collection(vec![
        named_feature("first", 0.0, 0.0),
        named_feature("second", 1.0, 0.0),
        named_feature("extra", 50.0, 50.0),
    ]);
    let instance = instance_from_features(&parsed, &geo, 0.1, "").unwrap();
    assert_eq!(instance.sites.len(), 2, "the extra feature must not become a site");
}
